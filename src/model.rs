use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalog record as served by the bookstore API. Read-only snapshot on the
/// client: replaced wholesale on the next fetch, never mutated locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Absent until the record is persisted server-side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub isbn: Option<String>,
    pub title: String,
    pub author: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(default = "default_available", rename = "isAvailable")]
    pub available: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover: Option<String>,
}

fn default_available() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pack {
    pub id: i64,
    pub name: String,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Decimal>,
    #[serde(default = "default_available")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub badge: Option<PackBadge>,
    #[serde(default, rename = "isHighlight")]
    pub highlight: bool,
    #[serde(default)]
    pub books: Vec<Book>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PackBadge {
    New,
    Hot,
    Sale,
    Popular,
}

impl PackBadge {
    /// Translation key for the badge label.
    pub fn message_key(self) -> &'static str {
        match self {
            Self::New => "badge.new",
            Self::Hot => "badge.hot",
            Self::Sale => "badge.sale",
            Self::Popular => "badge.popular",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Offer {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Decimal>,
    /// Discount percentage, 0-100.
    pub discount: u32,
    pub valid_until: DateTime<Utc>,
    #[serde(default = "default_available")]
    pub active: bool,
    #[serde(default)]
    pub books: Vec<Book>,
}

impl Offer {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.valid_until < now
    }

    pub fn remaining_days(&self, now: DateTime<Utc>) -> i64 {
        (self.valid_until - now).num_days().max(0)
    }
}

/// One page of a server-paginated book listing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookPage {
    pub items: Vec<Book>,
    pub total_pages: usize,
    pub total_elements: u64,
}
