use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use url::Url;

use crate::model::{Book, BookPage, Offer, Pack};
use crate::order::{CreatedOrder, OrderRequest};

/// The remote bookstore catalog. Transport and encoding live behind this
/// seam; the storefront only sees the logical operations.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn fetch_all_books(&self) -> anyhow::Result<Vec<Book>>;
    async fn fetch_books_paginated(&self, page: usize, size: usize) -> anyhow::Result<BookPage>;
    async fn fetch_books_by_category(&self, category: &str) -> anyhow::Result<Vec<Book>>;
    async fn search_books(&self, keyword: &str) -> anyhow::Result<Vec<Book>>;
    async fn fetch_active_packs(&self) -> anyhow::Result<Vec<Pack>>;
    async fn fetch_current_daily_offers(&self) -> anyhow::Result<Vec<Offer>>;
    async fn fetch_pack_by_id(&self, id: i64) -> anyhow::Result<Pack>;
    async fn submit_order(&self, order: &OrderRequest) -> anyhow::Result<CreatedOrder>;
}

#[derive(Debug, Clone)]
pub struct HttpCatalogApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCatalogApi {
    pub fn new(base_url: &str) -> anyhow::Result<Self> {
        let parsed = Url::parse(base_url).with_context(|| format!("parse api url: {base_url}"))?;
        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            anyhow::bail!("api url must be http/https: {base_url}");
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .context("build catalog http client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_owned(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> anyhow::Result<T> {
        let endpoint = self.endpoint(path);
        let response = self
            .client
            .get(&endpoint)
            .query(query)
            .send()
            .await
            .with_context(|| format!("GET {endpoint}"))?;
        read_json_response(response)
            .await
            .with_context(|| format!("GET {endpoint}"))
    }
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    async fn fetch_all_books(&self) -> anyhow::Result<Vec<Book>> {
        self.get_json("/books", &[]).await
    }

    async fn fetch_books_paginated(&self, page: usize, size: usize) -> anyhow::Result<BookPage> {
        self.get_json(
            "/books/paginated",
            &[("page", page.to_string()), ("size", size.to_string())],
        )
        .await
    }

    async fn fetch_books_by_category(&self, category: &str) -> anyhow::Result<Vec<Book>> {
        self.get_json("/books", &[("category", category.to_string())])
            .await
    }

    async fn search_books(&self, keyword: &str) -> anyhow::Result<Vec<Book>> {
        self.get_json("/books/search", &[("keyword", keyword.to_string())])
            .await
    }

    async fn fetch_active_packs(&self) -> anyhow::Result<Vec<Pack>> {
        self.get_json("/packs/active", &[]).await
    }

    async fn fetch_current_daily_offers(&self) -> anyhow::Result<Vec<Offer>> {
        self.get_json("/offers/daily", &[]).await
    }

    async fn fetch_pack_by_id(&self, id: i64) -> anyhow::Result<Pack> {
        self.get_json(&format!("/packs/{id}"), &[]).await
    }

    async fn submit_order(&self, order: &OrderRequest) -> anyhow::Result<CreatedOrder> {
        let endpoint = self.endpoint("/orders");
        let response = self
            .client
            .post(&endpoint)
            .json(order)
            .send()
            .await
            .with_context(|| format!("POST {endpoint}"))?;
        read_json_response(response)
            .await
            .with_context(|| format!("POST {endpoint}"))
    }
}

async fn read_json_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> anyhow::Result<T> {
    let status = response.status();
    let raw = response.text().await.context("read response body")?;
    if !status.is_success() {
        let message = parse_error_message(&raw).unwrap_or_else(|| raw.clone());
        anyhow::bail!("catalog API error ({status}): {message}");
    }
    serde_json::from_str(&raw).context("parse response json")
}

/// Pulls the server-provided `message` out of an error body when the body is
/// the conventional JSON error shape.
fn parse_error_message(raw: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw).ok()?;
    let message = value
        .get("message")
        .or_else(|| value.get("error"))?
        .as_str()?
        .to_owned();
    Some(message)
}
