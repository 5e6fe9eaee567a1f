use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::Book;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub book_id: i64,
    pub quantity: u32,
}

/// Customer identity fields of an order. Split from the payload so the view
/// can collect them independently of the selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDetails {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    #[serde(flatten)]
    pub customer: CustomerDetails,
    pub items: Vec<OrderLine>,
}

impl OrderRequest {
    /// Builds the submission payload from the selected books, one line item
    /// per selected identifier.
    pub fn from_selection(customer: CustomerDetails, books: &[Book]) -> Self {
        let items = books
            .iter()
            .filter_map(|book| book.id)
            .map(|book_id| OrderLine {
                book_id,
                quantity: 1,
            })
            .collect();
        Self { customer, items }
    }

    /// Checks the payload before it goes anywhere near the network. Failure
    /// mutates nothing and carries the translation key of the user-facing
    /// message.
    pub fn validate(&self) -> Result<(), OrderValidationError> {
        let customer = &self.customer;
        let required = [
            &customer.first_name,
            &customer.last_name,
            &customer.email,
            &customer.phone,
            &customer.address,
        ];
        if required.iter().any(|field| field.trim().is_empty()) {
            return Err(OrderValidationError::MissingRequiredFields);
        }
        if !is_valid_email(customer.email.trim()) {
            return Err(OrderValidationError::InvalidEmail);
        }
        if self.items.is_empty() {
            return Err(OrderValidationError::NoItems);
        }
        Ok(())
    }
}

/// Order record returned by the server after a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedOrder {
    pub id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderValidationError {
    MissingRequiredFields,
    InvalidEmail,
    NoItems,
    BelowMinimumSelection { required: usize, selected: usize },
}

impl OrderValidationError {
    /// Translation key of the user-facing message.
    pub fn message_key(&self) -> &'static str {
        match self {
            Self::MissingRequiredFields => "fillAllFields",
            Self::InvalidEmail => "validEmail",
            Self::NoItems => "selectAtLeastOneBook",
            Self::BelowMinimumSelection { .. } => "minimumSelection",
        }
    }

    /// Substitution parameters for the message, if any.
    pub fn message_params(&self) -> Vec<(&'static str, String)> {
        match self {
            Self::BelowMinimumSelection { required, .. } => {
                vec![("count", required.to_string())]
            }
            _ => Vec::new(),
        }
    }
}

impl std::fmt::Display for OrderValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequiredFields => write!(f, "missing required order fields"),
            Self::InvalidEmail => write!(f, "malformed email address"),
            Self::NoItems => write!(f, "order has no line items"),
            Self::BelowMinimumSelection { required, selected } => {
                write!(f, "selection below checkout minimum: {selected}/{required}")
            }
        }
    }
}

impl std::error::Error for OrderValidationError {}

/// Conventional `local@domain.tld` shape: a single `@`, a non-empty local
/// part, and a dotted domain with non-empty labels.
fn is_valid_email(email: &str) -> bool {
    if email.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let labels: Vec<&str> = domain.split('.').collect();
    labels.len() >= 2 && labels.iter().all(|label| !label.is_empty())
}

#[cfg(test)]
mod tests {
    use super::{is_valid_email, CustomerDetails, OrderLine, OrderRequest, OrderValidationError};

    fn customer() -> CustomerDetails {
        CustomerDetails {
            first_name: "Amina".to_owned(),
            last_name: "Belkadi".to_owned(),
            email: "amina@example.com".to_owned(),
            phone: "+212612345678".to_owned(),
            address: "12 Rue des Livres".to_owned(),
            city: Some("Casablanca".to_owned()),
            notes: None,
        }
    }

    fn request() -> OrderRequest {
        OrderRequest {
            customer: customer(),
            items: vec![OrderLine {
                book_id: 1,
                quantity: 1,
            }],
        }
    }

    #[test]
    fn complete_request_validates() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn blank_required_field_is_rejected() {
        let mut req = request();
        req.customer.address = "   ".to_owned();
        assert_eq!(
            req.validate(),
            Err(OrderValidationError::MissingRequiredFields)
        );
    }

    #[test]
    fn empty_email_is_rejected_as_missing_field() {
        let mut req = request();
        req.customer.email = String::new();
        assert_eq!(
            req.validate(),
            Err(OrderValidationError::MissingRequiredFields)
        );
    }

    #[test]
    fn malformed_email_is_rejected() {
        for email in ["amina", "amina@", "@example.com", "amina@example", "a b@example.com", "amina@ex..com", "amina@@example.com"] {
            let mut req = request();
            req.customer.email = email.to_owned();
            assert_eq!(req.validate(), Err(OrderValidationError::InvalidEmail), "{email}");
        }
    }

    #[test]
    fn order_without_items_is_rejected() {
        let mut req = request();
        req.items.clear();
        assert_eq!(req.validate(), Err(OrderValidationError::NoItems));
    }

    #[test]
    fn email_shapes() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last@mail.example.org"));
        assert!(!is_valid_email("no-at-sign.example.com"));
        assert!(!is_valid_email("trailing-dot@example.com."));
    }

    #[test]
    fn payload_serializes_flat_and_camel_case() {
        let json = serde_json::to_string(&request()).unwrap();
        assert!(json.contains("\"firstName\":\"Amina\""));
        assert!(json.contains("\"items\":[{\"bookId\":1,\"quantity\":1}]"));
        // Customer fields are flattened into the top-level payload object.
        assert!(!json.contains("\"customer\""));
    }

    #[test]
    fn validation_errors_map_to_translation_keys() {
        assert_eq!(
            OrderValidationError::InvalidEmail.message_key(),
            "validEmail"
        );
        let below = OrderValidationError::BelowMinimumSelection {
            required: 10,
            selected: 3,
        };
        assert_eq!(below.message_key(), "minimumSelection");
        assert_eq!(below.message_params(), vec![("count", "10".to_owned())]);
    }
}
