//! Product model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use kiosk_core::{Price, ProductId, UserId};

/// A shop product.
///
/// Products are never hard-deleted: the `archived` flag hides a product from
/// default listings while keeping it addressable by id, so existing orders
/// keep valid references.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Price,
    pub quantity: i32,
    pub has_extended_warranty: bool,
    pub archived: bool,
    /// Stored path of the preview image, if one was uploaded.
    pub preview_path: Option<String>,
    pub created_by: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

/// Validated input for creating or updating a product.
///
/// Produced by `forms::ProductForm::validate` (web) and the CSV bulk loader;
/// constraints (non-negative price and quantity, name length) have already
/// been enforced by the time a value of this type exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Price,
    pub quantity: i32,
    pub has_extended_warranty: bool,
    pub archived: bool,
    pub preview_path: Option<String>,
    pub created_by: Option<UserId>,
}

impl Product {
    /// Short description for list views (first 50 characters).
    #[must_use]
    pub fn description_short(&self) -> String {
        if self.description.chars().count() <= 50 {
            return self.description.clone();
        }
        let prefix: String = self.description.chars().take(50).collect();
        format!("{prefix}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(description: &str) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Widget".to_string(),
            description: description.to_string(),
            price: Price::ZERO,
            quantity: 0,
            has_extended_warranty: false,
            archived: false,
            preview_path: None,
            created_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_description_short_passthrough() {
        assert_eq!(product("tiny").description_short(), "tiny");
    }

    #[test]
    fn test_description_short_truncates() {
        let long = "x".repeat(80);
        let short = product(&long).description_short();
        assert_eq!(short.len(), 53);
        assert!(short.ends_with("..."));
    }
}
