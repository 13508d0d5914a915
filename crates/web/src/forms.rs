//! Form and payload validation.
//!
//! Each entity has an explicit input type with a `validate` function that
//! checks every field constraint and returns either the validated input for
//! the repository layer or a list of field-level errors. HTML form handlers
//! re-render with the errors; API handlers serialize them as a 400 body. The
//! same field checks back the CSV bulk loader.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use kiosk_core::{Price, ProductId, UserId};

use crate::models::{NewOrder, NewProduct};

/// Field length limits, mirrored by the database schema.
pub const PRODUCT_NAME_MAX: usize = 100;
pub const PROMO_CODE_MAX: usize = 20;
pub const ARTICLE_TITLE_MAX: usize = 200;

/// A single field-level validation error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

/// Accumulated validation errors for one input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    /// Record an error against a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.push(FieldError {
            field: field.to_string(),
            message: message.into(),
        });
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The message recorded for `field`, if any (template helper).
    #[must_use]
    pub fn message_for(&self, field: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message.as_str())
    }

    /// Consume into `Ok(value)` when empty, `Err(self)` otherwise.
    ///
    /// # Errors
    ///
    /// Returns the accumulated errors when any were recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|e| format!("{}: {}", e.field, e.message))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

// =============================================================================
// Field checks (shared by forms, API payloads, and the CSV loader)
// =============================================================================

/// Check a required name-like field with a length cap.
pub(crate) fn check_name(
    errors: &mut ValidationErrors,
    field: &str,
    value: &str,
    max: usize,
) -> String {
    let value = value.trim();
    if value.is_empty() {
        errors.add(field, "this field is required");
    } else if value.chars().count() > max {
        errors.add(field, format!("must be at most {max} characters"));
    }
    value.to_string()
}

/// Parse and check a non-negative price.
pub(crate) fn check_price(errors: &mut ValidationErrors, field: &str, value: &str) -> Price {
    match Price::parse(value) {
        Ok(price) => price,
        Err(e) => {
            errors.add(field, e.to_string());
            Price::ZERO
        }
    }
}

/// Parse and check a non-negative integer quantity.
pub(crate) fn check_quantity(errors: &mut ValidationErrors, field: &str, value: &str) -> i32 {
    match value.trim().parse::<i32>() {
        Ok(n) if n >= 0 => n,
        Ok(n) => {
            errors.add(field, format!("must not be negative (got {n})"));
            0
        }
        Err(_) => {
            errors.add(field, format!("invalid number: {value}"));
            0
        }
    }
}

/// Parse a checkbox/flag value. Accepts the usual spellings.
pub(crate) fn check_flag(errors: &mut ValidationErrors, field: &str, value: &str) -> bool {
    match value.trim().to_ascii_lowercase().as_str() {
        "" | "false" | "0" | "no" | "off" => false,
        "true" | "1" | "yes" | "on" => true,
        other => {
            errors.add(field, format!("invalid flag value: {other}"));
            false
        }
    }
}

// =============================================================================
// Product
// =============================================================================

/// Raw product form data as submitted from HTML.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub price: String,
    #[serde(default)]
    pub quantity: String,
    /// Checkbox; present when checked.
    #[serde(default)]
    pub has_extended_warranty: Option<String>,
    #[serde(default)]
    pub archived: Option<String>,
    #[serde(default)]
    pub preview_path: Option<String>,
}

impl ProductForm {
    /// Validate the form into repository input.
    ///
    /// # Errors
    ///
    /// Returns every field error at once so the form can show them together.
    pub fn validate(&self, created_by: Option<UserId>) -> Result<NewProduct, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = check_name(&mut errors, "name", &self.name, PRODUCT_NAME_MAX);
        let price = check_price(&mut errors, "price", &self.price);
        let quantity = check_quantity(&mut errors, "quantity", &self.quantity);

        errors.into_result(NewProduct {
            name,
            description: self.description.trim().to_string(),
            price,
            quantity,
            has_extended_warranty: self.has_extended_warranty.is_some(),
            archived: self.archived.is_some(),
            preview_path: self
                .preview_path
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from),
            created_by,
        })
    }
}

/// Typed product payload for the JSON API.
#[derive(Debug, Clone, Deserialize)]
pub struct ProductPayload {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    pub quantity: i32,
    #[serde(default)]
    pub has_extended_warranty: bool,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub preview_path: Option<String>,
}

impl ProductPayload {
    /// Validate the payload into repository input.
    ///
    /// # Errors
    ///
    /// Returns field-level errors for the API error body.
    pub fn validate(&self, created_by: Option<UserId>) -> Result<NewProduct, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = check_name(&mut errors, "name", &self.name, PRODUCT_NAME_MAX);
        let price = match Price::new(self.price) {
            Ok(price) => price,
            Err(e) => {
                errors.add("price", e.to_string());
                Price::ZERO
            }
        };
        if self.quantity < 0 {
            errors.add("quantity", format!("must not be negative (got {})", self.quantity));
        }

        errors.into_result(NewProduct {
            name,
            description: self.description.trim().to_string(),
            price,
            quantity: self.quantity.max(0),
            has_extended_warranty: self.has_extended_warranty,
            archived: self.archived,
            preview_path: self.preview_path.clone(),
            created_by,
        })
    }
}

// =============================================================================
// Order
// =============================================================================

/// Raw order form data as submitted from HTML.
///
/// `product_ids` is a comma-separated list of product identifiers.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderForm {
    #[serde(default)]
    pub delivery_address: String,
    #[serde(default)]
    pub promo_code: String,
    #[serde(default)]
    pub product_ids: String,
}

impl OrderForm {
    /// Validate the form into repository input.
    ///
    /// # Errors
    ///
    /// Returns every field error at once.
    pub fn validate(&self, user_id: Option<UserId>) -> Result<NewOrder, ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let promo_code = self.promo_code.trim();
        if promo_code.chars().count() > PROMO_CODE_MAX {
            errors.add(
                "promo_code",
                format!("must be at most {PROMO_CODE_MAX} characters"),
            );
        }

        let mut product_ids = Vec::new();
        for part in self
            .product_ids
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
        {
            match part.parse::<i32>() {
                Ok(id) => product_ids.push(ProductId::new(id)),
                Err(_) => errors.add("product_ids", format!("invalid product id: {part}")),
            }
        }

        errors.into_result(NewOrder {
            delivery_address: self.delivery_address.trim().to_string(),
            promo_code: promo_code.to_string(),
            user_id,
            product_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_form_valid() {
        let form = ProductForm {
            name: "Widget".to_string(),
            description: " Good widget ".to_string(),
            price: "9.99".to_string(),
            quantity: "5".to_string(),
            ..ProductForm::default()
        };
        let input = form.validate(None).expect("valid form");
        assert_eq!(input.name, "Widget");
        assert_eq!(input.description, "Good widget");
        assert_eq!(input.price.to_string(), "9.99");
        assert_eq!(input.quantity, 5);
        assert!(!input.archived);
    }

    #[test]
    fn test_product_form_collects_all_errors() {
        let form = ProductForm {
            name: String::new(),
            price: "free".to_string(),
            quantity: "-2".to_string(),
            ..ProductForm::default()
        };
        let errors = form.validate(None).expect_err("invalid form");
        assert!(errors.message_for("name").is_some());
        assert!(errors.message_for("price").is_some());
        assert!(errors.message_for("quantity").is_some());
    }

    #[test]
    fn test_product_form_name_too_long() {
        let form = ProductForm {
            name: "n".repeat(PRODUCT_NAME_MAX + 1),
            price: "1".to_string(),
            quantity: "0".to_string(),
            ..ProductForm::default()
        };
        let errors = form.validate(None).expect_err("overlong name");
        assert_eq!(
            errors.message_for("name"),
            Some("must be at most 100 characters")
        );
    }

    #[test]
    fn test_product_payload_negative_price() {
        let payload = ProductPayload {
            name: "Widget".to_string(),
            description: String::new(),
            price: Decimal::new(-100, 2),
            quantity: 1,
            has_extended_warranty: false,
            archived: false,
            preview_path: None,
        };
        let errors = payload.validate(None).expect_err("negative price");
        assert!(errors.message_for("price").is_some());
    }

    #[test]
    fn test_order_form_parses_product_ids() {
        let form = OrderForm {
            delivery_address: "1 Main St".to_string(),
            promo_code: "SAVE10".to_string(),
            product_ids: "1, 2,3,".to_string(),
        };
        let input = form.validate(Some(UserId::new(7))).expect("valid form");
        assert_eq!(
            input.product_ids,
            vec![ProductId::new(1), ProductId::new(2), ProductId::new(3)]
        );
        assert_eq!(input.user_id, Some(UserId::new(7)));
    }

    #[test]
    fn test_order_form_empty_product_set_allowed() {
        let form = OrderForm::default();
        let input = form.validate(None).expect("empty order is valid");
        assert!(input.product_ids.is_empty());
    }

    #[test]
    fn test_order_form_rejects_bad_ids_and_long_promo() {
        let form = OrderForm {
            delivery_address: String::new(),
            promo_code: "p".repeat(PROMO_CODE_MAX + 1),
            product_ids: "1,two".to_string(),
        };
        let errors = form.validate(None).expect_err("invalid form");
        assert!(errors.message_for("promo_code").is_some());
        assert_eq!(
            errors.message_for("product_ids"),
            Some("invalid product id: two")
        );
    }

    #[test]
    fn test_check_flag_spellings() {
        let mut errors = ValidationErrors::default();
        assert!(check_flag(&mut errors, "f", "true"));
        assert!(check_flag(&mut errors, "f", "Yes"));
        assert!(!check_flag(&mut errors, "f", ""));
        assert!(!check_flag(&mut errors, "f", "0"));
        assert!(errors.is_empty());
        check_flag(&mut errors, "f", "maybe");
        assert!(!errors.is_empty());
    }
}
