//! CSV bulk import pipeline.
//!
//! An upload travels through four stages: decode the byte stream under the
//! declared charset, parse it as CSV with a header row, validate each data
//! row into repository input, and persist the whole batch inside one
//! transaction. The import is all-or-nothing: a failure at any stage leaves
//! the database untouched, so a partial import can never be mistaken for a
//! complete one.

use sqlx::PgPool;
use thiserror::Error;

use kiosk_core::UserId;

use crate::db::{OrderRepository, ProductRepository, RepositoryError};
use crate::forms::{
    PRODUCT_NAME_MAX, ValidationErrors, check_flag, check_name, check_price, check_quantity,
};
use crate::models::{NewOrder, NewProduct, Order, Product};

/// Error decoding the uploaded byte stream.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// The declared charset is not one this loader can decode.
    #[error("unsupported charset: {0}")]
    UnsupportedCharset(String),

    /// The stream did not decode as valid UTF-8.
    #[error("upload is not valid UTF-8")]
    InvalidUtf8,
}

/// Error importing a CSV upload. Nothing was persisted when any of these is
/// returned.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    /// Structurally malformed CSV (unbalanced quotes, ragged rows).
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),

    /// The header is missing a required column.
    #[error("missing required column: {0}")]
    MissingColumn(&'static str),

    /// The header names a column this entity does not have.
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// A data row failed field validation.
    #[error("row {row}: {errors}")]
    Row { row: usize, errors: ValidationErrors },

    /// The batch insert failed; the transaction was rolled back.
    #[error(transparent)]
    Persistence(#[from] RepositoryError),
}

/// Decode an uploaded byte stream under the declared charset.
///
/// `utf-8` and `us-ascii` labels are accepted (case-insensitive); a missing
/// charset defaults to UTF-8. A leading UTF-8 BOM is stripped.
///
/// # Errors
///
/// Returns `DecodeError::UnsupportedCharset` for any other label and
/// `DecodeError::InvalidUtf8` if the bytes do not decode.
pub fn decode(bytes: &[u8], charset: Option<&str>) -> Result<String, DecodeError> {
    if let Some(label) = charset {
        let normalized = label.trim().to_ascii_lowercase();
        if !matches!(normalized.as_str(), "utf-8" | "utf8" | "us-ascii" | "ascii") {
            return Err(DecodeError::UnsupportedCharset(label.to_string()));
        }
    }

    let bytes = bytes.strip_prefix(b"\xef\xbb\xbf").unwrap_or(bytes);
    let text = std::str::from_utf8(bytes).map_err(|_| DecodeError::InvalidUtf8)?;
    Ok(text.to_string())
}

/// Column layout of one entity's CSV format.
struct Columns {
    required: &'static [&'static str],
    optional: &'static [&'static str],
}

impl Columns {
    /// Check the header: every required column present, nothing unknown.
    fn check_header(&self, header: &csv::StringRecord) -> Result<(), ImportError> {
        for column in header.iter() {
            let column = column.trim();
            if !self.required.contains(&column) && !self.optional.contains(&column) {
                return Err(ImportError::UnknownColumn(column.to_string()));
            }
        }
        for &required in self.required {
            if !header.iter().any(|c| c.trim() == required) {
                return Err(ImportError::MissingColumn(required));
            }
        }
        Ok(())
    }
}

/// A parsed data row as a field-name lookup.
struct Row<'a> {
    header: &'a csv::StringRecord,
    record: &'a csv::StringRecord,
    /// 1-based line number in the file (the header is line 1).
    number: usize,
}

impl Row<'_> {
    fn get(&self, field: &str) -> Option<&str> {
        self.header
            .iter()
            .position(|c| c.trim() == field)
            .and_then(|i| self.record.get(i))
            .map(str::trim)
    }

    /// A required field, or `None` (with an error recorded) when absent or
    /// empty.
    fn required<'f>(&'f self, errors: &mut ValidationErrors, field: &str) -> Option<&'f str> {
        match self.get(field) {
            Some(value) if !value.is_empty() => Some(value),
            _ => {
                errors.add(field, "this field is required");
                None
            }
        }
    }
}

const PRODUCT_COLUMNS: Columns = Columns {
    required: &["name", "price", "quantity"],
    optional: &["description", "has_extended_warranty", "archived"],
};

const ORDER_COLUMNS: Columns = Columns {
    required: &["delivery_address", "promo_code"],
    optional: &["user_id"],
};

/// Parse decoded CSV text into validated product inputs.
///
/// # Errors
///
/// Returns the first structural or row-level error; see [`ImportError`].
pub fn parse_products(text: &str) -> Result<Vec<NewProduct>, ImportError> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let header = reader.headers()?.clone();
    PRODUCT_COLUMNS.check_header(&header)?;

    let mut inputs = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let row = Row {
            header: &header,
            record: &record,
            number: index + 2,
        };

        let mut errors = ValidationErrors::default();
        let name = row
            .required(&mut errors, "name")
            .map(|v| check_name(&mut errors, "name", v, PRODUCT_NAME_MAX))
            .unwrap_or_default();
        let price = row
            .required(&mut errors, "price")
            .map(|v| check_price(&mut errors, "price", v))
            .unwrap_or_default();
        let quantity = row
            .required(&mut errors, "quantity")
            .map(|v| check_quantity(&mut errors, "quantity", v))
            .unwrap_or_default();
        let has_extended_warranty = row
            .get("has_extended_warranty")
            .is_some_and(|v| check_flag(&mut errors, "has_extended_warranty", v));
        let archived = row
            .get("archived")
            .is_some_and(|v| check_flag(&mut errors, "archived", v));

        if !errors.is_empty() {
            return Err(ImportError::Row {
                row: row.number,
                errors,
            });
        }

        inputs.push(NewProduct {
            name,
            description: row.get("description").unwrap_or_default().to_string(),
            price,
            quantity,
            has_extended_warranty,
            archived,
            preview_path: None,
            created_by: None,
        });
    }

    Ok(inputs)
}

/// Parse decoded CSV text into validated order inputs.
///
/// # Errors
///
/// Returns the first structural or row-level error; see [`ImportError`].
pub fn parse_orders(text: &str) -> Result<Vec<NewOrder>, ImportError> {
    let mut reader = csv::Reader::from_reader(text.as_bytes());
    let header = reader.headers()?.clone();
    ORDER_COLUMNS.check_header(&header)?;

    let mut inputs = Vec::new();
    for (index, record) in reader.records().enumerate() {
        let record = record?;
        let row = Row {
            header: &header,
            record: &record,
            number: index + 2,
        };

        let mut errors = ValidationErrors::default();
        // Both columns must be present in the row, but either may be blank:
        // an order with no address or promo code is still an order.
        let delivery_address = row.get("delivery_address").unwrap_or_default().to_string();
        let promo_code = row.get("promo_code").unwrap_or_default().to_string();
        if promo_code.chars().count() > crate::forms::PROMO_CODE_MAX {
            errors.add("promo_code", "promo code too long");
        }
        let user_id = match row.get("user_id").filter(|v| !v.is_empty()) {
            Some(value) => match value.parse::<i32>() {
                Ok(id) => Some(UserId::new(id)),
                Err(_) => {
                    errors.add("user_id", format!("invalid user id: {value}"));
                    None
                }
            },
            None => None,
        };

        if !errors.is_empty() {
            return Err(ImportError::Row {
                row: row.number,
                errors,
            });
        }

        inputs.push(NewOrder {
            delivery_address,
            promo_code,
            user_id,
            product_ids: Vec::new(),
        });
    }

    Ok(inputs)
}

/// Import a product CSV upload: decode, parse, validate, and persist
/// atomically.
///
/// # Errors
///
/// See [`ImportError`]; on any error zero rows were persisted.
pub async fn load_products(
    pool: &PgPool,
    bytes: &[u8],
    charset: Option<&str>,
) -> Result<Vec<Product>, ImportError> {
    let text = decode(bytes, charset)?;
    let inputs = parse_products(&text)?;
    let created = ProductRepository::new(pool).bulk_insert(&inputs).await?;
    tracing::info!(count = created.len(), "imported products from CSV");
    Ok(created)
}

/// Import an order CSV upload: decode, parse, validate, and persist
/// atomically.
///
/// # Errors
///
/// See [`ImportError`]; on any error zero rows were persisted.
pub async fn load_orders(
    pool: &PgPool,
    bytes: &[u8],
    charset: Option<&str>,
) -> Result<Vec<Order>, ImportError> {
    let text = decode(bytes, charset)?;
    let inputs = parse_orders(&text)?;
    let created = OrderRepository::new(pool).bulk_insert(&inputs).await?;
    tracing::info!(count = created.len(), "imported orders from CSV");
    Ok(created)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_decode_default_utf8() {
        assert_eq!(decode(b"name\n", None).unwrap(), "name\n");
    }

    #[test]
    fn test_decode_strips_bom() {
        assert_eq!(decode(b"\xef\xbb\xbfname\n", None).unwrap(), "name\n");
    }

    #[test]
    fn test_decode_accepts_ascii_label() {
        assert!(decode(b"abc", Some("US-ASCII")).is_ok());
        assert!(decode(b"abc", Some("utf-8")).is_ok());
    }

    #[test]
    fn test_decode_rejects_unknown_charset() {
        assert_eq!(
            decode(b"abc", Some("koi8-r")),
            Err(DecodeError::UnsupportedCharset("koi8-r".to_string()))
        );
    }

    #[test]
    fn test_decode_rejects_invalid_utf8() {
        assert_eq!(decode(b"\xff\xfe", None), Err(DecodeError::InvalidUtf8));
    }

    #[test]
    fn test_parse_products_happy_path() {
        let text = "name,price,quantity\nWidget,9.99,5\nGadget,19.99,2\n";
        let inputs = parse_products(text).unwrap();
        assert_eq!(inputs.len(), 2);
        let widget = inputs.first().unwrap();
        assert_eq!(widget.name, "Widget");
        assert_eq!(widget.price.amount(), Decimal::new(999, 2));
        assert_eq!(widget.quantity, 5);
        assert!(!widget.archived);
        let gadget = inputs.get(1).unwrap();
        assert_eq!(gadget.name, "Gadget");
        assert_eq!(gadget.price.amount(), Decimal::new(1999, 2));
        assert_eq!(gadget.quantity, 2);
    }

    #[test]
    fn test_parse_products_optional_columns() {
        let text = "name,price,quantity,description,archived\nWidget,1.00,1,A widget,true\n";
        let inputs = parse_products(text).unwrap();
        let widget = inputs.first().unwrap();
        assert_eq!(widget.description, "A widget");
        assert!(widget.archived);
    }

    #[test]
    fn test_parse_products_header_only() {
        let inputs = parse_products("name,price,quantity\n").unwrap();
        assert!(inputs.is_empty());
    }

    #[test]
    fn test_parse_products_missing_column() {
        let err = parse_products("name,price\nWidget,9.99\n").unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn("quantity")));
    }

    #[test]
    fn test_parse_products_unknown_column() {
        let err = parse_products("name,price,quantity,color\nWidget,9.99,5,red\n").unwrap_err();
        match err {
            ImportError::UnknownColumn(column) => assert_eq!(column, "color"),
            other => panic!("expected UnknownColumn, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_products_row_error_names_row_and_field() {
        let text = "name,price,quantity\nWidget,9.99,5\n,free,2\n";
        let err = parse_products(text).unwrap_err();
        match err {
            ImportError::Row { row, errors } => {
                assert_eq!(row, 3);
                assert!(errors.message_for("name").is_some());
                assert!(errors.message_for("price").is_some());
            }
            other => panic!("expected Row, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_products_negative_quantity_rejected() {
        let err = parse_products("name,price,quantity\nWidget,9.99,-1\n").unwrap_err();
        assert!(matches!(err, ImportError::Row { row: 2, .. }));
    }

    #[test]
    fn test_parse_orders_happy_path() {
        let text = "delivery_address,promo_code,user_id\n1 Main St,SAVE10,3\nNowhere,,\n";
        let inputs = parse_orders(text).unwrap();
        assert_eq!(inputs.len(), 2);
        assert_eq!(inputs.first().unwrap().user_id, Some(UserId::new(3)));
        assert_eq!(inputs.get(1).unwrap().user_id, None);
    }

    #[test]
    fn test_parse_orders_bad_user_id() {
        let text = "delivery_address,promo_code,user_id\n1 Main St,SAVE10,three\n";
        let err = parse_orders(text).unwrap_err();
        assert!(matches!(err, ImportError::Row { row: 2, .. }));
    }

    #[test]
    fn test_parse_malformed_csv() {
        // Ragged row: three columns declared, one supplied.
        let err = parse_products("name,price,quantity\n\"Widget\n").unwrap_err();
        assert!(matches!(err, ImportError::Csv(_)));
    }
}
