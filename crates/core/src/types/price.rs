//! Non-negative decimal price type.
//!
//! Product prices are stored as `NUMERIC(9, 2)` in PostgreSQL; this wrapper
//! enforces the non-negativity constraint at construction time so a negative
//! price can never reach a repository.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error constructing a [`Price`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PriceError {
    /// The amount was negative.
    #[error("price must not be negative (got {0})")]
    Negative(Decimal),

    /// The amount could not be parsed as a decimal.
    #[error("invalid price: {0}")]
    Invalid(String),
}

/// A non-negative monetary amount in the shop's single currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Price(Decimal);

impl Price {
    /// The zero price, the default for new products.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// Create a price from a decimal amount.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Negative` if the amount is below zero.
    pub fn new(amount: Decimal) -> Result<Self, PriceError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(PriceError::Negative(amount));
        }
        Ok(Self(amount.round_dp(2)))
    }

    /// Parse a price from a string such as `"9.99"`.
    ///
    /// # Errors
    ///
    /// Returns `PriceError::Invalid` on unparseable input and
    /// `PriceError::Negative` on negative amounts.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let amount: Decimal = s
            .trim()
            .parse()
            .map_err(|_| PriceError::Invalid(s.to_string()))?;
        Self::new(amount)
    }

    /// Get the underlying decimal amount.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl Default for Price {
    fn default() -> Self {
        Self::ZERO
    }
}

impl TryFrom<Decimal> for Price {
    type Error = PriceError;

    fn try_from(amount: Decimal) -> Result<Self, Self::Error> {
        Self::new(amount)
    }
}

impl From<Price> for Decimal {
    fn from(price: Price) -> Self {
        price.0
    }
}

impl std::fmt::Display for Price {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Price {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <Decimal as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <Decimal as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Price {
    fn decode(
        value: sqlx::postgres::PgValueRef<'r>,
    ) -> Result<Self, sqlx::error::BoxDynError> {
        let amount = <Decimal as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self::new(amount)?)
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Price {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <Decimal as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_parse_valid() {
        let price = Price::parse("9.99").unwrap();
        assert_eq!(price.amount(), Decimal::new(999, 2));
        assert_eq!(price.to_string(), "9.99");
    }

    #[test]
    fn test_parse_rounds_to_cents() {
        let price = Price::parse("1.005").unwrap();
        assert_eq!(price.to_string(), "1.00");
    }

    #[test]
    fn test_zero_is_default() {
        assert_eq!(Price::default(), Price::ZERO);
        assert_eq!(Price::ZERO.to_string(), "0.00");
    }

    #[test]
    fn test_negative_rejected() {
        assert!(matches!(
            Price::parse("-1.50"),
            Err(PriceError::Negative(_))
        ));
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            Price::parse("nine dollars"),
            Err(PriceError::Invalid(_))
        ));
    }

    #[test]
    fn test_serde_as_decimal() {
        let price = Price::parse("19.99").unwrap();
        let json = serde_json::to_string(&price).unwrap();
        let back: Price = serde_json::from_str(&json).unwrap();
        assert_eq!(back, price);
    }

    #[test]
    fn test_serde_rejects_negative() {
        let result: Result<Price, _> = serde_json::from_str("\"-3.00\"");
        assert!(result.is_err());
    }
}
