//! Order models.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use kiosk_core::{OrderId, UserId};

use super::product::Product;

/// An order row. The product set lives in the `order_product` join table.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    pub delivery_address: String,
    pub promo_code: String,
    pub created_at: DateTime<Utc>,
    pub user_id: Option<UserId>,
}

/// Validated input for creating or updating an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub delivery_address: String,
    pub promo_code: String,
    pub user_id: Option<UserId>,
    pub product_ids: Vec<kiosk_core::ProductId>,
}

/// An order as shown in list views: owner name and derived aggregates only.
#[derive(Debug, Clone)]
pub struct OrderSummary {
    pub order: Order,
    pub username: Option<String>,
    pub product_count: i64,
    /// Sum of the joined products' prices. Derived, never stored.
    pub total_price: Decimal,
}

/// An order with its full product set, for detail views.
#[derive(Debug, Clone)]
pub struct OrderDetail {
    pub order: Order,
    pub username: Option<String>,
    pub products: Vec<Product>,
}

impl OrderDetail {
    /// Total price of the order, derived from the product set.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.products.iter().map(|p| p.price.amount()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kiosk_core::{Price, ProductId};

    fn product(price: &str) -> Product {
        Product {
            id: ProductId::new(1),
            name: "Widget".to_string(),
            description: String::new(),
            price: Price::parse(price).expect("valid price"),
            quantity: 1,
            has_extended_warranty: false,
            archived: false,
            preview_path: None,
            created_by: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_total_price_is_derived() {
        let detail = OrderDetail {
            order: Order {
                id: OrderId::new(1),
                delivery_address: String::new(),
                promo_code: String::new(),
                created_at: Utc::now(),
                user_id: None,
            },
            username: None,
            products: vec![product("9.99"), product("19.99")],
        };
        assert_eq!(detail.total_price(), Decimal::new(2998, 2));
    }

    #[test]
    fn test_empty_order_totals_zero() {
        let detail = OrderDetail {
            order: Order {
                id: OrderId::new(1),
                delivery_address: String::new(),
                promo_code: String::new(),
                created_at: Utc::now(),
                user_id: None,
            },
            username: None,
            products: vec![],
        };
        assert_eq!(detail.total_price(), Decimal::ZERO);
    }
}
