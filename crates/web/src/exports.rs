//! Export snapshots and their TTL cache.
//!
//! Export endpoints are advisory reporting views: the first request inside a
//! TTL window computes and stores a serialized snapshot, and every request
//! in the same window returns the stored bytes verbatim even if the
//! underlying data changed. Repeat reads inside the window are therefore
//! byte-identical. The cache contract is get / insert-with-TTL and nothing
//! else; it hangs off `AppState` and is injected into handlers, never a
//! process-wide global.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::future::Cache;
use serde::Serialize;

use kiosk_core::{OrderId, ProductId, UserId};

use crate::models::{Order, Product};

/// How long a products export snapshot stays valid.
pub const PRODUCTS_EXPORT_TTL: Duration = Duration::from_secs(60);

/// How long a per-user orders export snapshot stays valid.
pub const USER_ORDERS_EXPORT_TTL: Duration = Duration::from_secs(120);

/// Cache keys derive deterministically from the resource scope.
pub mod cache_keys {
    use kiosk_core::UserId;

    /// Key for the all-products export.
    pub const PRODUCTS_EXPORT: &str = "products-export";

    /// Key for one user's orders export.
    #[must_use]
    pub fn user_orders_export(user_id: UserId) -> String {
        format!("user-{user_id}-orders-export")
    }
}

/// A cached serialized snapshot.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub body: Arc<String>,
    ttl: Duration,
}

/// Per-entry expiry: each snapshot carries its own TTL.
struct SnapshotExpiry;

impl Expiry<String, Snapshot> for SnapshotExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        value: &Snapshot,
        _created_at: Instant,
    ) -> Option<Duration> {
        Some(value.ttl)
    }
}

/// TTL cache for export snapshots.
#[derive(Clone)]
pub struct SnapshotCache {
    cache: Cache<String, Snapshot>,
}

impl SnapshotCache {
    /// Create an empty snapshot cache.
    #[must_use]
    pub fn new() -> Self {
        let cache = Cache::builder()
            .max_capacity(1024)
            .expire_after(SnapshotExpiry)
            .build();
        Self { cache }
    }

    /// Get a stored snapshot if its TTL has not elapsed.
    pub async fn get(&self, key: &str) -> Option<Arc<String>> {
        self.cache.get(key).await.map(|s| s.body)
    }

    /// Store a snapshot under `key` for `ttl`.
    pub async fn insert(&self, key: impl Into<String>, body: String, ttl: Duration) {
        self.cache
            .insert(
                key.into(),
                Snapshot {
                    body: Arc::new(body),
                    ttl,
                },
            )
            .await;
    }
}

impl Default for SnapshotCache {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Snapshot serializers
// =============================================================================

/// One product as projected into the JSON export.
#[derive(Debug, Serialize)]
struct ProductExportRow<'a> {
    pk: ProductId,
    name: &'a str,
    description: &'a str,
    price: kiosk_core::Price,
    quantity: i32,
}

/// Serialize the products export: `{"products": [...]}` ordered as given.
///
/// # Errors
///
/// Returns `serde_json::Error` if serialization fails.
pub fn products_snapshot(products: &[Product]) -> Result<String, serde_json::Error> {
    let rows: Vec<ProductExportRow<'_>> = products
        .iter()
        .map(|p| ProductExportRow {
            pk: p.id,
            name: &p.name,
            description: &p.description,
            price: p.price,
            quantity: p.quantity,
        })
        .collect();
    serde_json::to_string(&serde_json::json!({ "products": rows }))
}

/// One order as projected into the per-user JSON export.
#[derive(Debug, Serialize)]
struct OrderExportRow<'a> {
    pk: OrderId,
    delivery_address: &'a str,
    promo_code: &'a str,
    created_at: chrono::DateTime<chrono::Utc>,
    user_id: Option<UserId>,
    products: &'a [ProductId],
}

/// Serialize one user's orders export: `{"orders": [...]}` ordered as given.
///
/// # Errors
///
/// Returns `serde_json::Error` if serialization fails.
pub fn user_orders_snapshot(
    orders: &[(Order, Vec<ProductId>)],
) -> Result<String, serde_json::Error> {
    let rows: Vec<OrderExportRow<'_>> = orders
        .iter()
        .map(|(order, products)| OrderExportRow {
            pk: order.id,
            delivery_address: &order.delivery_address,
            promo_code: &order.promo_code,
            created_at: order.created_at,
            user_id: order.user_id,
            products,
        })
        .collect();
    serde_json::to_string(&serde_json::json!({ "orders": rows }))
}

/// Serialize products as the CSV attachment (`name,price,quantity`).
///
/// # Errors
///
/// Returns `csv::Error` if writing fails.
pub fn products_csv(products: &[Product]) -> Result<String, csv::Error> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["name", "price", "quantity"])?;
    for product in products {
        writer.write_record([
            product.name.as_str(),
            &product.price.to_string(),
            &product.quantity.to_string(),
        ])?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| csv::Error::from(std::io::Error::other(e.to_string())))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use kiosk_core::Price;

    fn product(id: i32, name: &str, price: &str, quantity: i32) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: format!("{name} description"),
            price: Price::parse(price).unwrap(),
            quantity,
            has_extended_warranty: false,
            archived: false,
            preview_path: None,
            created_by: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_cache_roundtrip() {
        let cache = SnapshotCache::new();
        cache
            .insert("k", "payload".to_string(), Duration::from_secs(60))
            .await;
        assert_eq!(cache.get("k").await.as_deref().map(String::as_str), Some("payload"));
        assert!(cache.get("other").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_entry_expires() {
        let cache = SnapshotCache::new();
        cache
            .insert("k", "payload".to_string(), Duration::from_millis(50))
            .await;
        assert!(cache.get("k").await.is_some());
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn test_cache_entries_expire_independently() {
        let cache = SnapshotCache::new();
        cache
            .insert("short", "a".to_string(), Duration::from_millis(50))
            .await;
        cache
            .insert("long", "b".to_string(), Duration::from_secs(60))
            .await;
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert!(cache.get("short").await.is_none());
        assert!(cache.get("long").await.is_some());
    }

    #[test]
    fn test_products_snapshot_shape() {
        let products = vec![product(1, "Widget", "9.99", 5), product(2, "Gadget", "19.99", 2)];
        let json = products_snapshot(&products).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let rows = value.get("products").unwrap().as_array().unwrap();
        assert_eq!(rows.len(), 2);
        let first = rows.first().unwrap();
        assert_eq!(first.get("pk").unwrap(), 1);
        assert_eq!(first.get("name").unwrap(), "Widget");
        assert_eq!(first.get("price").unwrap(), "9.99");
        assert_eq!(first.get("quantity").unwrap(), 5);
    }

    #[test]
    fn test_products_snapshot_deterministic() {
        let products = vec![product(1, "Widget", "9.99", 5)];
        assert_eq!(
            products_snapshot(&products).unwrap(),
            products_snapshot(&products).unwrap()
        );
    }

    #[test]
    fn test_products_csv_layout() {
        let products = vec![product(1, "Widget", "9.99", 5)];
        let csv = products_csv(&products).unwrap();
        let mut lines = csv.lines();
        assert_eq!(lines.next(), Some("name,price,quantity"));
        assert_eq!(lines.next(), Some("Widget,9.99,5"));
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn test_user_orders_snapshot_shape() {
        let order = Order {
            id: OrderId::new(4),
            delivery_address: "1 Main St".to_string(),
            promo_code: "SAVE10".to_string(),
            created_at: Utc::now(),
            user_id: Some(UserId::new(2)),
        };
        let json = user_orders_snapshot(&[(order, vec![ProductId::new(1)])]).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let rows = value.get("orders").unwrap().as_array().unwrap();
        let first = rows.first().unwrap();
        assert_eq!(first.get("pk").unwrap(), 4);
        assert_eq!(first.get("user_id").unwrap(), 2);
        assert_eq!(first.get("products").unwrap(), &serde_json::json!([1]));
    }
}
