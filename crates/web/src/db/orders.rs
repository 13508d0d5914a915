//! Order repository.
//!
//! Orders are hard-deleted; the `order_product` join rows go with them via
//! `ON DELETE CASCADE`, and the referenced products are left untouched.

use sqlx::PgPool;

use kiosk_core::{OrderId, ProductId, UserId};

use super::{RepositoryError, map_unique_violation};
use crate::models::{NewOrder, Order, OrderDetail, OrderSummary, Product};

/// Row shape for list queries: order columns plus derived aggregates.
#[derive(Debug, sqlx::FromRow)]
struct OrderSummaryRow {
    #[sqlx(flatten)]
    order: Order,
    username: Option<String>,
    product_count: i64,
    total_price: rust_decimal::Decimal,
}

impl From<OrderSummaryRow> for OrderSummary {
    fn from(row: OrderSummaryRow) -> Self {
        Self {
            order: row.order,
            username: row.username,
            product_count: row.product_count,
            total_price: row.total_price,
        }
    }
}

const SUMMARY_QUERY: &str = "SELECT o.id, o.delivery_address, o.promo_code, o.created_at, o.user_id, \
            u.username AS username, \
            COUNT(op.product_id) AS product_count, \
            COALESCE(SUM(p.price), 0) AS total_price \
     FROM shop_order o \
     LEFT JOIN kiosk_user u ON u.id = o.user_id \
     LEFT JOIN order_product op ON op.order_id = o.id \
     LEFT JOIN product p ON p.id = op.product_id \
     WHERE ($1::int IS NULL OR o.user_id = $1) \
     GROUP BY o.id, u.username \
     ORDER BY o.id";

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List all orders with owner names and derived aggregates.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_summaries(&self) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummaryRow>(SUMMARY_QUERY)
            .bind(None::<i32>)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// List one user's orders, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
    ) -> Result<Vec<OrderSummary>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderSummaryRow>(SUMMARY_QUERY)
            .bind(Some(user_id.as_i32()))
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    /// Get an order with its full product set.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get_detail(
        &self,
        id: OrderId,
    ) -> Result<Option<OrderDetail>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderWithOwnerRow>(
            "SELECT o.id, o.delivery_address, o.promo_code, o.created_at, o.user_id, \
                    u.username AS username \
             FROM shop_order o \
             LEFT JOIN kiosk_user u ON u.id = o.user_id \
             WHERE o.id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let products = sqlx::query_as::<_, Product>(
            "SELECT p.id, p.name, p.description, p.price, p.quantity, \
                    p.has_extended_warranty, p.archived, p.preview_path, \
                    p.created_by, p.created_at \
             FROM product p \
             INNER JOIN order_product op ON op.product_id = p.id \
             WHERE op.order_id = $1 \
             ORDER BY p.name, p.price",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(Some(OrderDetail {
            order: row.order,
            username: row.username,
            products,
        }))
    }

    /// One user's orders with their product id sets, ordered by pk.
    ///
    /// This is the projection used by the per-user JSON export.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user_with_product_ids(
        &self,
        user_id: UserId,
    ) -> Result<Vec<(Order, Vec<ProductId>)>, RepositoryError> {
        let orders = sqlx::query_as::<_, Order>(
            "SELECT id, delivery_address, promo_code, created_at, user_id \
             FROM shop_order WHERE user_id = $1 ORDER BY id",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        let order_ids: Vec<i32> = orders.iter().map(|o| o.id.as_i32()).collect();
        let pairs = sqlx::query_as::<_, (i32, i32)>(
            "SELECT order_id, product_id FROM order_product \
             WHERE order_id = ANY($1) ORDER BY order_id, product_id",
        )
        .bind(&order_ids)
        .fetch_all(self.pool)
        .await?;

        Ok(orders
            .into_iter()
            .map(|order| {
                let products = pairs
                    .iter()
                    .filter(|(oid, _)| *oid == order.id.as_i32())
                    .map(|(_, pid)| ProductId::new(*pid))
                    .collect();
                (order, products)
            })
            .collect())
    }

    /// Create an order and its product set in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails; a failure while
    /// writing join rows rolls back the order row too.
    pub async fn create(&self, input: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(
            "INSERT INTO shop_order (delivery_address, promo_code, user_id) \
             VALUES ($1, $2, $3) \
             RETURNING id, delivery_address, promo_code, created_at, user_id",
        )
        .bind(&input.delivery_address)
        .bind(&input.promo_code)
        .bind(input.user_id)
        .fetch_one(&mut *tx)
        .await?;

        insert_order_products(&mut tx, order.id, &input.product_ids).await?;

        tx.commit().await?;
        Ok(order)
    }

    /// Update an order's fields and replace its product set.
    ///
    /// `created_at` is never written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this id.
    pub async fn update(&self, id: OrderId, input: &NewOrder) -> Result<Order, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let order = sqlx::query_as::<_, Order>(
            "UPDATE shop_order SET delivery_address = $2, promo_code = $3, user_id = $4 \
             WHERE id = $1 \
             RETURNING id, delivery_address, promo_code, created_at, user_id",
        )
        .bind(id)
        .bind(&input.delivery_address)
        .bind(&input.promo_code)
        .bind(input.user_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        sqlx::query("DELETE FROM order_product WHERE order_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        insert_order_products(&mut tx, id, &input.product_ids).await?;

        tx.commit().await?;
        Ok(order)
    }

    /// Hard-delete an order. Join rows cascade; products are untouched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no order has this id.
    pub async fn delete(&self, id: OrderId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM shop_order WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Insert a batch of orders in a single transaction (CSV import).
    ///
    /// # Errors
    ///
    /// Any failure rolls back the whole batch.
    pub async fn bulk_insert(&self, inputs: &[NewOrder]) -> Result<Vec<Order>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(inputs.len());

        for input in inputs {
            let order = sqlx::query_as::<_, Order>(
                "INSERT INTO shop_order (delivery_address, promo_code, user_id) \
                 VALUES ($1, $2, $3) \
                 RETURNING id, delivery_address, promo_code, created_at, user_id",
            )
            .bind(&input.delivery_address)
            .bind(&input.promo_code)
            .bind(input.user_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_unique_violation(e, "duplicate order in batch"))?;

            insert_order_products(&mut tx, order.id, &input.product_ids).await?;
            created.push(order);
        }

        tx.commit().await?;
        Ok(created)
    }
}

/// Internal row shape for detail queries.
#[derive(Debug, sqlx::FromRow)]
struct OrderWithOwnerRow {
    #[sqlx(flatten)]
    order: Order,
    username: Option<String>,
}

/// Write join rows for an order inside an open transaction.
async fn insert_order_products(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    order_id: OrderId,
    product_ids: &[ProductId],
) -> Result<(), RepositoryError> {
    for product_id in product_ids {
        sqlx::query("INSERT INTO order_product (order_id, product_id) VALUES ($1, $2)")
            .bind(order_id)
            .bind(product_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}
