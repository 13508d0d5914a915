//! Product repository.
//!
//! Products are soft-deleted: `archive` flips the `archived` flag and
//! default listings filter on it, so a product referenced by historical
//! orders never disappears.

use sqlx::PgPool;

use kiosk_core::ProductId;

use super::{RepositoryError, map_unique_violation};
use crate::models::{NewProduct, Product};

/// Columns selected for every product query.
const PRODUCT_COLUMNS: &str = "id, name, description, price, quantity, \
     has_extended_warranty, archived, preview_path, created_by, created_at";

/// How an API listing should be ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductOrdering {
    #[default]
    Name,
    NameDesc,
    Price,
    PriceDesc,
    Quantity,
    QuantityDesc,
}

impl ProductOrdering {
    /// Parse an ordering parameter (`name`, `-price`, ...).
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "name" => Some(Self::Name),
            "-name" => Some(Self::NameDesc),
            "price" => Some(Self::Price),
            "-price" => Some(Self::PriceDesc),
            "quantity" => Some(Self::Quantity),
            "-quantity" => Some(Self::QuantityDesc),
            _ => None,
        }
    }

    const fn sql(self) -> &'static str {
        match self {
            Self::Name => "name ASC, price ASC",
            Self::NameDesc => "name DESC, price ASC",
            Self::Price => "price ASC, name ASC",
            Self::PriceDesc => "price DESC, name ASC",
            Self::Quantity => "quantity ASC, name ASC",
            Self::QuantityDesc => "quantity DESC, name ASC",
        }
    }
}

/// Filter for API product listings.
#[derive(Debug, Clone, Default)]
pub struct ProductFilter {
    /// Substring match against name or description.
    pub search: Option<String>,
    /// Filter by archived flag; `None` includes both.
    pub archived: Option<bool>,
    pub ordering: ProductOrdering,
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// List non-archived products in the default ordering (name, price).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_active(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE NOT archived ORDER BY name, price"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// List products for the API, with search, archived filter, and ordering.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_filtered(
        &self,
        filter: &ProductFilter,
    ) -> Result<Vec<Product>, RepositoryError> {
        let query = format!(
            "SELECT {PRODUCT_COLUMNS} FROM product \
             WHERE ($1::text IS NULL OR name ILIKE '%' || $1 || '%' \
                    OR description ILIKE '%' || $1 || '%') \
               AND ($2::bool IS NULL OR archived = $2) \
             ORDER BY {}",
            filter.ordering.sql()
        );

        let products = sqlx::query_as::<_, Product>(&query)
            .bind(filter.search.as_deref())
            .bind(filter.archived)
            .fetch_all(self.pool)
            .await?;

        Ok(products)
    }

    /// All products ordered by pk, the projection used by exports.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_by_pk(&self) -> Result<Vec<Product>, RepositoryError> {
        let products = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(products)
    }

    /// Get a product by id. Archived products are still addressable here.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(product)
    }

    /// Create a new product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a uniqueness violation and
    /// `RepositoryError::Database` for other failures.
    pub async fn create(&self, input: &NewProduct) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO product \
                 (name, description, price, quantity, has_extended_warranty, \
                  archived, preview_path, created_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.quantity)
        .bind(input.has_extended_warranty)
        .bind(input.archived)
        .bind(input.preview_path.as_deref())
        .bind(input.created_by)
        .fetch_one(self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "product already exists"))?;

        Ok(product)
    }

    /// Update an existing product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id.
    pub async fn update(
        &self,
        id: ProductId,
        input: &NewProduct,
    ) -> Result<Product, RepositoryError> {
        let product = sqlx::query_as::<_, Product>(&format!(
            "UPDATE product SET \
                 name = $2, description = $3, price = $4, quantity = $5, \
                 has_extended_warranty = $6, archived = $7, preview_path = $8 \
             WHERE id = $1 \
             RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.price)
        .bind(input.quantity)
        .bind(input.has_extended_warranty)
        .bind(input.archived)
        .bind(input.preview_path.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(product)
    }

    /// Set the archived flag (soft delete / restore).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no product has this id.
    pub async fn set_archived(
        &self,
        id: ProductId,
        archived: bool,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE product SET archived = $2 WHERE id = $1")
            .bind(id)
            .bind(archived)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Insert a batch of products in a single transaction.
    ///
    /// Used by the CSV bulk loader: either every row is persisted or, on the
    /// first failure, the transaction rolls back and none are.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` on a uniqueness violation and
    /// `RepositoryError::Database` for other failures; in both cases nothing
    /// was persisted.
    pub async fn bulk_insert(
        &self,
        inputs: &[NewProduct],
    ) -> Result<Vec<Product>, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(inputs.len());

        for input in inputs {
            let product = sqlx::query_as::<_, Product>(&format!(
                "INSERT INTO product \
                     (name, description, price, quantity, has_extended_warranty, \
                      archived, preview_path, created_by) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
                 RETURNING {PRODUCT_COLUMNS}"
            ))
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.price)
            .bind(input.quantity)
            .bind(input.has_extended_warranty)
            .bind(input.archived)
            .bind(input.preview_path.as_deref())
            .bind(input.created_by)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| map_unique_violation(e, "duplicate product in batch"))?;

            created.push(product);
        }

        tx.commit().await?;
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_parse() {
        assert_eq!(ProductOrdering::parse("name"), Some(ProductOrdering::Name));
        assert_eq!(
            ProductOrdering::parse("-price"),
            Some(ProductOrdering::PriceDesc)
        );
        assert_eq!(
            ProductOrdering::parse("-quantity"),
            Some(ProductOrdering::QuantityDesc)
        );
        assert_eq!(ProductOrdering::parse("created_at"), None);
    }

    #[test]
    fn test_default_ordering_matches_listing() {
        assert_eq!(ProductOrdering::default().sql(), "name ASC, price ASC");
    }
}
