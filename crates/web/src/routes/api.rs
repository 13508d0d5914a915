//! Product JSON API: CRUD plus CSV download/upload.

use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tracing::instrument;

use kiosk_core::ProductId;

use crate::db::{ProductFilter, ProductOrdering, ProductRepository};
use crate::error::{AppError, Result};
use crate::exports;
use crate::forms::ProductPayload;
use crate::imports;
use crate::middleware::RequireStaff;
use crate::models::Product;
use crate::state::AppState;

/// Query parameters for the API product listing.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub search: Option<String>,
    pub archived: Option<bool>,
    pub ordering: Option<String>,
}

impl ListQuery {
    /// Convert to a repository filter.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` for an unknown ordering parameter.
    fn into_filter(self) -> Result<ProductFilter> {
        let ordering = match self.ordering.as_deref() {
            None => ProductOrdering::default(),
            Some(raw) => ProductOrdering::parse(raw)
                .ok_or_else(|| AppError::BadRequest(format!("unknown ordering: {raw}")))?,
        };
        Ok(ProductFilter {
            search: self.search.filter(|s| !s.trim().is_empty()),
            archived: self.archived,
            ordering,
        })
    }
}

/// List products with search, archived filter, and ordering.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Product>>> {
    let filter = query.into_filter()?;
    let products = ProductRepository::new(state.pool())
        .list_filtered(&filter)
        .await?;
    Ok(Json(products))
}

/// Product detail; 404 if absent.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Product>> {
    let product = ProductRepository::new(state.pool())
        .get(ProductId::new(id))
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(product))
}

/// Create a product (staff only).
#[instrument(skip(state, user, payload))]
pub async fn create(
    RequireStaff(user): RequireStaff,
    State(state): State<AppState>,
    Json(payload): Json<ProductPayload>,
) -> Result<(StatusCode, Json<Product>)> {
    let input = payload.validate(Some(user.id))?;
    let product = ProductRepository::new(state.pool()).create(&input).await?;
    tracing::info!(product_id = %product.id, "product created via API");
    Ok((StatusCode::CREATED, Json(product)))
}

/// Update a product (staff only).
#[instrument(skip(state, _user, payload))]
pub async fn update(
    RequireStaff(_user): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<ProductPayload>,
) -> Result<Json<Product>> {
    let input = payload.validate(None)?;
    let product = ProductRepository::new(state.pool())
        .update(ProductId::new(id), &input)
        .await?;
    Ok(Json(product))
}

/// Soft-delete a product via the API (staff only).
#[instrument(skip(state, _user))]
pub async fn archive(
    RequireStaff(_user): RequireStaff,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    ProductRepository::new(state.pool())
        .set_archived(ProductId::new(id), true)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// CSV attachment of all products (`name,price,quantity`).
#[instrument(skip(state))]
pub async fn download_csv(State(state): State<AppState>) -> Result<Response> {
    let products = ProductRepository::new(state.pool()).list_by_pk().await?;
    let body = exports::products_csv(&products)
        .map_err(|e| AppError::Internal(format!("CSV serialization failed: {e}")))?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=products-export.csv",
            ),
        ],
        body,
    )
        .into_response())
}

/// Multipart CSV import (staff only). Returns the created records.
///
/// The upload must carry a `file` part; its content type may declare a
/// charset. The import is all-or-nothing.
#[instrument(skip(state, _user, multipart))]
pub async fn upload_csv(
    RequireStaff(_user): RequireStaff,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Vec<Product>>)> {
    let mut upload: Option<(Vec<u8>, Option<String>)> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("invalid multipart body: {e}")))?
    {
        if field.name() == Some("file") {
            let charset = field.content_type().and_then(parse_charset);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("failed to read upload: {e}")))?;
            upload = Some((bytes.to_vec(), charset));
            break;
        }
    }

    let (bytes, charset) =
        upload.ok_or_else(|| AppError::BadRequest("missing 'file' part".to_string()))?;

    let created = imports::load_products(state.pool(), &bytes, charset.as_deref()).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Extract the charset parameter from a content-type string.
fn parse_charset(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .skip(1)
        .map(str::trim)
        .find_map(|param| param.strip_prefix("charset="))
        .map(|v| v.trim_matches('"').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_charset_present() {
        assert_eq!(
            parse_charset("text/csv; charset=utf-8"),
            Some("utf-8".to_string())
        );
        assert_eq!(
            parse_charset("text/csv; boundary=x; charset=\"us-ascii\""),
            Some("us-ascii".to_string())
        );
    }

    #[test]
    fn test_parse_charset_absent() {
        assert_eq!(parse_charset("text/csv"), None);
    }

    #[test]
    fn test_list_query_rejects_unknown_ordering() {
        let query = ListQuery {
            search: None,
            archived: None,
            ordering: Some("created_at".to_string()),
        };
        assert!(query.into_filter().is_err());
    }

    #[test]
    fn test_list_query_blank_search_dropped() {
        let query = ListQuery {
            search: Some("   ".to_string()),
            archived: Some(true),
            ordering: Some("-price".to_string()),
        };
        let filter = query.into_filter().expect("valid filter");
        assert!(filter.search.is_none());
        assert_eq!(filter.archived, Some(true));
        assert_eq!(filter.ordering, ProductOrdering::PriceDesc);
    }
}
