//! Cached JSON export endpoints.
//!
//! These are staleness-tolerant reporting views: within the TTL window the
//! stored snapshot is returned verbatim, even if the underlying data
//! changed.

use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use kiosk_core::UserId;

use crate::db::{OrderRepository, ProductRepository, UserRepository};
use crate::error::{AppError, Result};
use crate::exports::{
    PRODUCTS_EXPORT_TTL, USER_ORDERS_EXPORT_TTL, cache_keys, products_snapshot,
    user_orders_snapshot,
};
use crate::state::AppState;

fn json_response(body: &str) -> Response {
    (
        [(header::CONTENT_TYPE, "application/json")],
        body.to_owned(),
    )
        .into_response()
}

/// JSON export of all products, cached for 60 seconds.
#[instrument(skip(state))]
pub async fn products_export(State(state): State<AppState>) -> Result<Response> {
    if let Some(cached) = state.snapshots().get(cache_keys::PRODUCTS_EXPORT).await {
        tracing::debug!("products export served from cache");
        return Ok(json_response(&cached));
    }

    let products = ProductRepository::new(state.pool()).list_by_pk().await?;
    let body = products_snapshot(&products)
        .map_err(|e| AppError::Internal(format!("export serialization failed: {e}")))?;

    state
        .snapshots()
        .insert(cache_keys::PRODUCTS_EXPORT, body.clone(), PRODUCTS_EXPORT_TTL)
        .await;

    Ok(json_response(&body))
}

/// JSON export of one user's orders, cached for 120 seconds.
///
/// The user lookup happens before the cache so an unknown id is always a
/// 404, never a stale snapshot.
#[instrument(skip(state))]
pub async fn user_orders_export(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Response> {
    let user_id = UserId::new(id);
    UserRepository::new(state.pool())
        .get(user_id)
        .await?
        .ok_or(AppError::NotFound)?;

    let key = cache_keys::user_orders_export(user_id);
    if let Some(cached) = state.snapshots().get(&key).await {
        tracing::debug!(user_id = id, "user orders export served from cache");
        return Ok(json_response(&cached));
    }

    let orders = OrderRepository::new(state.pool())
        .list_for_user_with_product_ids(user_id)
        .await?;
    let body = user_orders_snapshot(&orders)
        .map_err(|e| AppError::Internal(format!("export serialization failed: {e}")))?;

    state
        .snapshots()
        .insert(key, body.clone(), USER_ORDERS_EXPORT_TTL)
        .await;

    Ok(json_response(&body))
}
