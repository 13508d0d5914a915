//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-class errors to
//! Sentry before responding to the client. All route handlers should return
//! `Result<T, AppError>`. Validation and decode errors are recovered at the
//! controller boundary where a form re-render is wanted; when they reach
//! this type they surface as structured 4xx bodies (the API path).

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::forms::ValidationErrors;
use crate::imports::{DecodeError, ImportError};
use crate::services::auth::AuthError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Input failed field validation.
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationErrors),

    /// Uploaded stream could not be decoded.
    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),

    /// CSV import failed before or during persistence.
    #[error("Import error: {0}")]
    Import(ImportError),

    /// Resource not found.
    #[error("Not found")]
    NotFound,

    /// Caller is not logged in.
    #[error("Unauthorized")]
    Unauthorized,

    /// Caller lacks the required capability.
    #[error("Forbidden")]
    Forbidden,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::NotFound,
            other => Self::Database(other),
        }
    }
}

impl From<ImportError> for AppError {
    fn from(e: ImportError) -> Self {
        match e {
            ImportError::Decode(decode) => Self::Decode(decode),
            ImportError::Persistence(repo) => Self::from(repo),
            other => Self::Import(other),
        }
    }
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Database(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(AuthError::InvalidCredentials) | Self::Unauthorized => {
                StatusCode::UNAUTHORIZED
            }
            Self::Auth(AuthError::UserAlreadyExists) => StatusCode::CONFLICT,
            Self::Auth(AuthError::WeakPassword(_)) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Auth(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Validation(_) | Self::Decode(_) | Self::Import(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Database(_) | Self::Internal(_) | Self::Auth(AuthError::PasswordHash)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = self.status();

        // Field-level errors get a structured body; everything else a plain
        // message, with internal details withheld from clients.
        let body = match &self {
            Self::Validation(errors) => json!({ "errors": errors }),
            Self::Import(ImportError::Row { row, errors }) => {
                json!({ "row": row, "errors": errors })
            }
            Self::Import(e) => json!({ "detail": e.to_string() }),
            Self::Decode(e) => json!({ "detail": e.to_string() }),
            Self::Database(RepositoryError::Conflict(msg)) => json!({ "detail": msg }),
            Self::Database(_) | Self::Internal(_) => {
                json!({ "detail": "internal server error" })
            }
            Self::Auth(AuthError::InvalidCredentials) => {
                json!({ "detail": "invalid credentials" })
            }
            other => json!({ "detail": other.to_string() }),
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_not_found_maps_to_404() {
        assert_eq!(status_of(AppError::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(AppError::from(RepositoryError::NotFound)),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_repository_not_found_converts() {
        let err = AppError::from(RepositoryError::NotFound);
        assert!(matches!(err, AppError::NotFound));
    }

    #[test]
    fn test_conflict_maps_to_409() {
        let err = AppError::from(RepositoryError::Conflict("dup".to_string()));
        assert_eq!(status_of(err), StatusCode::CONFLICT);
    }

    #[test]
    fn test_validation_maps_to_400() {
        let mut errors = ValidationErrors::default();
        errors.add("name", "this field is required");
        assert_eq!(status_of(AppError::Validation(errors)), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_decode_maps_to_400() {
        assert_eq!(
            status_of(AppError::Decode(DecodeError::InvalidUtf8)),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_permission_statuses() {
        assert_eq!(status_of(AppError::Unauthorized), StatusCode::UNAUTHORIZED);
        assert_eq!(status_of(AppError::Forbidden), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_import_persistence_maps_to_500() {
        let err = AppError::from(ImportError::Persistence(RepositoryError::DataCorruption(
            "bad".to_string(),
        )));
        assert_eq!(status_of(err), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
