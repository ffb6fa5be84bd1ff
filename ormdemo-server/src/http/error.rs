//! API error types with IntoResponse
//!
//! Errors are converted to JSON responses with appropriate status codes.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::db::migrations::USER_AGE_CONSTRAINT;
use crate::db::DbError;
use crate::models::{Age, ValidationError};

/// API error type with automatic HTTP status mapping
#[derive(Debug)]
pub enum ApiError {
    /// Validation failed (400)
    Validation(ValidationError),

    /// Write referenced a row that does not exist (400)
    BadReference,

    /// Resource not found (404)
    NotFound { resource: &'static str, id: String },

    /// Unique constraint rejected the write (409)
    Conflict,

    /// Transaction exceeded its limit (504)
    Timeout { stage: &'static str, limit_ms: u64 },

    /// Database error (500, logged)
    Database(DbError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            Self::Validation(e) => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "validation_error",
                    "message": e.to_string()
                }),
            ),
            Self::BadReference => (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": "bad_reference",
                    "message": "referenced record does not exist"
                }),
            ),
            Self::NotFound { resource, id } => (
                StatusCode::NOT_FOUND,
                json!({
                    "error": "not_found",
                    "message": format!("{} '{}' not found", resource, id)
                }),
            ),
            Self::Conflict => (
                StatusCode::CONFLICT,
                json!({
                    "error": "conflict",
                    "message": "record already exists"
                }),
            ),
            Self::Timeout { stage, limit_ms } => {
                tracing::warn!(stage, limit_ms, "transaction timed out");
                (
                    StatusCode::GATEWAY_TIMEOUT,
                    json!({
                        "error": "timeout",
                        "message": format!("transaction timed out while {} after {} ms", stage, limit_ms)
                    }),
                )
            }
            Self::Database(e) => {
                // Log the actual error, return generic message
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({
                        "error": "internal_error",
                        "message": "an internal error occurred"
                    }),
                )
            }
        };

        (status, Json(body)).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(e: ValidationError) -> Self {
        Self::Validation(e)
    }
}

impl From<DbError> for ApiError {
    fn from(e: DbError) -> Self {
        if e.is_unique_violation() {
            return Self::Conflict;
        }
        if e.is_foreign_key_violation() {
            return Self::BadReference;
        }
        if e.is_check_violation() {
            return Self::Validation(check_violation(e.constraint()));
        }
        match e {
            DbError::NotFound { resource, id } => Self::NotFound { resource, id },
            DbError::Timeout { stage, limit_ms } => Self::Timeout { stage, limit_ms },
            _ => Self::Database(e),
        }
    }
}

/// Validation error for a write the database rejected with a CHECK.
fn check_violation(constraint: Option<&str>) -> ValidationError {
    match constraint {
        Some(USER_AGE_CONSTRAINT) => Age::range_error(),
        _ => ValidationError::InvalidFormat {
            field: "record",
            reason: "rejected by a check constraint",
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn validation_error_is_400() {
        let err = ApiError::Validation(ValidationError::Empty { field: "name" });
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "validation_error");
    }

    #[tokio::test]
    async fn missing_row_maps_to_404() {
        let err: ApiError = DbError::NotFound {
            resource: "user",
            id: "7".into(),
        }
        .into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body["message"], "user '7' not found");
    }

    #[tokio::test]
    async fn timeout_maps_to_504() {
        let err: ApiError = DbError::Timeout {
            stage: "running",
            limit_ms: 10_000,
        }
        .into();
        assert_eq!(err.into_response().status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[tokio::test]
    async fn database_error_hides_details() {
        let err: ApiError = DbError::Sqlx(sqlx::Error::PoolTimedOut).into();
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["message"], "an internal error occurred");
    }

    #[tokio::test]
    async fn age_check_reads_as_age_range_error() {
        let err = ApiError::Validation(check_violation(Some(USER_AGE_CONSTRAINT)));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let body = body_json(response).await;
        assert_eq!(body["error"], "validation_error");
        assert_eq!(body["message"], "age must be between 0 and 150");
    }

    #[test]
    fn unknown_check_is_generic_validation_error() {
        assert!(matches!(
            check_violation(Some("files_size_check")),
            ValidationError::InvalidFormat { field: "record", .. }
        ));
        assert!(matches!(check_violation(None), ValidationError::InvalidFormat { .. }));
    }

    #[tokio::test]
    async fn conflict_is_409() {
        assert_eq!(ApiError::Conflict.into_response().status(), StatusCode::CONFLICT);
    }
}
