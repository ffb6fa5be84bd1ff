//! Custom Axum extractors

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;

use super::error::ApiError;
use crate::models::ValidationError;

/// Extract and validate a positive integer id from a single-segment path
pub struct ValidId(pub i32);

impl<S> FromRequestParts<S> for ValidId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Validation(ValidationError::Empty { field: "id" }))?;

        parse_id(&raw).map(Self)
    }
}

fn parse_id(raw: &str) -> Result<i32, ApiError> {
    let id: i32 = raw.parse().map_err(|_| {
        ApiError::Validation(ValidationError::InvalidFormat {
            field: "id",
            reason: "expected an integer",
        })
    })?;

    if id <= 0 {
        return Err(ApiError::Validation(ValidationError::OutOfRange {
            field: "id",
            min: 1,
            max: i32::MAX as i64,
        }));
    }

    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_positive_ids() {
        assert_eq!(parse_id("42").unwrap(), 42);
    }

    #[test]
    fn rejects_garbage_and_non_positive() {
        assert!(matches!(
            parse_id("abc"),
            Err(ApiError::Validation(ValidationError::InvalidFormat { .. }))
        ));
        assert!(matches!(
            parse_id("0"),
            Err(ApiError::Validation(ValidationError::OutOfRange { .. }))
        ));
        assert!(parse_id("99999999999").is_err());
    }
}
