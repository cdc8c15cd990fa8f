//! # API Error Type
//!
//! Unified error type for HTTP handlers.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in promo-api                              │
//! │                                                                         │
//! │  Handler ──► CartService ──► Result<T, ApiError>                        │
//! │                  │                                                      │
//! │                  ├── CartError    ──► 409 / 404 / 400                   │
//! │                  ├── CouponError  ──► 422 COUPON_REJECTED               │
//! │                  ├── GiftError    ──► 422 GIFT_REJECTED                 │
//! │                  ├── DbError      ──► 500 DATABASE_ERROR (logged)       │
//! │                  └── collaborator ──► 503 PRODUCT_UNAVAILABLE           │
//! │                                                                         │
//! │  Response body:                                                         │
//! │  { "code": "COUPON_REJECTED", "message": "Coupon SAVE10 ..." }          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use promo_core::{CartError, CoreError, CouponError, GiftError, ValidationError};
use promo_db::DbError;

/// Error returned from every handler.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    /// Machine-readable error code for programmatic handling
    pub code: ErrorCode,

    /// Human-readable error message for display
    pub message: String,
}

/// Error codes for API responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found (404)
    NotFound,

    /// Input validation failed (400)
    ValidationError,

    /// Operation not allowed in the cart's current state (409)
    InvalidOperation,

    /// Coupon could not be applied (422)
    CouponRejected,

    /// Gift selection rejected (422)
    GiftRejected,

    /// Catalog did not answer in time (503)
    ProductUnavailable,

    /// A collaborator needed to finish the request is down (503)
    ServiceUnavailable,

    /// Database operation failed (500)
    DatabaseError,

    /// Internal server error (500)
    Internal,
}

impl ErrorCode {
    pub fn status(self) -> StatusCode {
        match self {
            ErrorCode::NotFound => StatusCode::NOT_FOUND,
            ErrorCode::ValidationError => StatusCode::BAD_REQUEST,
            ErrorCode::InvalidOperation => StatusCode::CONFLICT,
            ErrorCode::CouponRejected | ErrorCode::GiftRejected => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ErrorCode::ProductUnavailable | ErrorCode::ServiceUnavailable => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            ErrorCode::DatabaseError | ErrorCode::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl ApiError {
    /// Creates a new API error.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    /// Creates a not found error.
    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(
            ErrorCode::NotFound,
            format!("{} not found: {}", resource, id),
        )
    }

    /// Creates a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    /// Creates an invalid operation error.
    pub fn invalid_operation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::InvalidOperation, message)
    }

    /// Creates a service unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ServiceUnavailable, message)
    }

    pub fn status(&self) -> StatusCode {
        self.code.status()
    }
}

/// Convenience alias for handler and service results.
pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

// =============================================================================
// Conversions
// =============================================================================

/// Converts database errors to API errors.
impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } => ApiError::new(
                ErrorCode::ValidationError,
                format!("{} '{}' already exists", field, value),
            ),
            DbError::ForeignKeyViolation { message } => {
                tracing::error!("Foreign key violation: {}", message);
                ApiError::new(ErrorCode::ValidationError, "Invalid reference")
            }
            DbError::ConnectionFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database connection failed")
            }
            DbError::MigrationFailed(_) => {
                ApiError::new(ErrorCode::DatabaseError, "Database migration failed")
            }
            DbError::PoolExhausted => {
                ApiError::new(ErrorCode::DatabaseError, "Database pool exhausted")
            }
            DbError::QueryFailed(e) | DbError::Serialization(e) | DbError::Internal(e) => {
                // Log the actual error but return a generic message
                tracing::error!("Database operation failed: {}", e);
                ApiError::new(ErrorCode::DatabaseError, "Database operation failed")
            }
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::ItemNotFound(id) => ApiError::not_found("Cart item", &id),
            CartError::InvalidOperation { .. } | CartError::CartTooLarge { .. } => {
                ApiError::invalid_operation(err.to_string())
            }
            CartError::QuantityTooLarge { .. } => ApiError::validation(err.to_string()),
            CartError::Validation(e) => e.into(),
        }
    }
}

impl From<CouponError> for ApiError {
    fn from(err: CouponError) -> Self {
        ApiError::new(ErrorCode::CouponRejected, err.to_string())
    }
}

impl From<GiftError> for ApiError {
    fn from(err: GiftError) -> Self {
        ApiError::new(ErrorCode::GiftRejected, err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Cart(e) => e.into(),
            CoreError::Coupon(e) => e.into(),
            CoreError::Gift(e) => e.into(),
            CoreError::Validation(e) => e.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use promo_core::Money;

    #[test]
    fn test_status_mapping() {
        let cases = [
            (ApiError::from(CartError::ItemNotFound("x".into())), StatusCode::NOT_FOUND),
            (
                ApiError::from(CartError::InvalidOperation {
                    item_id: "x".into(),
                    reason: "gift".into(),
                }),
                StatusCode::CONFLICT,
            ),
            (
                ApiError::from(CouponError::BelowMinimum {
                    code: "SAVE10".into(),
                    minimum: Money::major(1000),
                    subtotal: Money::major(900),
                }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::from(GiftError::LimitReached { max: 2 }),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                ApiError::from(DbError::QueryFailed("boom".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (ApiError::unavailable("down"), StatusCode::SERVICE_UNAVAILABLE),
        ];

        for (error, status) in cases {
            assert_eq!(error.status(), status, "{error}");
        }
    }

    #[test]
    fn test_serialized_shape() {
        let error = ApiError::from(CouponError::NotFound {
            code: "GHOST".into(),
        });
        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json["code"], "COUPON_REJECTED");
        assert_eq!(json["message"], "Coupon GHOST does not exist");
    }

    #[test]
    fn test_core_error_unwraps_to_specific_code() {
        let error = ApiError::from(CoreError::Gift(GiftError::OfferUnavailable));
        assert_eq!(error.code, ErrorCode::GiftRejected);

        let error = ApiError::from(CoreError::Validation(ValidationError::Required {
            field: "code".into(),
        }));
        assert_eq!(error.code, ErrorCode::ValidationError);
    }
}
