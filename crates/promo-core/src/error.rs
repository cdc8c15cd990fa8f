//! # Error Types
//!
//! Domain-specific error types for promo-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  promo-core errors (this file)                                         │
//! │  ├── CartError        - Cart Store rule violations                     │
//! │  ├── CouponError      - Coupon rejected (user-correctable)             │
//! │  ├── GiftError        - Gift selection rejected (user-correctable)     │
//! │  ├── ValidationError  - Input validation failures                      │
//! │  └── CoreError        - Umbrella over all of the above                 │
//! │                                                                         │
//! │  promo-db errors (separate crate)                                      │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  promo-api errors (in app)                                             │
//! │  └── ApiError         - What the storefront sees (serialized)          │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → ApiError → Storefront             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! None of these errors is fatal. Every rejection leaves the cart exactly as
//! it was before the call.

use thiserror::Error;

use crate::money::Money;

// =============================================================================
// Cart Error
// =============================================================================

/// Errors raised by the Cart Store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CartError {
    /// The operation is not allowed on this item.
    ///
    /// ## When This Occurs
    /// - Changing the quantity of a gift line (gifts are always quantity 1)
    #[error("Invalid operation on item {item_id}: {reason}")]
    InvalidOperation { item_id: String, reason: String },

    /// No line with this id exists in the cart.
    #[error("Cart item not found: {0}")]
    ItemNotFound(String),

    /// Cart has reached the maximum number of distinct lines.
    #[error("Cart cannot have more than {max} items")]
    CartTooLarge { max: usize },

    /// Line quantity would exceed the maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Coupon Error
// =============================================================================

/// Reasons a coupon cannot be applied (or stays applied).
///
/// ## User Workflow
/// ```text
/// Coupon form: "SAVE10"
///      │
///      ▼
/// evaluate() ──► NotFound / Inactive / Expired / BelowMinimum
///      │                         │
///      │                         ▼
///      │              UI shows reason, cart untouched
///      ▼
/// usage tracker ──► UsageLimitExceeded
///      │
///      ▼
/// AppliedCoupon replaces any previous coupon
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponError {
    #[error("Coupon {code} does not exist")]
    NotFound { code: String },

    #[error("Coupon {code} is no longer active")]
    Inactive { code: String },

    #[error("Coupon {code} is not valid at this time")]
    Expired { code: String },

    #[error("Coupon {code} requires a minimum order of {minimum} (cart subtotal is {subtotal})")]
    BelowMinimum {
        code: String,
        minimum: Money,
        subtotal: Money,
    },

    #[error("Coupon {code} has reached its usage limit")]
    UsageLimitExceeded { code: String },
}

impl CouponError {
    /// The coupon code the rejection refers to.
    pub fn code(&self) -> &str {
        match self {
            CouponError::NotFound { code }
            | CouponError::Inactive { code }
            | CouponError::Expired { code }
            | CouponError::BelowMinimum { code, .. }
            | CouponError::UsageLimitExceeded { code } => code,
        }
    }
}

// =============================================================================
// Gift Error
// =============================================================================

/// Reasons a gift selection is rejected. No cart mutation happens on error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GiftError {
    /// Selection is full; the user must deselect another gift first.
    #[error("You can select at most {max} gift(s); deselect another gift first")]
    LimitReached { max: u32 },

    /// The product is not one of the configured gift candidates.
    #[error("Product {0} is not available as a gift")]
    NotAGiftProduct(String),

    /// The gift offer is not currently active for this cart.
    #[error("The gift offer is not available for this cart")]
    OfferUnavailable,
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid coupon code).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Core Error
// =============================================================================

/// Umbrella over every error the core can return.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    #[error(transparent)]
    Cart(#[from] CartError),

    #[error(transparent)]
    Coupon(#[from] CouponError),

    #[error(transparent)]
    Gift(#[from] GiftError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

/// Convenience type alias for Cart Store results.
pub type CartResult<T> = Result<T, CartError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coupon_error_messages() {
        let err = CouponError::BelowMinimum {
            code: "SAVE10".to_string(),
            minimum: Money::from_cents(100_000),
            subtotal: Money::from_cents(90_000),
        };
        assert_eq!(
            err.to_string(),
            "Coupon SAVE10 requires a minimum order of 1000.00 (cart subtotal is 900.00)"
        );
        assert_eq!(err.code(), "SAVE10");
    }

    #[test]
    fn test_gift_limit_message() {
        let err = GiftError::LimitReached { max: 2 };
        assert_eq!(
            err.to_string(),
            "You can select at most 2 gift(s); deselect another gift first"
        );
    }

    #[test]
    fn test_validation_converts_to_cart_error() {
        let validation_err = ValidationError::Required {
            field: "product_ref".to_string(),
        };
        let cart_err: CartError = validation_err.into();
        assert!(matches!(cart_err, CartError::Validation(_)));
    }

    #[test]
    fn test_core_error_is_transparent() {
        let err: CoreError = GiftError::OfferUnavailable.into();
        assert_eq!(err.to_string(), "The gift offer is not available for this cart");
    }
}
