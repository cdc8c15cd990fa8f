//! # Validation Module
//!
//! Input validation for everything that reaches the engine from outside.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Storefront (TypeScript)                                      │
//! │  └── Basic format checks, immediate feedback                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: promo-api handlers                                           │
//! │  ├── JSON deserialization                                              │
//! │  └── THIS MODULE: cart ids, coupon codes, quantities, gift config      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: SQLite                                                       │
//! │  └── NOT NULL / CHECK / foreign key constraints                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use promo_core::validation::{validate_coupon_code, validate_quantity};
//!
//! assert_eq!(validate_coupon_code("  save10 ").unwrap(), "SAVE10");
//! assert!(validate_quantity(5).is_ok());
//! ```

use crate::error::ValidationError;
use crate::types::{CouponDefinition, DiscountKind, GiftPromotionConfig};
use crate::{MAX_CART_ITEMS, MAX_ITEM_QUANTITY, MAX_UNIT_PRICE_CENTS};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

const MAX_CART_ID_LEN: usize = 128;
const MAX_PRODUCT_REF_LEN: usize = 128;
const MAX_COUPON_CODE_LEN: usize = 50;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a caller-supplied cart id (session key or user id).
///
/// ## Rules
/// - Must not be empty
/// - At most 128 characters
/// - Letters, digits, `-`, `_`, `.` and `:` only
pub fn validate_cart_id(cart_id: &str) -> ValidationResult<()> {
    validate_identifier("cart_id", cart_id, MAX_CART_ID_LEN, &['-', '_', '.', ':'])
}

/// Validates a product reference (catalog id or slug).
///
/// ## Example
/// ```rust
/// use promo_core::validation::validate_product_ref;
///
/// assert!(validate_product_ref("tee-black").is_ok());
/// assert!(validate_product_ref("").is_err());
/// assert!(validate_product_ref("has space").is_err());
/// ```
pub fn validate_product_ref(product_ref: &str) -> ValidationResult<()> {
    validate_identifier("product_ref", product_ref, MAX_PRODUCT_REF_LEN, &['-', '_'])
}

fn validate_identifier(
    field: &str,
    value: &str,
    max: usize,
    extra: &[char],
) -> ValidationResult<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required {
            field: field.to_string(),
        });
    }

    if value.len() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || extra.contains(&c))
    {
        return Err(ValidationError::InvalidFormat {
            field: field.to_string(),
            reason: format!(
                "must contain only letters, numbers and {}",
                extra.iter().map(|c| format!("'{c}'")).collect::<Vec<_>>().join(" ")
            ),
        });
    }

    Ok(())
}

/// Validates and normalises a coupon code.
///
/// ## Returns
/// The trimmed, upper-cased code. Lookups always use this form, so
/// `save10`, ` SAVE10 ` and `Save10` name the same coupon.
pub fn validate_coupon_code(code: &str) -> ValidationResult<String> {
    let code = code.trim();

    if code.is_empty() {
        return Err(ValidationError::Required {
            field: "code".to_string(),
        });
    }

    if code.len() > MAX_COUPON_CODE_LEN {
        return Err(ValidationError::TooLong {
            field: "code".to_string(),
            max: MAX_COUPON_CODE_LEN,
        });
    }

    if !code
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ValidationError::InvalidFormat {
            field: "code".to_string(),
            reason: "must contain only letters, numbers, hyphens, and underscores".to_string(),
        });
    }

    Ok(code.to_ascii_uppercase())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity to add.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_ITEM_QUANTITY (999)
///
/// Quantity *updates* accept `<= 0` (meaning remove) and do not go
/// through this check.
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_ITEM_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_ITEM_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a price in minor units.
///
/// ## Example
/// ```rust
/// use promo_core::validation::validate_price_cents;
///
/// assert!(validate_price_cents(1099).is_ok());
/// assert!(validate_price_cents(0).is_ok());
/// assert!(validate_price_cents(-100).is_err());
/// assert!(validate_price_cents(i64::MAX).is_err());
/// ```
pub fn validate_price_cents(cents: i64) -> ValidationResult<()> {
    if !(0..=MAX_UNIT_PRICE_CENTS).contains(&cents) {
        return Err(ValidationError::OutOfRange {
            field: "price".to_string(),
            min: 0,
            max: MAX_UNIT_PRICE_CENTS,
        });
    }

    Ok(())
}

/// Validates a percentage discount in basis points (0..=10000).
pub fn validate_discount_rate_bps(bps: i64) -> ValidationResult<()> {
    if !(0..=10_000).contains(&bps) {
        return Err(ValidationError::OutOfRange {
            field: "discount_amount".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

// =============================================================================
// Collection Validators
// =============================================================================

/// Validates that one more line fits in the cart.
pub fn validate_cart_size(current_items: usize) -> ValidationResult<()> {
    if current_items >= MAX_CART_ITEMS {
        return Err(ValidationError::OutOfRange {
            field: "cart items".to_string(),
            min: 0,
            max: MAX_CART_ITEMS as i64,
        });
    }

    Ok(())
}

/// Validates an admin-supplied gift promotion.
///
/// ## Rules
/// - `min_cart_value` is non-negative
/// - `max_cart_value`, when set, is not below `min_cart_value`
/// - every gift product ref is a valid product ref
pub fn validate_gift_config(config: &GiftPromotionConfig) -> ValidationResult<()> {
    validate_price_cents(config.min_cart_value.cents()).map_err(|_| {
        ValidationError::MustBePositive {
            field: "min_cart_value".to_string(),
        }
    })?;

    if let Some(max) = config.max_cart_value {
        if max < config.min_cart_value {
            return Err(ValidationError::OutOfRange {
                field: "max_cart_value".to_string(),
                min: config.min_cart_value.cents(),
                max: i64::MAX,
            });
        }
    }

    for product_ref in &config.gift_products {
        validate_product_ref(product_ref)?;
    }

    Ok(())
}

/// Validates an admin-supplied coupon definition.
///
/// ## Rules
/// - percentage amounts are basis points in `0..=10000`
/// - fixed amounts and the minimum order value are non-negative
/// - the validity window does not end before it starts
/// - usage limits, when set, are at least 1
pub fn validate_coupon_definition(coupon: &CouponDefinition) -> ValidationResult<()> {
    match coupon.discount_type {
        DiscountKind::Percentage => validate_discount_rate_bps(coupon.discount_amount)?,
        DiscountKind::Fixed => validate_price_cents(coupon.discount_amount)?,
    }

    validate_price_cents(coupon.minimum_order_value.cents())?;

    if coupon.end_date < coupon.start_date {
        return Err(ValidationError::InvalidFormat {
            field: "end_date".to_string(),
            reason: "must not be before start_date".to_string(),
        });
    }

    for (field, limit) in [
        ("usage_limit", coupon.usage_limit),
        ("usage_limit_per_user", coupon.usage_limit_per_user),
    ] {
        if limit.is_some_and(|l| l < 1) {
            return Err(ValidationError::MustBePositive {
                field: field.to_string(),
            });
        }
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::money::Money;

    #[test]
    fn test_validate_cart_id() {
        assert!(validate_cart_id("session-1").is_ok());
        assert!(validate_cart_id("user:42").is_ok());
        assert!(validate_cart_id("").is_err());
        assert!(validate_cart_id("a/b").is_err());
        assert!(validate_cart_id(&"a".repeat(200)).is_err());
    }

    #[test]
    fn test_validate_coupon_code_normalises() {
        assert_eq!(validate_coupon_code(" save10 ").unwrap(), "SAVE10");
        assert_eq!(validate_coupon_code("Welcome_5").unwrap(), "WELCOME_5");
        assert!(validate_coupon_code("   ").is_err());
        assert!(validate_coupon_code("10% OFF").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_discount_rate_bps() {
        assert!(validate_discount_rate_bps(0).is_ok());
        assert!(validate_discount_rate_bps(10_000).is_ok());
        assert!(validate_discount_rate_bps(10_001).is_err());
        assert!(validate_discount_rate_bps(-1).is_err());
    }

    #[test]
    fn test_validate_gift_config() {
        let mut config = GiftPromotionConfig {
            active: true,
            min_cart_value: Money::from_cents(1000),
            max_cart_value: Some(Money::from_cents(5000)),
            max_selectable_gifts: 2,
            gift_products: vec!["mug".to_string(), "tote-bag".to_string()],
            title: "Pick a gift".to_string(),
            sub_title: String::new(),
        };
        assert!(validate_gift_config(&config).is_ok());

        config.max_cart_value = Some(Money::from_cents(500));
        assert!(validate_gift_config(&config).is_err());

        config.max_cart_value = None;
        config.gift_products.push("bad ref".to_string());
        assert!(validate_gift_config(&config).is_err());
    }

    #[test]
    fn test_validate_coupon_definition() {
        use chrono::{Duration, Utc};

        let now = Utc::now();
        let mut coupon = CouponDefinition {
            code: "SAVE10".to_string(),
            discount_type: DiscountKind::Percentage,
            discount_amount: 1000,
            minimum_order_value: Money::zero(),
            start_date: now,
            end_date: now + Duration::days(7),
            usage_limit: Some(10),
            usage_limit_per_user: None,
            is_active: true,
        };
        assert!(validate_coupon_definition(&coupon).is_ok());

        coupon.discount_amount = 12_000;
        assert!(validate_coupon_definition(&coupon).is_err());

        // 120.00 off is fine as a fixed amount
        coupon.discount_type = DiscountKind::Fixed;
        assert!(validate_coupon_definition(&coupon).is_ok());

        coupon.usage_limit = Some(0);
        assert!(validate_coupon_definition(&coupon).is_err());

        coupon.usage_limit = None;
        coupon.end_date = now - Duration::days(1);
        assert!(validate_coupon_definition(&coupon).is_err());
    }
}
