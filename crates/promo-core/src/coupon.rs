//! # Coupon Evaluator
//!
//! Decides whether a coupon applies to a cart and what it is worth.
//! Every function here is pure: same inputs, same answer.
//!
//! ## Evaluation Order
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  evaluate(code, definition, subtotal, now)                              │
//! │                                                                         │
//! │  definition missing? ───────────────► NotFound                          │
//! │       │                                                                 │
//! │  !is_active? ───────────────────────► Inactive                          │
//! │       │                                                                 │
//! │  now ∉ [start_date, end_date]? ─────► Expired                           │
//! │       │                                                                 │
//! │  subtotal < minimum_order_value? ───► BelowMinimum                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  AppliedCoupon { discount = min(raw discount, subtotal) }               │
//! │                                                                         │
//! │  Usage limits are counted elsewhere and checked with check_usage().     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::CouponError;
use crate::money::Money;
use crate::types::{CouponDefinition, CouponUsage, DiscountKind, DiscountRate};

// =============================================================================
// Applied Coupon
// =============================================================================

/// The single coupon active on a cart.
///
/// `discount_value` is always `<= subtotal` at the time it was computed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AppliedCoupon {
    pub code: String,
    pub discount_value: Money,
    /// Copy of the definition the discount was computed from.
    pub source_definition: CouponDefinition,
}

// =============================================================================
// Evaluation
// =============================================================================

/// Canonical form of a user-typed code: trimmed, upper-case.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Checks a coupon against the cart and prices it.
///
/// `definition` is whatever the coupon directory returned for `code`;
/// `None` covers both "no such coupon" and "lookup failed".
pub fn evaluate(
    code: &str,
    definition: Option<&CouponDefinition>,
    subtotal: Money,
    now: DateTime<Utc>,
) -> Result<AppliedCoupon, CouponError> {
    let code = normalize_code(code);

    let Some(definition) = definition else {
        return Err(CouponError::NotFound { code });
    };

    if !definition.is_active {
        return Err(CouponError::Inactive { code });
    }

    if !definition.is_within_window(now) {
        return Err(CouponError::Expired { code });
    }

    if subtotal < definition.minimum_order_value {
        return Err(CouponError::BelowMinimum {
            code,
            minimum: definition.minimum_order_value,
            subtotal,
        });
    }

    Ok(AppliedCoupon {
        code,
        discount_value: discount_for(definition, subtotal),
        source_definition: definition.clone(),
    })
}

/// The discount a definition grants on `subtotal`, capped at `subtotal`.
///
/// ## Example
/// ```rust
/// use chrono::Utc;
/// use promo_core::coupon::discount_for;
/// use promo_core::money::Money;
/// use promo_core::types::{CouponDefinition, DiscountKind};
///
/// let def = CouponDefinition {
///     code: "FLAT500".to_string(),
///     discount_type: DiscountKind::Fixed,
///     discount_amount: 500,
///     minimum_order_value: Money::zero(),
///     start_date: Utc::now(),
///     end_date: Utc::now(),
///     usage_limit: None,
///     usage_limit_per_user: None,
///     is_active: true,
/// };
/// assert_eq!(discount_for(&def, Money::from_cents(300)).cents(), 300);
/// ```
pub fn discount_for(definition: &CouponDefinition, subtotal: Money) -> Money {
    let subtotal = subtotal.non_negative();
    let raw = match definition.discount_type {
        DiscountKind::Fixed => definition.fixed_amount().unwrap_or_default(),
        DiscountKind::Percentage => {
            subtotal.percentage_of(definition.rate().unwrap_or(DiscountRate::zero()))
        }
    };
    raw.min(subtotal)
}

/// Compares redemption counters against the definition's limits.
pub fn check_usage(definition: &CouponDefinition, usage: &CouponUsage) -> Result<(), CouponError> {
    let over_total = definition
        .usage_limit
        .is_some_and(|limit| usage.total_uses >= limit);
    let over_user = definition
        .usage_limit_per_user
        .is_some_and(|limit| usage.user_uses >= limit);

    if over_total || over_user {
        return Err(CouponError::UsageLimitExceeded {
            code: definition.code.clone(),
        });
    }

    Ok(())
}

/// `max(subtotal − discount, 0)`.
pub fn final_total(subtotal: Money, applied: Option<&AppliedCoupon>) -> Money {
    let discount = applied.map(|c| c.discount_value).unwrap_or_default();
    (subtotal - discount).non_negative()
}

// =============================================================================
// Unit Tests
// =============================================================================
