//! # Domain Types
//!
//! Definitions the engine reads but never owns: coupons, the gift promotion
//! and catalog products. They arrive from the API layer as plain values.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         External Definitions                            │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌───────────────────┐   ┌──────────────────┐   │
//! │  │ CouponDefinition │   │GiftPromotionConfig│   │  ProductSummary  │   │
//! │  │  ──────────────  │   │  ───────────────  │   │  ──────────────  │   │
//! │  │  code            │   │  active           │   │  id / slug       │   │
//! │  │  discount_type   │   │  min/max value    │   │  name            │   │
//! │  │  discount_amount │   │  max_selectable   │   │  price           │   │
//! │  │  window, limits  │   │  gift_products    │   │  images          │   │
//! │  └──────────────────┘   └───────────────────┘   └──────────────────┘   │
//! │                                                                         │
//! │  ┌──────────────────┐   ┌───────────────────┐                          │
//! │  │   DiscountRate   │   │   DiscountKind    │                          │
//! │  │  bps (u32)       │   │   Percentage      │                          │
//! │  │  1000 = 10%      │   │   Fixed           │                          │
//! │  └──────────────────┘   └───────────────────┘                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Discount Rate
// =============================================================================

/// Percentage discount represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1000 bps = 10%, 1250 bps = 12.5%
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct DiscountRate(u32);

impl DiscountRate {
    /// Creates a rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        DiscountRate(bps)
    }

    /// Creates a rate from whole percent (10 → 10%).
    #[inline]
    pub const fn from_percent(pct: u32) -> Self {
        DiscountRate(pct * 100)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn zero() -> Self {
        DiscountRate(0)
    }

    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl Default for DiscountRate {
    fn default() -> Self {
        DiscountRate::zero()
    }
}

// =============================================================================
// Discount Kind
// =============================================================================

/// How a coupon's `discount_amount` is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
    /// `discount_amount` is basis points of the subtotal.
    Percentage,
    /// `discount_amount` is a flat amount in minor units.
    Fixed,
}

impl DiscountKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountKind::Percentage => "percentage",
            DiscountKind::Fixed => "fixed",
        }
    }
}

// =============================================================================
// Coupon Definition
// =============================================================================

/// A coupon as stored by the coupon directory.
///
/// ## Applicability
/// A coupon applies only if it is active, `now` falls inside
/// `[start_date, end_date]` and the subtotal reaches `minimum_order_value`.
/// Usage limits are checked separately against [`CouponUsage`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CouponDefinition {
    /// Canonical (upper-case) coupon code.
    pub code: String,

    pub discount_type: DiscountKind,

    /// Basis points for percentage coupons, minor units for fixed ones.
    pub discount_amount: i64,

    pub minimum_order_value: Money,

    #[ts(as = "String")]
    pub start_date: DateTime<Utc>,

    #[ts(as = "String")]
    pub end_date: DateTime<Utc>,

    /// Total redemptions allowed across all users (None = unlimited).
    pub usage_limit: Option<i64>,

    /// Redemptions allowed per user (None = unlimited).
    pub usage_limit_per_user: Option<i64>,

    pub is_active: bool,
}

impl CouponDefinition {
    /// True when `now` falls inside the validity window (inclusive).
    pub fn is_within_window(&self, now: DateTime<Utc>) -> bool {
        now >= self.start_date && now <= self.end_date
    }

    /// The percentage rate for percentage coupons.
    pub fn rate(&self) -> Option<DiscountRate> {
        match self.discount_type {
            DiscountKind::Percentage => {
                Some(DiscountRate::from_bps(self.discount_amount.clamp(0, 10_000) as u32))
            }
            DiscountKind::Fixed => None,
        }
    }

    /// The flat amount for fixed coupons.
    pub fn fixed_amount(&self) -> Option<Money> {
        match self.discount_type {
            DiscountKind::Fixed => Some(Money::from_cents(self.discount_amount.max(0))),
            DiscountKind::Percentage => None,
        }
    }
}

// =============================================================================
// Coupon Usage
// =============================================================================

/// Redemption counters reported by the usage tracker.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CouponUsage {
    /// Redemptions by everyone.
    pub total_uses: i64,
    /// Redemptions by the requesting user (0 for anonymous carts).
    pub user_uses: i64,
}

// =============================================================================
// Gift Promotion Config
// =============================================================================

/// The single storefront-wide "free gift" offer.
///
/// ## Qualifying Range
/// ```text
///   subtotal:  0 ────── min_cart_value ══════════ max_cart_value ────── ∞
///                             │  gift offer shown  │
///                             └────────────────────┘
///   max_cart_value = None  ⇒ the range is unbounded above
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GiftPromotionConfig {
    pub active: bool,
    pub min_cart_value: Money,
    pub max_cart_value: Option<Money>,
    pub max_selectable_gifts: u32,
    /// Product refs offered as gifts.
    pub gift_products: Vec<String>,
    pub title: String,
    pub sub_title: String,
}

impl GiftPromotionConfig {
    /// True when `subtotal` lies inside `[min_cart_value, max_cart_value]`.
    pub fn contains_value(&self, subtotal: Money) -> bool {
        if subtotal < self.min_cart_value {
            return false;
        }
        match self.max_cart_value {
            Some(max) => subtotal <= max,
            None => true,
        }
    }

    pub fn is_candidate(&self, product_ref: &str) -> bool {
        self.gift_products.iter().any(|p| p == product_ref)
    }
}

// =============================================================================
// Product Summary
// =============================================================================

/// The catalog's view of a product, as much as the cart needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: String,
    pub slug: String,
    pub name: String,
    pub price: Money,
    pub image_url: Option<String>,
    pub images: Vec<String>,
    pub is_active: bool,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn coupon(kind: DiscountKind, amount: i64) -> CouponDefinition {
        let now = Utc::now();
        CouponDefinition {
            code: "SAVE10".to_string(),
            discount_type: kind,
            discount_amount: amount,
            minimum_order_value: Money::zero(),
            start_date: now - Duration::days(1),
            end_date: now + Duration::days(1),
            usage_limit: None,
            usage_limit_per_user: None,
            is_active: true,
        }
    }

    #[test]
    fn test_discount_rate() {
        let rate = DiscountRate::from_percent(10);
        assert_eq!(rate.bps(), 1000);
        assert!(DiscountRate::default().is_zero());
    }

    #[test]
    fn test_coupon_amount_accessors() {
        let pct = coupon(DiscountKind::Percentage, 1250);
        assert_eq!(pct.rate(), Some(DiscountRate::from_bps(1250)));
        assert_eq!(pct.fixed_amount(), None);

        let fixed = coupon(DiscountKind::Fixed, 500);
        assert_eq!(fixed.fixed_amount(), Some(Money::from_cents(500)));
        assert_eq!(fixed.rate(), None);
    }

    #[test]
    fn test_coupon_window_is_inclusive() {
        let def = coupon(DiscountKind::Fixed, 500);
        assert!(def.is_within_window(def.start_date));
        assert!(def.is_within_window(def.end_date));
        assert!(!def.is_within_window(def.end_date + Duration::seconds(1)));
    }

    #[test]
    fn test_gift_range() {
        let mut config = GiftPromotionConfig {
            active: true,
            min_cart_value: Money::from_cents(1000),
            max_cart_value: None,
            max_selectable_gifts: 1,
            gift_products: vec!["mug".to_string()],
            title: "Free gift".to_string(),
            sub_title: String::new(),
        };
        assert!(!config.contains_value(Money::from_cents(999)));
        assert!(config.contains_value(Money::from_cents(1000)));
        assert!(config.contains_value(Money::from_cents(1_000_000)));

        config.max_cart_value = Some(Money::from_cents(5000));
        assert!(config.contains_value(Money::from_cents(5000)));
        assert!(!config.contains_value(Money::from_cents(5001)));
        assert!(config.is_candidate("mug"));
        assert!(!config.is_candidate("tee"));
    }

    #[test]
    fn test_discount_kind_wire_format() {
        let json = serde_json::to_string(&DiscountKind::Percentage).unwrap();
        assert_eq!(json, "\"percentage\"");
    }
}
