//! # Promotion Orchestrator
//!
//! Runs after every cart mutation and turns a cart plus the current
//! coupon and gift definitions into one consistent [`PromotionSnapshot`].
//!
//! ## Recompute Pipeline
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  recompute(session, coupon definition, gift config, now)                │
//! │                                                                         │
//! │  1. Gift consistency                                                    │
//! │     gift::evaluate(subtotal, config, dismissed, gift refs)              │
//! │       └── must_remove ──► Cart::remove_gifts() ──► GiftsRemoved notice  │
//! │                                                                         │
//! │  2. Coupon re-validation                                                │
//! │     coupon::evaluate(applied.code, definition, subtotal, now)           │
//! │       ├── Ok  ──► discount recomputed on the current subtotal           │
//! │       └── Err ──► coupon dropped ──────────────► CouponRemoved notice   │
//! │                                                                         │
//! │  3. Snapshot                                                            │
//! │     subtotal, discount, final_total = max(subtotal − discount, 0)       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Gifts are priced at zero, so step 1 never changes the subtotal step 2
//! sees. The order is still fixed so that results are deterministic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::{Cart, CartItem};
use crate::coupon::{self, AppliedCoupon};
use crate::error::{CoreResult, CouponError, GiftError};
use crate::gift::{self, GiftOfferView, GiftSelectionChange};
use crate::money::Money;
use crate::types::{CouponDefinition, CouponUsage, GiftPromotionConfig};

// =============================================================================
// Cart Session
// =============================================================================

/// Everything persisted per cart id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSession {
    pub cart: Cart,
    pub applied_coupon: Option<AppliedCoupon>,
    /// Cart revision at which the gift offer was dismissed.
    pub dismissed_at_revision: Option<i64>,
}

impl CartSession {
    pub fn new(cart_id: impl Into<String>) -> Self {
        CartSession {
            cart: Cart::new(cart_id),
            applied_coupon: None,
            dismissed_at_revision: None,
        }
    }

    pub fn restore(
        cart: Cart,
        applied_coupon: Option<AppliedCoupon>,
        dismissed_at_revision: Option<i64>,
    ) -> Self {
        CartSession {
            cart,
            applied_coupon,
            dismissed_at_revision,
        }
    }

    /// Replaces any previously applied coupon.
    pub fn set_coupon(&mut self, applied: AppliedCoupon) -> Option<AppliedCoupon> {
        self.applied_coupon.replace(applied)
    }

    /// Drops the applied coupon. Always succeeds.
    pub fn remove_coupon(&mut self) -> Option<AppliedCoupon> {
        self.applied_coupon.take()
    }

    /// Hides the gift offer until the cart changes.
    pub fn dismiss_gift_offer(&mut self) {
        self.dismissed_at_revision = Some(self.cart.revision());
    }

    /// True only while the cart is still at the dismissed revision.
    pub fn is_gift_offer_dismissed(&self) -> bool {
        self.dismissed_at_revision == Some(self.cart.revision())
    }
}

// =============================================================================
// Snapshot
// =============================================================================

/// A change the orchestrator made on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PromotionNotice {
    GiftsRemoved {
        #[serde(rename = "productRefs")]
        product_refs: Vec<String>,
    },
    CouponRemoved { code: String, reason: String },
}

/// The storefront's complete view of a cart after a recompute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PromotionSnapshot {
    pub cart_id: String,
    pub revision: i64,
    pub items: Vec<CartItem>,
    pub item_count: i64,
    pub subtotal: Money,
    pub applied_coupon: Option<AppliedCoupon>,
    pub discount: Money,
    pub gift: GiftOfferView,
    pub final_total: Money,
    pub notices: Vec<PromotionNotice>,
}

// =============================================================================
// Operations
// =============================================================================

/// Brings the session back to a consistent state and describes it.
///
/// `coupon_definition` is the directory's current definition for the
/// applied coupon (`None` if there is none or the lookup failed).
/// `gift_config` is `None` when the promotion is missing or unavailable.
pub fn recompute(
    session: &mut CartSession,
    coupon_definition: Option<&CouponDefinition>,
    gift_config: Option<&GiftPromotionConfig>,
    now: DateTime<Utc>,
) -> PromotionSnapshot {
    let mut notices = Vec::new();
    let was_dismissed = session.is_gift_offer_dismissed();

    // 1. Gift consistency
    let subtotal = session.cart.subtotal();
    let evaluation = gift::evaluate(
        subtotal,
        gift_config,
        was_dismissed,
        &session.cart.gift_refs(),
    );
    if !evaluation.must_remove.is_empty() {
        let removed = session.cart.remove_gifts(&evaluation.must_remove);
        if !removed.is_empty() {
            notices.push(PromotionNotice::GiftsRemoved {
                product_refs: removed,
            });
        }
        // Forced removals are not shopper actions; keep the dismissal.
        if was_dismissed {
            session.dismiss_gift_offer();
        }
    }

    // 2. Coupon re-validation
    let subtotal = session.cart.subtotal();
    if let Some(applied) = session.applied_coupon.take() {
        match coupon::evaluate(&applied.code, coupon_definition, subtotal, now) {
            Ok(revalidated) => session.applied_coupon = Some(revalidated),
            Err(reason) => {
                notices.push(PromotionNotice::CouponRemoved {
                    code: applied.code,
                    reason: reason.to_string(),
                });
            }
        }
    }

    // 3. Snapshot
    let discount = session
        .applied_coupon
        .as_ref()
        .map(|c| c.discount_value)
        .unwrap_or_default();
    let selected = session.cart.gift_refs();

    PromotionSnapshot {
        cart_id: session.cart.id().to_string(),
        revision: session.cart.revision(),
        items: session.cart.items().to_vec(),
        item_count: session.cart.item_count(),
        subtotal,
        applied_coupon: session.applied_coupon.clone(),
        discount,
        gift: GiftOfferView::build(evaluation.state, gift_config, selected, subtotal),
        final_total: coupon::final_total(subtotal, session.applied_coupon.as_ref()),
        notices,
    }
}

/// Validates a coupon against the session's cart and applies it.
///
/// On error the session is left untouched, including any coupon that was
/// already applied.
pub fn apply_coupon(
    session: &mut CartSession,
    code: &str,
    definition: Option<&CouponDefinition>,
    usage: &CouponUsage,
    now: DateTime<Utc>,
) -> Result<AppliedCoupon, CouponError> {
    let applied = coupon::evaluate(code, definition, session.cart.subtotal(), now)?;
    coupon::check_usage(&applied.source_definition, usage)?;
    session.set_coupon(applied.clone());
    Ok(applied)
}

/// Selects or deselects a gift for the session's cart.
///
/// ## Errors
/// - `OfferUnavailable` when there is no usable config or the cart does
///   not qualify
/// - whatever [`gift::select_gift`] rejects
pub fn toggle_gift(
    session: &mut CartSession,
    product_ref: &str,
    display_name: Option<String>,
    config: Option<&GiftPromotionConfig>,
) -> CoreResult<GiftSelectionChange> {
    let config = config
        .filter(|c| gift::qualifies(session.cart.subtotal(), Some(*c)))
        .ok_or(GiftError::OfferUnavailable)?;

    let change = gift::select_gift(product_ref, &session.cart.gift_refs(), config)?;
    match &change {
        GiftSelectionChange::Selected(product_ref) => {
            session.cart.add_gift(product_ref, display_name)?;
        }
        GiftSelectionChange::Deselected(product_ref) => {
            session.cart.remove_gifts(std::slice::from_ref(product_ref));
        }
    }
    Ok(change)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;
    use crate::gift::GiftOfferState;
    use crate::types::DiscountKind;
    use chrono::Duration;

    fn gift_config(min: i64, max_selectable: u32) -> GiftPromotionConfig {
        GiftPromotionConfig {
            active: true,
            min_cart_value: Money::from_cents(min),
            max_cart_value: None,
            max_selectable_gifts: max_selectable,
            gift_products: vec!["mug".to_string(), "tote".to_string(), "socks".to_string()],
            title: "Free gift".to_string(),
            sub_title: String::new(),
        }
    }

    fn coupon_def(kind: DiscountKind, amount: i64, minimum: i64) -> CouponDefinition {
        let now = Utc::now();
        CouponDefinition {
            code: "SAVE".to_string(),
            discount_type: kind,
            discount_amount: amount,
            minimum_order_value: Money::from_cents(minimum),
            start_date: now - Duration::days(1),
            end_date: now + Duration::days(1),
            usage_limit: Some(100),
            usage_limit_per_user: Some(1),
            is_active: true,
        }
    }

    #[test]
    fn test_gifts_removed_when_subtotal_drops() {
        let cfg = gift_config(1000, 2);
        let mut session = CartSession::new("c1");
        session.cart.add_quantity("a", Money::from_cents(400), 2).unwrap();
        let b = session.cart.add_item("b", Money::from_cents(400), false).unwrap();

        toggle_gift(&mut session, "mug", None, Some(&cfg)).unwrap();
        toggle_gift(&mut session, "tote", None, Some(&cfg)).unwrap();
        let snap = recompute(&mut session, None, Some(&cfg), Utc::now());
        assert_eq!(snap.subtotal, Money::from_cents(1200));
        assert_eq!(snap.gift.selected.len(), 2);

        session.cart.remove_item(&b.id);
        let snap = recompute(&mut session, None, Some(&cfg), Utc::now());

        assert_eq!(snap.subtotal, Money::from_cents(800));
        assert!(snap.gift.selected.is_empty());
        assert!(session.cart.gift_refs().is_empty());
        assert_eq!(snap.gift.state, GiftOfferState::Ineligible);
        assert_eq!(
            snap.notices,
            vec![PromotionNotice::GiftsRemoved {
                product_refs: vec!["mug".to_string(), "tote".to_string()]
            }]
        );
    }

    #[test]
    fn test_gift_cap_leaves_selection_unchanged() {
        let cfg = gift_config(0, 2);
        let mut session = CartSession::new("c1");
        session.cart.add_item("a", Money::from_cents(100), false).unwrap();
        toggle_gift(&mut session, "mug", None, Some(&cfg)).unwrap();
        toggle_gift(&mut session, "tote", None, Some(&cfg)).unwrap();

        let err = toggle_gift(&mut session, "socks", None, Some(&cfg)).unwrap_err();
        assert_eq!(err, CoreError::Gift(GiftError::LimitReached { max: 2 }));
        assert_eq!(session.cart.gift_refs(), vec!["mug", "tote"]);
    }

    #[test]
    fn test_toggle_deselects() {
        let cfg = gift_config(0, 1);
        let mut session = CartSession::new("c1");
        session.cart.add_item("a", Money::from_cents(100), false).unwrap();

        toggle_gift(&mut session, "mug", Some("Mug".to_string()), Some(&cfg)).unwrap();
        assert_eq!(session.cart.items()[1].name.as_deref(), Some("Mug"));

        let change = toggle_gift(&mut session, "mug", None, Some(&cfg)).unwrap();
        assert_eq!(change, GiftSelectionChange::Deselected("mug".to_string()));
        assert!(session.cart.gift_refs().is_empty());
    }

    #[test]
    fn test_toggle_requires_qualifying_cart() {
        let cfg = gift_config(1000, 1);
        let mut session = CartSession::new("c1");
        session.cart.add_item("a", Money::from_cents(500), false).unwrap();

        assert_eq!(
            toggle_gift(&mut session, "mug", None, Some(&cfg)).unwrap_err(),
            CoreError::Gift(GiftError::OfferUnavailable)
        );
        assert_eq!(
            toggle_gift(&mut session, "mug", None, None).unwrap_err(),
            CoreError::Gift(GiftError::OfferUnavailable)
        );
    }

    #[test]
    fn test_coupon_removed_below_minimum() {
        let def = coupon_def(DiscountKind::Fixed, 100, 1000);
        let mut session = CartSession::new("c1");
        session.cart.add_quantity("a", Money::from_cents(300), 4).unwrap();
        assert_eq!(session.cart.subtotal(), Money::from_cents(1200));

        apply_coupon(&mut session, "save", Some(&def), &CouponUsage::default(), Utc::now()).unwrap();
        let snap = recompute(&mut session, Some(&def), None, Utc::now());
        assert_eq!(snap.discount, Money::from_cents(100));

        let a = session.cart.items()[0].id.clone();
        session.cart.update_quantity(&a, 3).unwrap();
        let snap = recompute(&mut session, Some(&def), None, Utc::now());

        assert_eq!(snap.subtotal, Money::from_cents(900));
        assert!(snap.applied_coupon.is_none());
        assert_eq!(snap.discount, Money::zero());
        assert_eq!(snap.final_total, Money::from_cents(900));
        assert!(matches!(
            &snap.notices[..],
            [PromotionNotice::CouponRemoved { code, .. }] if code == "SAVE"
        ));
    }

    #[test]
    fn test_coupon_discount_tracks_subtotal() {
        let def = coupon_def(DiscountKind::Percentage, 1000, 0);
        let mut session = CartSession::new("c1");
        let a = session.cart.add_item("a", Money::major(1000), false).unwrap();
        apply_coupon(&mut session, "SAVE", Some(&def), &CouponUsage::default(), Utc::now()).unwrap();

        session.cart.update_quantity(&a.id, 2).unwrap();
        let snap = recompute(&mut session, Some(&def), None, Utc::now());
        assert_eq!(snap.discount, Money::major(200));
        assert_eq!(snap.final_total, Money::major(1800));
    }

    #[test]
    fn test_coupon_removed_when_lookup_missing() {
        let def = coupon_def(DiscountKind::Fixed, 100, 0);
        let mut session = CartSession::new("c1");
        session.cart.add_item("a", Money::major(10), false).unwrap();
        apply_coupon(&mut session, "SAVE", Some(&def), &CouponUsage::default(), Utc::now()).unwrap();

        let snap = recompute(&mut session, None, None, Utc::now());
        assert!(snap.applied_coupon.is_none());
        assert_eq!(snap.notices.len(), 1);
    }

    #[test]
    fn test_failed_apply_keeps_previous_coupon() {
        let good = coupon_def(DiscountKind::Fixed, 100, 0);
        let mut session = CartSession::new("c1");
        session.cart.add_item("a", Money::major(10), false).unwrap();
        apply_coupon(&mut session, "SAVE", Some(&good), &CouponUsage::default(), Utc::now()).unwrap();

        let err = apply_coupon(&mut session, "OTHER", None, &CouponUsage::default(), Utc::now());
        assert!(matches!(err, Err(CouponError::NotFound { .. })));
        assert_eq!(session.applied_coupon.as_ref().map(|c| c.code.as_str()), Some("SAVE"));

        let used = CouponUsage { total_uses: 0, user_uses: 1 };
        let err = apply_coupon(&mut session, "SAVE", Some(&good), &used, Utc::now());
        assert!(matches!(err, Err(CouponError::UsageLimitExceeded { .. })));
    }

    #[test]
    fn test_new_coupon_replaces_old() {
        let first = coupon_def(DiscountKind::Fixed, 100, 0);
        let mut second = coupon_def(DiscountKind::Fixed, 200, 0);
        second.code = "MORE".to_string();

        let mut session = CartSession::new("c1");
        session.cart.add_item("a", Money::major(10), false).unwrap();
        apply_coupon(&mut session, "SAVE", Some(&first), &CouponUsage::default(), Utc::now()).unwrap();
        apply_coupon(&mut session, "MORE", Some(&second), &CouponUsage::default(), Utc::now()).unwrap();

        let snap = recompute(&mut session, Some(&second), None, Utc::now());
        assert_eq!(snap.applied_coupon.map(|c| c.code), Some("MORE".to_string()));
        assert_eq!(snap.discount, Money::from_cents(200));
    }

    #[test]
    fn test_scenario_eligibility_after_second_add() {
        let cfg = gift_config(1000, 1);
        let mut session = CartSession::new("c1");

        session.cart.add_item("a", Money::from_cents(500), false).unwrap();
        let snap = recompute(&mut session, None, Some(&cfg), Utc::now());
        assert_eq!(snap.gift.state, GiftOfferState::Ineligible);

        session.cart.add_item("a", Money::from_cents(500), false).unwrap();
        let snap = recompute(&mut session, None, Some(&cfg), Utc::now());
        assert_eq!(snap.items[0].quantity, 2);
        assert_eq!(snap.subtotal, Money::from_cents(1000));
        assert_eq!(snap.gift.state, GiftOfferState::Eligible);
    }

    #[test]
    fn test_dismissal_cleared_by_next_mutation() {
        let cfg = gift_config(0, 1);
        let mut session = CartSession::new("c1");
        session.cart.add_item("a", Money::from_cents(500), false).unwrap();

        session.dismiss_gift_offer();
        let snap = recompute(&mut session, None, Some(&cfg), Utc::now());
        assert_eq!(snap.gift.state, GiftOfferState::Dismissed);

        session.cart.add_item("b", Money::from_cents(500), false).unwrap();
        let snap = recompute(&mut session, None, Some(&cfg), Utc::now());
        assert_eq!(snap.gift.state, GiftOfferState::Eligible);
    }

    #[test]
    fn test_forced_gift_removal_keeps_dismissal() {
        let mut cfg = gift_config(0, 2);
        let mut session = CartSession::new("c1");
        session.cart.add_item("a", Money::from_cents(500), false).unwrap();
        toggle_gift(&mut session, "mug", None, Some(&cfg)).unwrap();
        session.dismiss_gift_offer();

        cfg.gift_products.retain(|p| p != "mug");
        let snap = recompute(&mut session, None, Some(&cfg), Utc::now());
        assert_eq!(snap.gift.state, GiftOfferState::Dismissed);
        assert!(session.is_gift_offer_dismissed());
    }

    #[test]
    fn test_removed_gifts_are_not_readded() {
        let cfg = gift_config(1000, 1);
        let mut session = CartSession::new("c1");
        let a = session.cart.add_quantity("a", Money::from_cents(500), 2).unwrap();
        toggle_gift(&mut session, "mug", None, Some(&cfg)).unwrap();

        session.cart.update_quantity(&a.id, 1).unwrap();
        recompute(&mut session, None, Some(&cfg), Utc::now());
        session.cart.update_quantity(&a.id, 2).unwrap();
        let snap = recompute(&mut session, None, Some(&cfg), Utc::now());

        assert_eq!(snap.gift.state, GiftOfferState::Eligible);
        assert!(snap.gift.selected.is_empty());
    }

    #[test]
    fn test_snapshot_serializes_camel_case() {
        let mut session = CartSession::new("c1");
        session.cart.add_item("a", Money::from_cents(500), false).unwrap();
        let snap = recompute(&mut session, None, None, Utc::now());
        let json = serde_json::to_value(&snap).unwrap();

        assert_eq!(json["cartId"], "c1");
        assert_eq!(json["finalTotal"], 500);
        assert_eq!(json["gift"]["state"], "ineligible");
    }
}
