//! # Gift Eligibility Engine
//!
//! Decides whether the "free gift" offer is open for a cart and which gift
//! lines have to go. It never touches the cart itself; the orchestrator
//! applies `must_remove` through the Cart Store.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │               subtotal enters range                                     │
//! │   ┌────────────┐ ─────────────────────► ┌────────────┐                  │
//! │   │ Ineligible │                        │  Eligible  │                  │
//! │   └────────────┘ ◄───────────────────── └────────────┘                  │
//! │         ▲        subtotal leaves range        │   ▲                     │
//! │         │        (ALL gift lines removed)     │   │ next cart mutation  │
//! │         │                           dismiss() │   │ (revision changes)  │
//! │         │                                     ▼   │                     │
//! │         │     subtotal leaves range     ┌────────────┐                  │
//! │         └────────────────────────────── │ Dismissed  │                  │
//! │                                         └────────────┘                  │
//! │                                                                         │
//! │  Missing or failed config lookup is treated as Ineligible.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Gifts removed because the cart fell out of range are not re-added when it
//! qualifies again. The shopper has to pick them again.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::GiftError;
use crate::money::Money;
use crate::types::GiftPromotionConfig;

// =============================================================================
// Offer State
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "lowercase")]
pub enum GiftOfferState {
    /// Conditions not met (or no usable config). Offer hidden.
    #[default]
    Ineligible,
    /// Conditions met. Offer shown and selectable.
    Eligible,
    /// Conditions met but the shopper closed the offer for this cart state.
    Dismissed,
}

/// Result of [`evaluate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GiftEvaluation {
    pub state: GiftOfferState,
    /// Gift product refs the caller must remove from the cart.
    pub must_remove: Vec<String>,
}

/// What a successful [`select_gift`] asks the caller to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GiftSelectionChange {
    /// Add a gift line for this product.
    Selected(String),
    /// Remove the gift line for this product.
    Deselected(String),
}

// =============================================================================
// Rules
// =============================================================================

/// True when the offer is open for `subtotal`.
pub fn qualifies(subtotal: Money, config: Option<&GiftPromotionConfig>) -> bool {
    match config {
        Some(config) => {
            config.active
                && !config.gift_products.is_empty()
                && config.max_selectable_gifts > 0
                && config.contains_value(subtotal)
        }
        None => false,
    }
}

/// Evaluates the offer for the current cart.
///
/// `selected` are the product refs of the cart's gift lines, oldest first.
pub fn evaluate(
    subtotal: Money,
    config: Option<&GiftPromotionConfig>,
    dismissed: bool,
    selected: &[String],
) -> GiftEvaluation {
    let config = match config {
        Some(config) if qualifies(subtotal, Some(config)) => config,
        _ => {
            return GiftEvaluation {
                state: GiftOfferState::Ineligible,
                must_remove: selected.to_vec(),
            };
        }
    };

    let max = config.max_selectable_gifts as usize;
    let mut kept = 0usize;
    let must_remove = selected
        .iter()
        .filter(|product_ref| {
            if config.is_candidate(product_ref) && kept < max {
                kept += 1;
                false
            } else {
                true
            }
        })
        .cloned()
        .collect();

    let state = if dismissed {
        GiftOfferState::Dismissed
    } else {
        GiftOfferState::Eligible
    };

    GiftEvaluation { state, must_remove }
}

/// Toggles a gift in the shopper's selection.
///
/// ## Behavior
/// - Already selected: deselect
/// - Not a configured gift product: `NotAGiftProduct`
/// - Selection full: `LimitReached`, selection unchanged
/// - Otherwise: select
///
/// Whether the offer is open at all is the caller's check.
pub fn select_gift(
    product_ref: &str,
    current: &[String],
    config: &GiftPromotionConfig,
) -> Result<GiftSelectionChange, GiftError> {
    if current.iter().any(|r| r == product_ref) {
        return Ok(GiftSelectionChange::Deselected(product_ref.to_string()));
    }

    if !config.is_candidate(product_ref) {
        return Err(GiftError::NotAGiftProduct(product_ref.to_string()));
    }

    if current.len() >= config.max_selectable_gifts as usize {
        return Err(GiftError::LimitReached {
            max: config.max_selectable_gifts,
        });
    }

    Ok(GiftSelectionChange::Selected(product_ref.to_string()))
}

// =============================================================================
// Offer View
// =============================================================================

/// What the storefront's gift popup renders.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GiftOfferView {
    pub state: GiftOfferState,
    pub title: Option<String>,
    pub sub_title: Option<String>,
    pub min_cart_value: Option<Money>,
    pub max_cart_value: Option<Money>,
    pub max_selectable: u32,
    pub selected: Vec<String>,
    pub remaining_slots: u32,
    pub candidates: Vec<String>,
    /// How much more the shopper must add before the offer opens.
    pub amount_to_unlock: Option<Money>,
}

impl GiftOfferView {
    pub fn build(
        state: GiftOfferState,
        config: Option<&GiftPromotionConfig>,
        selected: Vec<String>,
        subtotal: Money,
    ) -> Self {
        let Some(config) = config.filter(|c| c.active) else {
            return GiftOfferView {
                state,
                selected,
                ..Default::default()
            };
        };

        let amount_to_unlock = (subtotal < config.min_cart_value)
            .then(|| config.min_cart_value - subtotal);
        let remaining_slots = config
            .max_selectable_gifts
            .saturating_sub(selected.len() as u32);

        GiftOfferView {
            state,
            title: Some(config.title.clone()),
            sub_title: Some(config.sub_title.clone()),
            min_cart_value: Some(config.min_cart_value),
            max_cart_value: config.max_cart_value,
            max_selectable: config.max_selectable_gifts,
            selected,
            remaining_slots,
            candidates: config.gift_products.clone(),
            amount_to_unlock,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn config(min: i64, max: Option<i64>, max_selectable: u32) -> GiftPromotionConfig {
        GiftPromotionConfig {
            active: true,
            min_cart_value: Money::from_cents(min),
            max_cart_value: max.map(Money::from_cents),
            max_selectable_gifts: max_selectable,
            gift_products: vec!["mug".to_string(), "tote".to_string(), "socks".to_string()],
            title: "Free gift".to_string(),
            sub_title: "Pick one".to_string(),
        }
    }

    fn refs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_falling_out_of_range_removes_every_gift() {
        let cfg = config(1000, None, 2);
        let selected = refs(&["mug", "tote"]);

        let eval = evaluate(Money::from_cents(800), Some(&cfg), false, &selected);
        assert_eq!(eval.state, GiftOfferState::Ineligible);
        assert_eq!(eval.must_remove, selected);
    }

    #[test]
    fn test_above_max_is_ineligible() {
        let cfg = config(1000, Some(5000), 2);
        let eval = evaluate(Money::from_cents(5001), Some(&cfg), false, &[]);
        assert_eq!(eval.state, GiftOfferState::Ineligible);
    }

    #[test]
    fn test_missing_or_inactive_config_is_ineligible() {
        let selected = refs(&["mug"]);
        let eval = evaluate(Money::major(100), None, false, &selected);
        assert_eq!(eval.state, GiftOfferState::Ineligible);
        assert_eq!(eval.must_remove, selected);

        let mut cfg = config(0, None, 1);
        cfg.active = false;
        assert!(!qualifies(Money::major(100), Some(&cfg)));

        let mut cfg = config(0, None, 1);
        cfg.gift_products.clear();
        assert!(!qualifies(Money::major(100), Some(&cfg)));
    }

    #[test]
    fn test_view_without_config_defaults_to_hidden_offer() {
        assert_eq!(GiftOfferState::default(), GiftOfferState::Ineligible);

        let view = GiftOfferView::build(GiftOfferState::default(), None, vec![], Money::zero());
        assert_eq!(view.state, GiftOfferState::Ineligible);
        assert_eq!(view.max_selectable, 0);
        assert!(view.candidates.is_empty());
        assert!(view.amount_to_unlock.is_none());
    }

    #[test]
    fn test_eligible_and_dismissed() {
        let cfg = config(1000, None, 1);
        assert_eq!(
            evaluate(Money::from_cents(1000), Some(&cfg), false, &[]).state,
            GiftOfferState::Eligible
        );
        assert_eq!(
            evaluate(Money::from_cents(1000), Some(&cfg), true, &[]).state,
            GiftOfferState::Dismissed
        );
    }

    #[test]
    fn test_stale_and_excess_selections_are_removed() {
        let cfg = config(0, None, 1);
        // "retired" is no longer a candidate; "tote" is over the limit
        let selected = refs(&["retired", "mug", "tote"]);
        let eval = evaluate(Money::major(10), Some(&cfg), false, &selected);

        assert_eq!(eval.state, GiftOfferState::Eligible);
        assert_eq!(eval.must_remove, refs(&["retired", "tote"]));
    }

    #[test]
    fn test_select_gift_limit() {
        let cfg = config(0, None, 2);
        let current = refs(&["mug", "tote"]);

        let err = select_gift("socks", &current, &cfg).unwrap_err();
        assert_eq!(err, GiftError::LimitReached { max: 2 });
        assert_eq!(current, refs(&["mug", "tote"]));
    }

    #[test]
    fn test_select_gift_toggles() {
        let cfg = config(0, None, 2);
        assert_eq!(
            select_gift("mug", &[], &cfg).unwrap(),
            GiftSelectionChange::Selected("mug".to_string())
        );
        // Deselect works even when the selection is full
        assert_eq!(
            select_gift("mug", &refs(&["mug", "tote"]), &cfg).unwrap(),
            GiftSelectionChange::Deselected("mug".to_string())
        );
    }

    #[test]
    fn test_select_unknown_gift() {
        let cfg = config(0, None, 2);
        assert_eq!(
            select_gift("laptop", &[], &cfg).unwrap_err(),
            GiftError::NotAGiftProduct("laptop".to_string())
        );
    }

    #[test]
    fn test_offer_view() {
        let cfg = config(1000, None, 2);
        let view = GiftOfferView::build(
            GiftOfferState::Ineligible,
            Some(&cfg),
            vec![],
            Money::from_cents(600),
        );
        assert_eq!(view.amount_to_unlock, Some(Money::from_cents(400)));
        assert_eq!(view.remaining_slots, 2);
        assert_eq!(view.title.as_deref(), Some("Free gift"));

        let view = GiftOfferView::build(
            GiftOfferState::Eligible,
            Some(&cfg),
            refs(&["mug"]),
            Money::from_cents(1200),
        );
        assert_eq!(view.amount_to_unlock, None);
        assert_eq!(view.remaining_slots, 1);

        let hidden = GiftOfferView::build(GiftOfferState::Ineligible, None, vec![], Money::zero());
        assert!(hidden.candidates.is_empty());
        assert!(hidden.title.is_none());
    }
}
