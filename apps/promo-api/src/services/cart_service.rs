//! # Cart Service
//!
//! Runs every cart operation as one locked unit of work.
//!
//! ## Request Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    One Cart Request                                     │
//! │                                                                         │
//! │  acquire cart lock                                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  load session (or start an empty one)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  mutate via promo-core ──── rejected? ──► return error, nothing saved   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  look up gift config + applied coupon (guarded)                         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  promotion::recompute ──► forced removals become notices                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  save if anything changed, release lock, return snapshot                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The storefront never sees a cart whose discount or gift state is stale.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use promo_core::promotion::{self, CartSession, PromotionSnapshot};
use promo_core::validation::{
    validate_cart_id, validate_coupon_code, validate_product_ref, validate_quantity,
};
use promo_core::{coupon, CouponDefinition, CouponError, GiftPromotionConfig};

use crate::error::{ApiError, ApiResult, ErrorCode};
use crate::state::{AppState, CartGuard};

/// A cart loaded under its lock.
struct OpenCart {
    _guard: CartGuard,
    session: CartSession,
    original: CartSession,
}

/// Cart, coupon and gift operations for one storefront.
#[derive(Clone)]
pub struct CartService {
    state: Arc<AppState>,
}

impl CartService {
    pub fn new(state: Arc<AppState>) -> Self {
        CartService { state }
    }

    // =========================================================================
    // Cart Store
    // =========================================================================

    /// Current state of a cart. Unknown carts read as empty.
    pub async fn snapshot(&self, cart_id: &str) -> ApiResult<PromotionSnapshot> {
        let mut cart = self.open(cart_id).await?;
        self.commit(&mut cart, None).await
    }

    /// Adds `quantity` (default 1) of a catalog product at its current price.
    pub async fn add_item(
        &self,
        cart_id: &str,
        product_ref: &str,
        quantity: Option<i64>,
    ) -> ApiResult<PromotionSnapshot> {
        validate_product_ref(product_ref)?;
        let quantity = quantity.unwrap_or(1);
        validate_quantity(quantity)?;

        let product = self
            .state
            .collaborators
            .product(product_ref)
            .await
            .map_err(|e| {
                ApiError::new(
                    ErrorCode::ProductUnavailable,
                    format!("Product {} is unavailable: {}", product_ref, e),
                )
            })?
            .filter(|p| p.is_active)
            .ok_or_else(|| ApiError::not_found("Product", product_ref))?;

        let mut cart = self.open(cart_id).await?;
        let line = cart.session.cart.add_product(&product, quantity, false)?;
        debug!(cart_id = %cart_id, product = %product.id, quantity = line.quantity, "Item added");

        self.commit(&mut cart, None).await
    }

    /// Sets a line's quantity; `<= 0` removes the line.
    pub async fn update_quantity(
        &self,
        cart_id: &str,
        item_id: &str,
        quantity: i64,
    ) -> ApiResult<PromotionSnapshot> {
        let mut cart = self.open(cart_id).await?;
        cart.session.cart.update_quantity(item_id, quantity)?;
        debug!(cart_id = %cart_id, item_id = %item_id, quantity, "Quantity updated");

        self.commit(&mut cart, None).await
    }

    /// Removes a line. Removing an unknown line is not an error.
    pub async fn remove_item(&self, cart_id: &str, item_id: &str) -> ApiResult<PromotionSnapshot> {
        let mut cart = self.open(cart_id).await?;
        if cart.session.cart.remove_item(item_id).is_some() {
            debug!(cart_id = %cart_id, item_id = %item_id, "Item removed");
        }

        self.commit(&mut cart, None).await
    }

    /// Empties the cart. The applied coupon is re-validated like after any
    /// other mutation.
    pub async fn clear(&self, cart_id: &str) -> ApiResult<PromotionSnapshot> {
        let mut cart = self.open(cart_id).await?;
        cart.session.cart.clear();
        debug!(cart_id = %cart_id, "Cart cleared");

        self.commit(&mut cart, None).await
    }

    // =========================================================================
    // Coupons
    // =========================================================================

    /// Applies a coupon, replacing any coupon already applied.
    ///
    /// ## Check Order
    /// 1. code format
    /// 2. existence, active flag, validity window, minimum order
    /// 3. usage limits (only once 2 passed)
    ///
    /// On rejection the cart, including a previously applied coupon, is
    /// left as it was.
    pub async fn apply_coupon(
        &self,
        cart_id: &str,
        code: &str,
        user_id: Option<&str>,
    ) -> ApiResult<PromotionSnapshot> {
        let code = validate_coupon_code(code)?;
        let mut cart = self.open(cart_id).await?;

        let definition = self.state.collaborators.coupon(&code).await;
        let now = Utc::now();
        coupon::evaluate(&code, definition.as_ref(), cart.session.cart.subtotal(), now)?;

        let usage = self.state.collaborators.usage(&code, user_id).await?;
        let applied =
            promotion::apply_coupon(&mut cart.session, &code, definition.as_ref(), &usage, now)?;
        info!(
            cart_id = %cart_id,
            code = %applied.code,
            discount = %applied.discount_value,
            "Coupon applied"
        );

        self.commit(&mut cart, definition).await
    }

    /// Removes the applied coupon, if any.
    pub async fn remove_coupon(&self, cart_id: &str) -> ApiResult<PromotionSnapshot> {
        let mut cart = self.open(cart_id).await?;
        if let Some(removed) = cart.session.remove_coupon() {
            debug!(cart_id = %cart_id, code = %removed.code, "Coupon removed");
        }

        self.commit(&mut cart, None).await
    }

    // =========================================================================
    // Gifts
    // =========================================================================

    /// Selects a gift, or deselects it if already selected.
    pub async fn toggle_gift(&self, cart_id: &str, product_ref: &str) -> ApiResult<PromotionSnapshot> {
        validate_product_ref(product_ref)?;
        let mut cart = self.open(cart_id).await?;

        let gift_config = self.state.collaborators.gift_config().await;
        // The name is cosmetic; a failed lookup still lets the gift through.
        let display_name = match self.state.collaborators.product(product_ref).await {
            Ok(product) => product.map(|p| p.name),
            Err(_) => None,
        };

        let change = promotion::toggle_gift(
            &mut cart.session,
            product_ref,
            display_name,
            gift_config.as_ref(),
        )?;
        info!(cart_id = %cart_id, change = ?change, "Gift selection changed");

        self.recompute_and_save(&mut cart, None, gift_config.as_ref())
            .await
    }

    /// Hides the gift offer until the cart next changes.
    pub async fn dismiss_gift_offer(&self, cart_id: &str) -> ApiResult<PromotionSnapshot> {
        let mut cart = self.open(cart_id).await?;
        cart.session.dismiss_gift_offer();
        debug!(cart_id = %cart_id, revision = cart.session.cart.revision(), "Gift offer dismissed");

        self.commit(&mut cart, None).await
    }

    // =========================================================================
    // Checkout
    // =========================================================================

    /// Final recompute, coupon redemption, then the cart is deleted.
    ///
    /// ## Returns
    /// The snapshot the order is placed with.
    ///
    /// ## Errors
    /// - `InvalidOperation` for an empty cart
    /// - `CouponRejected` if the coupon's usage limit was reached meanwhile
    ///   (the coupon is removed from the cart)
    /// - `ServiceUnavailable` if the redemption cannot be recorded
    pub async fn checkout(&self, cart_id: &str, user_id: Option<&str>) -> ApiResult<PromotionSnapshot> {
        let mut cart = self.open(cart_id).await?;
        if cart.session.cart.is_empty() {
            return Err(ApiError::invalid_operation("Cannot check out an empty cart"));
        }

        let gift_config = self.state.collaborators.gift_config().await;
        let snapshot = self.recompute(&mut cart, None, gift_config.as_ref()).await;

        if let Some(applied) = cart.session.applied_coupon.clone() {
            let checked = self
                .state
                .collaborators
                .usage(&applied.code, user_id)
                .await
                .and_then(|usage| coupon::check_usage(&applied.source_definition, &usage));

            // The usage read above can be stale; recording re-checks the
            // limits atomically and has the final say.
            let rejection = match checked {
                Err(rejection) => Some(rejection),
                Ok(()) => {
                    let recorded = self
                        .state
                        .collaborators
                        .record_redemption(
                            &applied.source_definition,
                            user_id,
                            cart_id,
                            applied.discount_value,
                        )
                        .await
                        .map_err(|e| {
                            ApiError::unavailable(format!("Could not record coupon redemption: {}", e))
                        })?;
                    (!recorded).then(|| CouponError::UsageLimitExceeded {
                        code: applied.code.clone(),
                    })
                }
            };

            if let Some(rejection) = rejection {
                cart.session.remove_coupon();
                self.save_if_changed(&cart).await?;
                return Err(rejection.into());
            }
        }

        self.state.db.carts().delete(cart_id).await?;

        info!(
            cart_id = %cart_id,
            items = snapshot.item_count,
            total = %snapshot.final_total,
            "Checkout complete"
        );
        Ok(snapshot)
    }

    // =========================================================================
    // Unit of Work
    // =========================================================================

    async fn open(&self, cart_id: &str) -> ApiResult<OpenCart> {
        validate_cart_id(cart_id)?;
        let guard = self.state.locks.acquire(cart_id).await;
        let session = self.state.db.carts().load_or_new(cart_id).await?;
        Ok(OpenCart {
            _guard: guard,
            original: session.clone(),
            session,
        })
    }

    /// Recomputes with fresh lookups and saves.
    ///
    /// `known_coupon` is a definition fetched earlier in the same request;
    /// it is reused when it matches the applied coupon.
    async fn commit(
        &self,
        cart: &mut OpenCart,
        known_coupon: Option<CouponDefinition>,
    ) -> ApiResult<PromotionSnapshot> {
        let gift_config = self.state.collaborators.gift_config().await;
        self.recompute_and_save(cart, known_coupon, gift_config.as_ref())
            .await
    }

    async fn recompute_and_save(
        &self,
        cart: &mut OpenCart,
        known_coupon: Option<CouponDefinition>,
        gift_config: Option<&GiftPromotionConfig>,
    ) -> ApiResult<PromotionSnapshot> {
        let snapshot = self.recompute(cart, known_coupon, gift_config).await;
        self.save_if_changed(cart).await?;
        Ok(snapshot)
    }

    async fn recompute(
        &self,
        cart: &mut OpenCart,
        known_coupon: Option<CouponDefinition>,
        gift_config: Option<&GiftPromotionConfig>,
    ) -> PromotionSnapshot {
        let definition = match &cart.session.applied_coupon {
            Some(applied) => match known_coupon {
                Some(known) if known.code == applied.code => Some(known),
                _ => self.state.collaborators.coupon(&applied.code).await,
            },
            None => None,
        };

        let snapshot =
            promotion::recompute(&mut cart.session, definition.as_ref(), gift_config, Utc::now());
        for notice in &snapshot.notices {
            info!(cart_id = %snapshot.cart_id, notice = ?notice, "Promotion state corrected");
        }
        snapshot
    }

    async fn save_if_changed(&self, cart: &OpenCart) -> ApiResult<()> {
        if cart.session != cart.original {
            self.state.db.carts().save(&cart.session).await?;
        }
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
