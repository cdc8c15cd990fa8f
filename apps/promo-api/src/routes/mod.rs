//! # HTTP Routes
//!
//! ```text
//! GET    /api/health
//! GET    /api/products/{id_or_slug}
//! GET    /api/coupons/{code}               PUT (admin upsert)
//! GET    /api/gift-popup                   PUT (admin upsert)
//!
//! GET    /api/cart/{cart_id}               DELETE (clear)
//! POST   /api/cart/{cart_id}/items
//! PUT    /api/cart/{cart_id}/items/{item_id}    DELETE
//! POST   /api/cart/{cart_id}/coupon        DELETE
//! POST   /api/cart/{cart_id}/gifts
//! POST   /api/cart/{cart_id}/gift-offer/dismiss
//! POST   /api/cart/{cart_id}/checkout
//! ```
//!
//! Cart routes answer with a `PromotionSnapshot`. Errors answer with
//! `{ "code": ..., "message": ... }`.

pub mod cart;
pub mod catalog;
pub mod health;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;

use crate::state::AppState;

/// Optional header naming the shopper, for per-user coupon limits.
pub const USER_ID_HEADER: &str = "x-user-id";

/// Builds the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(health::health))
        .route("/api/products/{id_or_slug}", get(catalog::get_product))
        .route(
            "/api/coupons/{code}",
            get(catalog::get_coupon).put(catalog::put_coupon),
        )
        .route(
            "/api/gift-popup",
            get(catalog::get_gift_popup).put(catalog::put_gift_popup),
        )
        .route(
            "/api/cart/{cart_id}",
            get(cart::get_cart).delete(cart::clear_cart),
        )
        .route("/api/cart/{cart_id}/items", post(cart::add_item))
        .route(
            "/api/cart/{cart_id}/items/{item_id}",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route(
            "/api/cart/{cart_id}/coupon",
            post(cart::apply_coupon).delete(cart::remove_coupon),
        )
        .route("/api/cart/{cart_id}/gifts", post(cart::toggle_gift))
        .route(
            "/api/cart/{cart_id}/gift-offer/dismiss",
            post(cart::dismiss_gift_offer),
        )
        .route("/api/cart/{cart_id}/checkout", post(cart::checkout))
        .with_state(state)
}
