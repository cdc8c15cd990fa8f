//! # promo-core: Pure Promotion Logic for the Storefront
//!
//! This crate is the rule engine behind the storefront cart. It owns the
//! cart contents, prices coupons, decides gift eligibility and composes all
//! of it into a single snapshot per cart. Nothing here performs I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Storefront Promotion Architecture                   │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Storefront (React) / Admin Dashboard               │   │
//! │  │    Cart Drawer ──► Coupon Form ──► Gift Popup ──► Checkout      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ JSON over HTTP                         │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    promo-api (axum)                             │   │
//! │  │   per-cart locks, collaborator lookups, timeouts                │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ promo-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐  ┌──────────┐  ┌──────────┐  ┌─────────────┐     │   │
//! │  │   │  cart   │  │  coupon  │  │   gift   │  │  promotion  │     │   │
//! │  │   │ Cart    │  │ evaluate │  │ evaluate │  │ recompute   │     │   │
//! │  │   │ CartItem│  │ discount │  │ select   │  │ Snapshot    │     │   │
//! │  │   └─────────┘  └──────────┘  └──────────┘  └─────────────┘     │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    promo-db (SQLite)                            │   │
//! │  │        carts, coupons, redemptions, gift promotion config       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`types`] - External definitions (coupons, gift config, products)
//! - [`cart`] - The Cart Store: sole mutator of cart contents
//! - [`coupon`] - Coupon Evaluator
//! - [`gift`] - Gift Eligibility Engine
//! - [`promotion`] - Promotion Orchestrator and the per-cart session
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation
//!
//! ## Example Usage
//!
//! ```rust
//! use promo_core::cart::Cart;
//! use promo_core::money::Money;
//!
//! let mut cart = Cart::new("session-1");
//! cart.add_item("tee-black", Money::from_cents(50_000), false).unwrap();
//! cart.add_item("tee-black", Money::from_cents(50_000), false).unwrap();
//!
//! // Same product merges into one line with quantity 2
//! assert_eq!(cart.items().len(), 1);
//! assert_eq!(cart.subtotal().cents(), 100_000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod coupon;
pub mod error;
pub mod gift;
pub mod money;
pub mod promotion;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartItem};
pub use coupon::AppliedCoupon;
pub use error::{CartError, CoreError, CouponError, GiftError, ValidationError};
pub use gift::{GiftEvaluation, GiftOfferState, GiftOfferView, GiftSelectionChange};
pub use money::Money;
pub use promotion::{CartSession, PromotionNotice, PromotionSnapshot};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct lines allowed in a single cart.
///
/// ## Business Reason
/// Prevents runaway carts and keeps snapshots small enough to render.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Highest accepted unit price in minor units (10 billion major units).
///
/// `MAX_CART_ITEMS × MAX_ITEM_QUANTITY × MAX_UNIT_PRICE_CENTS` stays well
/// inside `i64`, so cart totals cannot overflow.
pub const MAX_UNIT_PRICE_CENTS: i64 = 1_000_000_000_000;

/// Quantity of every gift line. Gifts are never adjustable.
pub const GIFT_QUANTITY: i64 = 1;
