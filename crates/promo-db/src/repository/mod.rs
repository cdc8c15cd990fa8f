//! # Repository Module
//!
//! Database repository implementations for the promo engine.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Repository Pattern                                   │
//! │                                                                         │
//! │  promo-api service                                                     │
//! │       │                                                                 │
//! │       │  db.carts().load_or_new("session-1")                           │
//! │       ▼                                                                 │
//! │  CartRepository                                                        │
//! │  ├── load(&self, cart_id)                                              │
//! │  ├── save(&self, session)      ← one transaction                       │
//! │  └── delete(&self, cart_id)                                            │
//! │       │                                                                 │
//! │       │  SQL Query                                                      │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! │                                                                         │
//! │  Row structs (FromRow) stay private to each repository; callers only   │
//! │  ever see promo-core types.                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CartRepository`](cart::CartRepository) - Cart sessions and lines
//! - [`CouponRepository`](coupon::CouponRepository) - Coupon definitions
//! - [`RedemptionRepository`](redemption::RedemptionRepository) - Usage counters
//! - [`GiftPromotionRepository`](gift::GiftPromotionRepository) - Gift offer config
//! - [`ProductRepository`](product::ProductRepository) - Catalog snapshot

pub mod cart;
pub mod coupon;
pub mod gift;
pub mod product;
pub mod redemption;
