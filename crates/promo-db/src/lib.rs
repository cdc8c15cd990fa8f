//! # promo-db: Database Layer for the Storefront Promo Engine
//!
//! SQLite persistence for carts, coupons, redemptions, the gift promotion
//! and the catalog snapshot, built on sqlx.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Promo Engine Data Flow                           │
//! │                                                                         │
//! │  promo-api (cart service, collaborators)                               │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     promo-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐   ┌──────────────┐   │   │
//! │  │   │   Database    │    │  Repositories  │   │  Migrations  │   │   │
//! │  │   │   (pool.rs)   │    │                │   │  (embedded)  │   │   │
//! │  │   │               │    │ CartRepo       │   │              │   │   │
//! │  │   │ SqlitePool    │◄───│ CouponRepo     │   │ 001_initial  │   │   │
//! │  │   │ WAL, FKs      │    │ RedemptionRepo │   │   _schema    │   │   │
//! │  │   │               │    │ GiftPromoRepo  │   │              │   │   │
//! │  │   │               │    │ ProductRepo    │   │              │   │   │
//! │  │   └───────────────┘    └────────────────┘   └──────────────┘   │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite file (path from promo.toml) or :memory: in tests               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use promo_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("promo.db")).await?;
//! let session = db.carts().load_or_new("session-1").await?;
//! let coupon = db.coupons().get_by_code("SAVE10").await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::cart::CartRepository;
pub use repository::coupon::CouponRepository;
pub use repository::gift::GiftPromotionRepository;
pub use repository::product::ProductRepository;
pub use repository::redemption::RedemptionRepository;
