//! # Promo API
//!
//! HTTP service for the storefront's cart, coupon and free-gift engine.
//!
//! ## Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Promo API                                       │
//! │                                                                         │
//! │  ┌────────────────┐  ┌────────────────┐  ┌────────────────────────────┐│
//! │  │  routes        │  │  services      │  │  promo-core                ││
//! │  │                │  │                │  │                            ││
//! │  │ • cart         │─►│ • CartService  │─►│ • Cart Store               ││
//! │  │ • catalog      │  │ • Catalog      │  │ • Coupon Evaluator         ││
//! │  │ • health       │  │                │  │ • Gift Eligibility Engine  ││
//! │  └────────────────┘  └───────┬────────┘  │ • Promotion Orchestrator   ││
//! │                              │           └────────────────────────────┘│
//! │                              ▼                                          │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │                      Infrastructure                               │  │
//! │  │                                                                   │  │
//! │  │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────────┐│  │
//! │  │  │  promo-db    │  │  Collaborators   │  │  CartLocks           ││  │
//! │  │  │              │  │                  │  │                      ││  │
//! │  │  │ carts,       │  │ timeout +        │  │ one mutex per cart   ││  │
//! │  │  │ coupons, ... │  │ fail closed      │  │                      ││  │
//! │  │  └──────────────┘  └──────────────────┘  └──────────────────────┘│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration
//! See [`config::ApiConfig`]. Environment variables:
//! - `PROMO_CONFIG` - path of promo.toml
//! - `PROMO_BIND_ADDR`, `PROMO_PORT` - listener
//! - `PROMO_DATABASE_PATH`, `PROMO_MAX_CONNECTIONS` - SQLite
//! - `PROMO_LOOKUP_TIMEOUT_MS` - collaborator lookup budget (default: 2000)
//! - `RUST_LOG` - log filter (default: info)

pub mod collaborators;
pub mod config;
pub mod error;
pub mod routes;
pub mod services;
pub mod state;

// Re-exports
pub use config::ApiConfig;
pub use error::{ApiError, ApiResult, ErrorCode};
pub use routes::create_router;
pub use state::AppState;
