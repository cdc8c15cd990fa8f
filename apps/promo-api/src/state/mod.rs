//! # Application State
//!
//! Shared by every handler through `State<Arc<AppState>>`.
//!
//! ```text
//! AppState
//! ├── db             promo-db handle (carts, admin writes)
//! ├── collaborators  guarded product / coupon / usage / gift lookups
//! ├── locks          per-cart mutual exclusion
//! └── config         loaded ApiConfig
//! ```

pub mod locks;

pub use locks::{CartGuard, CartLocks};

use promo_db::Database;

use crate::collaborators::Collaborators;
use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub collaborators: Collaborators,
    pub locks: CartLocks,
    pub config: ApiConfig,
}

impl AppState {
    /// State with every collaborator served from `db`.
    pub fn new(db: Database, config: ApiConfig) -> Self {
        let collaborators = Collaborators::from_database(db.clone(), config.lookup_timeout());
        AppState::with_collaborators(db, collaborators, config)
    }

    /// State with explicit collaborators (remote services, test fakes).
    pub fn with_collaborators(db: Database, collaborators: Collaborators, config: ApiConfig) -> Self {
        AppState {
            db,
            collaborators,
            locks: CartLocks::new(),
            config,
        }
    }
}
