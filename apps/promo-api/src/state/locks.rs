//! # Per-Cart Locks
//!
//! Every request that touches a cart runs load → mutate → recompute → save
//! while holding that cart's lock.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  CartLocks                                                              │
//! │                                                                         │
//! │  "cart-a" ──► Arc<Mutex<()>> ◄── request 1 (holds)                      │
//! │                               ◄── request 2 (waits)                     │
//! │  "cart-b" ──► Arc<Mutex<()>> ◄── request 3 (holds, never waits on a)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An entry lives only while some request holds or waits on it. The last
//! [`CartGuard`] to drop removes it, so the registry is bounded by the
//! number of in-flight requests, not by the number of carts ever seen.

use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use tokio::sync::{Mutex, OwnedMutexGuard};

type Registry = Arc<StdMutex<HashMap<String, Arc<Mutex<()>>>>>;

/// Registry of one async mutex per cart id.
///
/// The registry itself sits behind a std mutex: it is only held for map
/// lookups, never across an `.await`, which lets [`CartGuard`] clean up in
/// `Drop`.
#[derive(Debug, Clone, Default)]
pub struct CartLocks {
    inner: Registry,
}

/// Exclusive access to one cart. Dropping it releases the lock.
#[derive(Debug)]
pub struct CartGuard {
    cart_id: String,
    guard: Option<OwnedMutexGuard<()>>,
    registry: Registry,
}

impl CartLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `cart_id`.
    pub async fn acquire(&self, cart_id: &str) -> CartGuard {
        let lock = {
            let mut locks = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
            locks.entry(cart_id.to_string()).or_default().clone()
        };

        CartGuard {
            cart_id: cart_id.to_string(),
            guard: Some(lock.lock_owned().await),
            registry: self.inner.clone(),
        }
    }

    /// Number of carts with a registered lock.
    pub fn len(&self) -> usize {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Drop for CartGuard {
    fn drop(&mut self) {
        // Unlock first so the strong count below only sees the registry's
        // own reference and those of waiting requests.
        drop(self.guard.take());

        let mut locks = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(&self.cart_id)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            locks.remove(&self.cart_id);
        }
    }
}
