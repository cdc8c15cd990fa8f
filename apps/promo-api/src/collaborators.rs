//! # Collaborator Ports
//!
//! The promo engine reads four things it does not own: the product catalog,
//! the coupon directory, coupon usage counters and the gift promotion.
//!
//! ## Degradation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Every lookup runs under tokio::time::timeout(lookup_timeout)           │
//! │                                                                         │
//! │  Port              On error / timeout          Shopper sees             │
//! │  ────              ──────────────────          ────────────             │
//! │  ProductCatalog    Err(Unavailable)            503, item not added      │
//! │  CouponDirectory   None                        coupon NotFound/removed  │
//! │  UsageTracker      UsageLimitExceeded          coupon rejected          │
//! │  GiftConfigSource  None                        gift offer Ineligible    │
//! │                                                                         │
//! │  Each degradation logs a warn! with the port and the cause.             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The default implementation of every port is [`DbCollaborators`], backed
//! by promo-db.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::warn;

use promo_core::{
    CouponDefinition, CouponError, CouponUsage, GiftPromotionConfig, Money, ProductSummary,
};
use promo_db::{Database, DbError};

/// Why a collaborator could not answer.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CollaboratorError {
    #[error("{port} did not answer within {after_ms}ms")]
    TimedOut { port: &'static str, after_ms: u64 },

    #[error("{0}")]
    Unavailable(String),
}

impl From<DbError> for CollaboratorError {
    fn from(err: DbError) -> Self {
        CollaboratorError::Unavailable(err.to_string())
    }
}

pub type CollaboratorResult<T> = Result<T, CollaboratorError>;

// =============================================================================
// Ports
// =============================================================================

/// Read access to the catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Looks a product up by id or slug.
    async fn product(&self, id_or_slug: &str) -> CollaboratorResult<Option<ProductSummary>>;
}

/// Read access to coupon definitions.
#[async_trait]
pub trait CouponDirectory: Send + Sync {
    /// Looks a coupon up by its canonical code.
    async fn coupon(&self, code: &str) -> CollaboratorResult<Option<CouponDefinition>>;
}

/// Coupon usage counters.
#[async_trait]
pub trait UsageTracker: Send + Sync {
    async fn usage(&self, code: &str, user_id: Option<&str>) -> CollaboratorResult<CouponUsage>;

    /// Counts one redemption if `coupon`'s limits still allow it. Called
    /// once per checkout.
    ///
    /// The limit check and the write must be atomic: of two checkouts racing
    /// for the last use, exactly one gets `true`.
    async fn record_redemption(
        &self,
        coupon: &CouponDefinition,
        user_id: Option<&str>,
        cart_id: &str,
        discount: Money,
    ) -> CollaboratorResult<bool>;
}

/// The storefront's gift promotion.
#[async_trait]
pub trait GiftConfigSource: Send + Sync {
    async fn gift_config(&self) -> CollaboratorResult<Option<GiftPromotionConfig>>;
}

// =============================================================================
// SQLite Implementation
// =============================================================================

/// All four ports served from the local database.
#[derive(Debug, Clone)]
pub struct DbCollaborators {
    db: Database,
}

impl DbCollaborators {
    pub fn new(db: Database) -> Self {
        DbCollaborators { db }
    }
}

#[async_trait]
impl ProductCatalog for DbCollaborators {
    async fn product(&self, id_or_slug: &str) -> CollaboratorResult<Option<ProductSummary>> {
        Ok(self.db.products().get(id_or_slug).await?)
    }
}

#[async_trait]
impl CouponDirectory for DbCollaborators {
    async fn coupon(&self, code: &str) -> CollaboratorResult<Option<CouponDefinition>> {
        Ok(self.db.coupons().get_by_code(code).await?)
    }
}

#[async_trait]
impl UsageTracker for DbCollaborators {
    async fn usage(&self, code: &str, user_id: Option<&str>) -> CollaboratorResult<CouponUsage> {
        Ok(self.db.redemptions().usage(code, user_id).await?)
    }

    async fn record_redemption(
        &self,
        coupon: &CouponDefinition,
        user_id: Option<&str>,
        cart_id: &str,
        discount: Money,
    ) -> CollaboratorResult<bool> {
        Ok(self
            .db
            .redemptions()
            .record(coupon, user_id, cart_id, discount)
            .await?)
    }
}

#[async_trait]
impl GiftConfigSource for DbCollaborators {
    async fn gift_config(&self) -> CollaboratorResult<Option<GiftPromotionConfig>> {
        Ok(self.db.gift_promotion().get().await?)
    }
}

// =============================================================================
// Guarded Access
// =============================================================================

/// The ports plus the timeout and fail-closed policy around them.
///
/// Services only ever talk to collaborators through this type.
#[derive(Clone)]
pub struct Collaborators {
    products: Arc<dyn ProductCatalog>,
    coupons: Arc<dyn CouponDirectory>,
    usage: Arc<dyn UsageTracker>,
    gifts: Arc<dyn GiftConfigSource>,
    timeout: Duration,
}

impl Collaborators {
    pub fn new(
        products: Arc<dyn ProductCatalog>,
        coupons: Arc<dyn CouponDirectory>,
        usage: Arc<dyn UsageTracker>,
        gifts: Arc<dyn GiftConfigSource>,
        timeout: Duration,
    ) -> Self {
        Collaborators {
            products,
            coupons,
            usage,
            gifts,
            timeout,
        }
    }

    /// Every port backed by `db`.
    pub fn from_database(db: Database, timeout: Duration) -> Self {
        let backend = Arc::new(DbCollaborators::new(db));
        Collaborators::new(
            backend.clone(),
            backend.clone(),
            backend.clone(),
            backend,
            timeout,
        )
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn guarded<T>(
        &self,
        port: &'static str,
        call: impl Future<Output = CollaboratorResult<T>>,
    ) -> CollaboratorResult<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(CollaboratorError::TimedOut {
                port,
                after_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }),
        }
    }

    /// Product lookup. Errors are returned, not swallowed: adding an item
    /// without a price is impossible.
    pub async fn product(&self, id_or_slug: &str) -> CollaboratorResult<Option<ProductSummary>> {
        let result = self
            .guarded("product catalog", self.products.product(id_or_slug))
            .await;
        if let Err(e) = &result {
            warn!(product = %id_or_slug, error = %e, "Product lookup failed");
        }
        result
    }

    /// Coupon lookup. A failed lookup reads as "no such coupon".
    pub async fn coupon(&self, code: &str) -> Option<CouponDefinition> {
        match self
            .guarded("coupon directory", self.coupons.coupon(code))
            .await
        {
            Ok(definition) => definition,
            Err(e) => {
                warn!(code = %code, error = %e, "Coupon lookup failed, treating as not found");
                None
            }
        }
    }

    /// Usage counters. A failed lookup reads as "limit exceeded".
    pub async fn usage(
        &self,
        code: &str,
        user_id: Option<&str>,
    ) -> Result<CouponUsage, CouponError> {
        self.guarded("usage tracker", self.usage.usage(code, user_id))
            .await
            .map_err(|e| {
                warn!(code = %code, error = %e, "Usage lookup failed, rejecting coupon");
                CouponError::UsageLimitExceeded {
                    code: code.to_string(),
                }
            })
    }

    /// Records a checkout's redemption. `Ok(false)` means the coupon ran
    /// out of uses since it was applied.
    pub async fn record_redemption(
        &self,
        coupon: &CouponDefinition,
        user_id: Option<&str>,
        cart_id: &str,
        discount: Money,
    ) -> CollaboratorResult<bool> {
        let result = self
            .guarded(
                "usage tracker",
                self.usage.record_redemption(coupon, user_id, cart_id, discount),
            )
            .await;
        match &result {
            Ok(false) => {
                warn!(code = %coupon.code, cart_id = %cart_id, "Usage limit reached at checkout")
            }
            Err(e) => {
                warn!(code = %coupon.code, cart_id = %cart_id, error = %e, "Recording redemption failed")
            }
            Ok(true) => {}
        }
        result
    }

    /// Gift promotion. A failed lookup reads as "no promotion".
    pub async fn gift_config(&self) -> Option<GiftPromotionConfig> {
        match self
            .guarded("gift config", self.gifts.gift_config())
            .await
        {
            Ok(config) => config,
            Err(e) => {
                warn!(error = %e, "Gift config lookup failed, hiding gift offer");
                None
            }
        }
    }
}

// =============================================================================
// Test Fakes
// =============================================================================
