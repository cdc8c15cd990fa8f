//! # Redemption Repository
//!
//! Counts coupon redemptions for usage limits. A redemption is recorded
//! once per checkout, never when a coupon is merely applied to a cart.

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use promo_core::{CouponDefinition, CouponUsage, Money};

/// Repository for coupon redemptions.
#[derive(Debug, Clone)]
pub struct RedemptionRepository {
    pool: SqlitePool,
}

impl RedemptionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        RedemptionRepository { pool }
    }

    /// Counts redemptions of `code`, overall and by `user_id`.
    ///
    /// Anonymous carts (`user_id = None`) always report `user_uses = 0`.
    pub async fn usage(&self, code: &str, user_id: Option<&str>) -> DbResult<CouponUsage> {
        let total_uses: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM coupon_redemptions WHERE code = ?1")
                .bind(code)
                .fetch_one(&self.pool)
                .await?;

        let user_uses: i64 = match user_id {
            Some(user_id) => {
                sqlx::query_scalar(
                    "SELECT COUNT(*) FROM coupon_redemptions WHERE code = ?1 AND user_id = ?2",
                )
                .bind(code)
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?
            }
            None => 0,
        };

        Ok(CouponUsage {
            total_uses,
            user_uses,
        })
    }

    /// Records one redemption unless it would break the coupon's limits.
    ///
    /// The limit check and the insert are a single `INSERT ... SELECT`, so
    /// two checkouts racing for the last use cannot both succeed. The
    /// per-user limit only applies when `user_id` is known.
    ///
    /// ## Returns
    /// `false` if a limit was already reached and nothing was recorded.
    pub async fn record(
        &self,
        coupon: &CouponDefinition,
        user_id: Option<&str>,
        cart_id: &str,
        discount: Money,
    ) -> DbResult<bool> {
        debug!(code = %coupon.code, cart_id = %cart_id, discount = %discount, "Recording redemption");

        let result = sqlx::query(
            r#"
            INSERT INTO coupon_redemptions (id, code, user_id, cart_id, discount_cents, redeemed_at)
            SELECT ?1, ?2, ?3, ?4, ?5, ?6
            WHERE (
                ?7 IS NULL
                OR (SELECT COUNT(*) FROM coupon_redemptions WHERE code = ?2) < ?7
            )
            AND (
                ?3 IS NULL OR ?8 IS NULL
                OR (SELECT COUNT(*) FROM coupon_redemptions WHERE code = ?2 AND user_id = ?3) < ?8
            )
            "#,
        )
        .bind(Uuid::new_v4().to_string())
        .bind(&coupon.code)
        .bind(user_id)
        .bind(cart_id)
        .bind(discount.cents())
        .bind(Utc::now())
        .bind(coupon.usage_limit)
        .bind(coupon.usage_limit_per_user)
        .execute(&self.pool)
        .await?;

        let recorded = result.rows_affected() == 1;
        if !recorded {
            debug!(code = %coupon.code, cart_id = %cart_id, "Redemption refused, usage limit reached");
        }
        Ok(recorded)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
