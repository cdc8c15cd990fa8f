//! # Coupon Repository
//!
//! Storage for coupon definitions. Codes are stored in canonical
//! (upper-case) form; callers normalise before looking up.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use promo_core::{CouponDefinition, DiscountKind, Money};

#[derive(Debug, FromRow)]
struct CouponRow {
    code: String,
    discount_type: DiscountKind,
    discount_amount: i64,
    minimum_order_cents: i64,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    usage_limit: Option<i64>,
    usage_limit_per_user: Option<i64>,
    is_active: bool,
}

impl From<CouponRow> for CouponDefinition {
    fn from(row: CouponRow) -> Self {
        CouponDefinition {
            code: row.code,
            discount_type: row.discount_type,
            discount_amount: row.discount_amount,
            minimum_order_value: Money::from_cents(row.minimum_order_cents),
            start_date: row.start_date,
            end_date: row.end_date,
            usage_limit: row.usage_limit,
            usage_limit_per_user: row.usage_limit_per_user,
            is_active: row.is_active,
        }
    }
}

/// Repository for coupon definitions.
#[derive(Debug, Clone)]
pub struct CouponRepository {
    pool: SqlitePool,
}

impl CouponRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CouponRepository { pool }
    }

    /// Gets a coupon by its canonical code.
    pub async fn get_by_code(&self, code: &str) -> DbResult<Option<CouponDefinition>> {
        debug!(code = %code, "Fetching coupon");

        let row = sqlx::query_as::<_, CouponRow>(
            r#"
            SELECT
                code, discount_type, discount_amount, minimum_order_cents,
                start_date, end_date, usage_limit, usage_limit_per_user, is_active
            FROM coupons
            WHERE code = ?1
            "#,
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(CouponDefinition::from))
    }

    /// Inserts or replaces a coupon definition.
    pub async fn upsert(&self, coupon: &CouponDefinition) -> DbResult<()> {
        debug!(code = %coupon.code, kind = coupon.discount_type.as_str(), "Upserting coupon");

        sqlx::query(
            r#"
            INSERT INTO coupons (
                code, discount_type, discount_amount, minimum_order_cents,
                start_date, end_date, usage_limit, usage_limit_per_user, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)
            ON CONFLICT(code) DO UPDATE SET
                discount_type = excluded.discount_type,
                discount_amount = excluded.discount_amount,
                minimum_order_cents = excluded.minimum_order_cents,
                start_date = excluded.start_date,
                end_date = excluded.end_date,
                usage_limit = excluded.usage_limit,
                usage_limit_per_user = excluded.usage_limit_per_user,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&coupon.code)
        .bind(coupon.discount_type)
        .bind(coupon.discount_amount)
        .bind(coupon.minimum_order_value.cents())
        .bind(coupon.start_date)
        .bind(coupon.end_date)
        .bind(coupon.usage_limit)
        .bind(coupon.usage_limit_per_user)
        .bind(coupon.is_active)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use chrono::{Duration, TimeZone};

    fn save10() -> CouponDefinition {
        CouponDefinition {
            code: "SAVE10".to_string(),
            discount_type: DiscountKind::Percentage,
            discount_amount: 1000,
            minimum_order_value: Money::major(1000),
            start_date: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2026, 12, 31, 23, 59, 59).unwrap(),
            usage_limit: Some(100),
            usage_limit_per_user: Some(1),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_upsert_and_get() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.coupons().upsert(&save10()).await.unwrap();

        let stored = db.coupons().get_by_code("SAVE10").await.unwrap().unwrap();
        assert_eq!(stored, save10());
        assert!(db.coupons().get_by_code("NOPE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_replaces_definition() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut coupon = save10();
        db.coupons().upsert(&coupon).await.unwrap();

        coupon.discount_type = DiscountKind::Fixed;
        coupon.discount_amount = 50_000;
        coupon.end_date = coupon.end_date + Duration::days(30);
        db.coupons().upsert(&coupon).await.unwrap();

        let stored = db.coupons().get_by_code("SAVE10").await.unwrap().unwrap();
        assert_eq!(stored.discount_type, DiscountKind::Fixed);
        assert_eq!(stored.fixed_amount(), Some(Money::major(500)));
        assert_eq!(stored.end_date, coupon.end_date);
    }
}
