//! # Gift Promotion Repository
//!
//! The storefront has one gift promotion, stored as the single row
//! `id = 1` of `gift_promotion`.

use chrono::Utc;
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use promo_core::{GiftPromotionConfig, Money};

#[derive(Debug, FromRow)]
struct GiftPromotionRow {
    active: bool,
    min_cart_cents: i64,
    max_cart_cents: Option<i64>,
    max_selectable_gifts: i64,
    gift_products: String,
    title: String,
    sub_title: String,
}

impl TryFrom<GiftPromotionRow> for GiftPromotionConfig {
    type Error = DbError;

    fn try_from(row: GiftPromotionRow) -> DbResult<Self> {
        Ok(GiftPromotionConfig {
            active: row.active,
            min_cart_value: Money::from_cents(row.min_cart_cents),
            max_cart_value: row.max_cart_cents.map(Money::from_cents),
            max_selectable_gifts: u32::try_from(row.max_selectable_gifts).unwrap_or(0),
            gift_products: serde_json::from_str(&row.gift_products)?,
            title: row.title,
            sub_title: row.sub_title,
        })
    }
}

/// Repository for the gift promotion config.
#[derive(Debug, Clone)]
pub struct GiftPromotionRepository {
    pool: SqlitePool,
}

impl GiftPromotionRepository {
    pub fn new(pool: SqlitePool) -> Self {
        GiftPromotionRepository { pool }
    }

    /// Returns the promotion, or `None` if it was never configured.
    pub async fn get(&self) -> DbResult<Option<GiftPromotionConfig>> {
        let row = sqlx::query_as::<_, GiftPromotionRow>(
            r#"
            SELECT active, min_cart_cents, max_cart_cents, max_selectable_gifts,
                   gift_products, title, sub_title
            FROM gift_promotion
            WHERE id = 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        row.map(GiftPromotionConfig::try_from).transpose()
    }

    /// Creates or replaces the promotion.
    pub async fn upsert(&self, config: &GiftPromotionConfig) -> DbResult<()> {
        debug!(
            active = config.active,
            min = %config.min_cart_value,
            gifts = config.gift_products.len(),
            "Saving gift promotion"
        );

        let gift_products = serde_json::to_string(&config.gift_products)?;

        sqlx::query(
            r#"
            INSERT INTO gift_promotion (
                id, active, min_cart_cents, max_cart_cents, max_selectable_gifts,
                gift_products, title, sub_title, updated_at
            ) VALUES (1, ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            ON CONFLICT(id) DO UPDATE SET
                active = excluded.active,
                min_cart_cents = excluded.min_cart_cents,
                max_cart_cents = excluded.max_cart_cents,
                max_selectable_gifts = excluded.max_selectable_gifts,
                gift_products = excluded.gift_products,
                title = excluded.title,
                sub_title = excluded.sub_title,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(config.active)
        .bind(config.min_cart_value.cents())
        .bind(config.max_cart_value.map(|m| m.cents()))
        .bind(i64::from(config.max_selectable_gifts))
        .bind(gift_products)
        .bind(&config.title)
        .bind(&config.sub_title)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};

    #[tokio::test]
    async fn test_missing_then_saved() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        assert!(db.gift_promotion().get().await.unwrap().is_none());

        let mut config = GiftPromotionConfig {
            active: true,
            min_cart_value: Money::major(1000),
            max_cart_value: None,
            max_selectable_gifts: 2,
            gift_products: vec!["mug".to_string(), "tote".to_string()],
            title: "Free gifts".to_string(),
            sub_title: "On orders over 1000".to_string(),
        };
        db.gift_promotion().upsert(&config).await.unwrap();
        assert_eq!(db.gift_promotion().get().await.unwrap(), Some(config.clone()));

        config.max_cart_value = Some(Money::major(5000));
        config.active = false;
        db.gift_promotion().upsert(&config).await.unwrap();
        assert_eq!(db.gift_promotion().get().await.unwrap(), Some(config));
    }
}
