//! # Product Repository
//!
//! Local snapshot of the catalog. The cart only ever reads it: to price a
//! line when it is added and to name gift lines.
//!
//! Products are addressed by id or by slug, whichever the storefront has.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use promo_core::{Money, ProductSummary};

/// Row shape of the `products` table.
#[derive(Debug, FromRow)]
struct ProductRow {
    id: String,
    slug: String,
    name: String,
    price_cents: i64,
    image_url: Option<String>,
    images: String,
    is_active: bool,
}

impl TryFrom<ProductRow> for ProductSummary {
    type Error = crate::error::DbError;

    fn try_from(row: ProductRow) -> DbResult<Self> {
        Ok(ProductSummary {
            id: row.id,
            slug: row.slug,
            name: row.name,
            price: Money::from_cents(row.price_cents),
            image_url: row.image_url,
            images: serde_json::from_str(&row.images)?,
            is_active: row.is_active,
        })
    }
}

/// Repository for product database operations.
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Gets a product by id or slug.
    ///
    /// ## Returns
    /// * `Ok(Some(ProductSummary))` - Product found (active or not)
    /// * `Ok(None)` - No product with that id or slug
    pub async fn get(&self, id_or_slug: &str) -> DbResult<Option<ProductSummary>> {
        debug!(id_or_slug = %id_or_slug, "Fetching product");

        let row = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, slug, name, price_cents, image_url, images, is_active
            FROM products
            WHERE id = ?1 OR slug = ?1
            LIMIT 1
            "#,
        )
        .bind(id_or_slug)
        .fetch_optional(&self.pool)
        .await?;

        row.map(ProductSummary::try_from).transpose()
    }

    /// Lists active products sorted by name.
    pub async fn list_active(&self, limit: u32) -> DbResult<Vec<ProductSummary>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            r#"
            SELECT id, slug, name, price_cents, image_url, images, is_active
            FROM products
            WHERE is_active = 1
            ORDER BY name
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(ProductSummary::try_from).collect()
    }

    /// Inserts or replaces a product snapshot.
    pub async fn upsert(&self, product: &ProductSummary) -> DbResult<()> {
        debug!(id = %product.id, slug = %product.slug, "Upserting product");

        let now: DateTime<Utc> = Utc::now();
        let images = serde_json::to_string(&product.images)?;

        sqlx::query(
            r#"
            INSERT INTO products (
                id, slug, name, price_cents, image_url, images, is_active,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
            ON CONFLICT(id) DO UPDATE SET
                slug = excluded.slug,
                name = excluded.name,
                price_cents = excluded.price_cents,
                image_url = excluded.image_url,
                images = excluded.images,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&product.id)
        .bind(&product.slug)
        .bind(&product.name)
        .bind(product.price.cents())
        .bind(&product.image_url)
        .bind(images)
        .bind(product.is_active)
        .bind(now)
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

    fn tee() -> ProductSummary {
        ProductSummary {
            id: "prod-tee".to_string(),
            slug: "black-tee".to_string(),
            name: "Black Tee".to_string(),
            price: Money::from_cents(2500),
            image_url: Some("/img/tee.png".to_string()),
            images: vec!["/img/tee-1.png".to_string(), "/img/tee-2.png".to_string()],
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_get_by_id_or_slug() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.products().upsert(&tee()).await.unwrap();

        let by_id = db.products().get("prod-tee").await.unwrap().unwrap();
        let by_slug = db.products().get("black-tee").await.unwrap().unwrap();

        assert_eq!(by_id, tee());
        assert_eq!(by_id, by_slug);
        assert!(db.products().get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_updates_price() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut product = tee();
        db.products().upsert(&product).await.unwrap();

        product.price = Money::from_cents(1999);
        db.products().upsert(&product).await.unwrap();

        let stored = db.products().get("prod-tee").await.unwrap().unwrap();
        assert_eq!(stored.price, Money::from_cents(1999));
    }

    #[tokio::test]
    async fn test_list_active_skips_inactive() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let mut hidden = tee();
        hidden.id = "prod-hidden".to_string();
        hidden.slug = "hidden".to_string();
        hidden.is_active = false;

        db.products().upsert(&tee()).await.unwrap();
        db.products().upsert(&hidden).await.unwrap();

        let active = db.products().list_active(10).await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "prod-tee");
    }
}
