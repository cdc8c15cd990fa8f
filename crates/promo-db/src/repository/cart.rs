//! # Cart Repository
//!
//! Persists whole [`CartSession`]s: the cart row, its lines and the applied
//! coupon. A session is always written as a unit.
//!
//! ## Save Transaction
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   SINGLE TRANSACTION                                    │
//! │                                                                         │
//! │  1. UPSERT carts (revision, applied_coupon JSON, dismissed_at_revision) │
//! │  2. DELETE FROM cart_items WHERE cart_id = ?                            │
//! │  3. INSERT every line with its position                                 │
//! │                                                                         │
//! │  COMMIT ← a reader never sees lines from two different revisions        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Concurrent writers for the same cart are serialized by the API's per-cart
//! lock; this layer only guarantees atomicity of one save.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use promo_core::{AppliedCoupon, Cart, CartItem, CartSession, Money};

#[derive(Debug, FromRow)]
struct CartRow {
    id: String,
    revision: i64,
    applied_coupon: Option<String>,
    dismissed_at_revision: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
struct CartItemRow {
    id: String,
    product_ref: String,
    name: Option<String>,
    unit_price_cents: i64,
    quantity: i64,
    is_gift: bool,
    added_at: DateTime<Utc>,
}

impl From<CartItemRow> for CartItem {
    fn from(row: CartItemRow) -> Self {
        CartItem {
            id: row.id,
            product_ref: row.product_ref,
            name: row.name,
            unit_price: Money::from_cents(row.unit_price_cents),
            quantity: row.quantity,
            is_gift: row.is_gift,
            added_at: row.added_at,
        }
    }
}

/// Repository for cart sessions.
#[derive(Debug, Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    pub fn new(pool: SqlitePool) -> Self {
        CartRepository { pool }
    }

    /// Loads a session. `None` means the cart was never saved.
    pub async fn load(&self, cart_id: &str) -> DbResult<Option<CartSession>> {
        let Some(row) = sqlx::query_as::<_, CartRow>(
            r#"
            SELECT id, revision, applied_coupon, dismissed_at_revision, created_at, updated_at
            FROM carts
            WHERE id = ?1
            "#,
        )
        .bind(cart_id)
        .fetch_optional(&self.pool)
        .await?
        else {
            return Ok(None);
        };

        let items = sqlx::query_as::<_, CartItemRow>(
            r#"
            SELECT id, product_ref, name, unit_price_cents, quantity, is_gift, added_at
            FROM cart_items
            WHERE cart_id = ?1
            ORDER BY position
            "#,
        )
        .bind(cart_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(CartItem::from)
        .collect();

        let applied_coupon = row
            .applied_coupon
            .as_deref()
            .map(serde_json::from_str::<AppliedCoupon>)
            .transpose()?;

        let cart = Cart::restore(row.id, items, row.revision, row.created_at, row.updated_at);
        Ok(Some(CartSession::restore(
            cart,
            applied_coupon,
            row.dismissed_at_revision,
        )))
    }

    /// Loads a session, or starts an empty one.
    pub async fn load_or_new(&self, cart_id: &str) -> DbResult<CartSession> {
        Ok(self
            .load(cart_id)
            .await?
            .unwrap_or_else(|| CartSession::new(cart_id)))
    }

    /// Writes the whole session in one transaction.
    pub async fn save(&self, session: &CartSession) -> DbResult<()> {
        let cart = &session.cart;
        debug!(
            cart_id = %cart.id(),
            revision = cart.revision(),
            items = cart.items().len(),
            "Saving cart"
        );

        let applied_coupon = session
            .applied_coupon
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO carts (id, revision, applied_coupon, dismissed_at_revision, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(id) DO UPDATE SET
                revision = excluded.revision,
                applied_coupon = excluded.applied_coupon,
                dismissed_at_revision = excluded.dismissed_at_revision,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(cart.id())
        .bind(cart.revision())
        .bind(applied_coupon)
        .bind(session.dismissed_at_revision)
        .bind(cart.created_at())
        .bind(cart.updated_at())
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM cart_items WHERE cart_id = ?1")
            .bind(cart.id())
            .execute(&mut *tx)
            .await?;

        for (position, item) in cart.items().iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO cart_items (
                    id, cart_id, position, product_ref, name,
                    unit_price_cents, quantity, is_gift, added_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(&item.id)
            .bind(cart.id())
            .bind(position as i64)
            .bind(&item.product_ref)
            .bind(&item.name)
            .bind(item.unit_price.cents())
            .bind(item.quantity)
            .bind(item.is_gift)
            .bind(item.added_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Deletes a cart and its lines. Deleting a missing cart is not an error.
    pub async fn delete(&self, cart_id: &str) -> DbResult<()> {
        sqlx::query("DELETE FROM carts WHERE id = ?1")
            .bind(cart_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
