//! # Cart Store
//!
//! The cart aggregate and the only code allowed to change its contents.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Store Operations                                │
//! │                                                                         │
//! │  Storefront Action       Cart Store               Effect                │
//! │  ─────────────────       ──────────               ──────                │
//! │                                                                         │
//! │  Add to cart ──────────► add_item() ────────────► merge or push line    │
//! │                                                                         │
//! │  Pick a gift ──────────► add_item(is_gift) ─────► push zero-price line  │
//! │                                                                         │
//! │  Change quantity ──────► update_quantity() ─────► set qty (≤ 0 removes) │
//! │                                                                         │
//! │  Remove ───────────────► remove_item() ─────────► drop line (idempotent)│
//! │                                                                         │
//! │  Clear ────────────────► clear() ───────────────► drop all lines        │
//! │                                                                         │
//! │  NOTE: every effective change bumps `revision`. The orchestrator is     │
//! │        always run afterwards, so a stale discount is never observed.    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - Ordinary lines are unique by `product_ref` (adding again merges)
//! - Gift lines are unique by `product_ref`, cost zero, quantity 1
//! - Gift and ordinary lines of the same product are never merged
//! - No line ever has `quantity <= 0`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CartError, CartResult, ValidationError};
use crate::money::Money;
use crate::types::ProductSummary;
use crate::validation::{validate_cart_size, validate_price_cents, validate_product_ref};
use crate::{GIFT_QUANTITY, MAX_CART_ITEMS, MAX_ITEM_QUANTITY};

// =============================================================================
// Cart Item
// =============================================================================

/// A line in the cart.
///
/// ## Design Notes
/// - `product_ref`: Reference to the catalog product (not owned)
/// - `unit_price` and `name` are frozen when the line is created. Later
///   catalog price changes do not reprice the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Line id (UUID v4), unique within the cart.
    pub id: String,

    pub product_ref: String,

    /// Display name at time of adding (frozen).
    pub name: Option<String>,

    /// Price at time of adding (frozen). Always zero for gifts.
    pub unit_price: Money,

    pub quantity: i64,

    pub is_gift: bool,

    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    fn new(
        product_ref: &str,
        name: Option<String>,
        unit_price: Money,
        quantity: i64,
        is_gift: bool,
    ) -> Self {
        CartItem {
            id: Uuid::new_v4().to_string(),
            product_ref: product_ref.to_string(),
            name,
            unit_price,
            quantity,
            is_gift,
            added_at: Utc::now(),
        }
    }

    /// Unit price × quantity.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// A storefront cart, keyed by a caller-supplied id (session or user key).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    id: String,
    items: Vec<CartItem>,
    revision: i64,
    #[ts(as = "String")]
    created_at: DateTime<Utc>,
    #[ts(as = "String")]
    updated_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new(id: impl Into<String>) -> Self {
        let now = Utc::now();
        Cart {
            id: id.into(),
            items: Vec::new(),
            revision: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Rebuilds a cart from persisted parts.
    pub fn restore(
        id: impl Into<String>,
        items: Vec<CartItem>,
        revision: i64,
        created_at: DateTime<Utc>,
        updated_at: DateTime<Utc>,
    ) -> Self {
        Cart {
            id: id.into(),
            items,
            revision,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Lines in insertion order.
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Bumped by every effective mutation.
    pub fn revision(&self) -> i64 {
        self.revision
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn item(&self, item_id: &str) -> Option<&CartItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    fn touch(&mut self) {
        self.revision += 1;
        self.updated_at = Utc::now();
    }

    // -------------------------------------------------------------------------
    // Mutations
    // -------------------------------------------------------------------------

    /// Adds one unit of a product, or one gift line.
    ///
    /// ## Behavior
    /// - Ordinary product already in cart: quantity += 1
    /// - Gift already in cart: no-op, returns the existing line
    /// - Otherwise: a new line (gift lines get price 0, quantity 1)
    ///
    /// ## Returns
    /// The line as it is after the call.
    pub fn add_item(
        &mut self,
        product_ref: &str,
        unit_price: Money,
        is_gift: bool,
    ) -> CartResult<CartItem> {
        self.insert(product_ref, None, unit_price, 1, is_gift)
    }

    /// Adds `quantity` units of an ordinary product (same merge rules).
    pub fn add_quantity(
        &mut self,
        product_ref: &str,
        unit_price: Money,
        quantity: i64,
    ) -> CartResult<CartItem> {
        self.insert(product_ref, None, unit_price, quantity, false)
    }

    /// Adds a catalog product, freezing its name and price on the line.
    pub fn add_product(
        &mut self,
        product: &ProductSummary,
        quantity: i64,
        is_gift: bool,
    ) -> CartResult<CartItem> {
        self.insert(
            &product.id,
            Some(product.name.clone()),
            product.price,
            quantity,
            is_gift,
        )
    }

    /// Adds a gift line carrying a display name. Idempotent per product ref.
    pub fn add_gift(&mut self, product_ref: &str, name: Option<String>) -> CartResult<CartItem> {
        self.insert(product_ref, name, Money::zero(), GIFT_QUANTITY, true)
    }

    fn insert(
        &mut self,
        product_ref: &str,
        name: Option<String>,
        unit_price: Money,
        quantity: i64,
        is_gift: bool,
    ) -> CartResult<CartItem> {
        validate_product_ref(product_ref)?;

        if is_gift {
            if let Some(existing) = self
                .items
                .iter()
                .find(|i| i.is_gift && i.product_ref == product_ref)
            {
                return Ok(existing.clone());
            }
        } else {
            validate_price_cents(unit_price.cents())?;
            if quantity <= 0 {
                return Err(ValidationError::MustBePositive {
                    field: "quantity".to_string(),
                }
                .into());
            }

            if let Some(pos) = self
                .items
                .iter()
                .position(|i| !i.is_gift && i.product_ref == product_ref)
            {
                let new_qty = self.items[pos].quantity.saturating_add(quantity);
                if new_qty > MAX_ITEM_QUANTITY {
                    return Err(CartError::QuantityTooLarge {
                        requested: new_qty,
                        max: MAX_ITEM_QUANTITY,
                    });
                }
                self.items[pos].quantity = new_qty;
                self.touch();
                return Ok(self.items[pos].clone());
            }

            if quantity > MAX_ITEM_QUANTITY {
                return Err(CartError::QuantityTooLarge {
                    requested: quantity,
                    max: MAX_ITEM_QUANTITY,
                });
            }
        }

        validate_cart_size(self.items.len())
            .map_err(|_| CartError::CartTooLarge { max: MAX_CART_ITEMS })?;

        let item = if is_gift {
            CartItem::new(product_ref, name, Money::zero(), GIFT_QUANTITY, true)
        } else {
            CartItem::new(product_ref, name, unit_price, quantity, false)
        };
        self.items.push(item.clone());
        self.touch();
        Ok(item)
    }

    /// Removes a line. Removing a line that is not there is not an error.
    ///
    /// ## Returns
    /// The removed line, if there was one.
    pub fn remove_item(&mut self, item_id: &str) -> Option<CartItem> {
        let pos = self.items.iter().position(|i| i.id == item_id)?;
        let removed = self.items.remove(pos);
        self.touch();
        Some(removed)
    }

    /// Sets the quantity of a line.
    ///
    /// ## Behavior
    /// - Gift line: `InvalidOperation`, cart unchanged
    /// - `quantity <= 0`: same as `remove_item`
    /// - Unknown line with a positive quantity: `ItemNotFound`
    pub fn update_quantity(&mut self, item_id: &str, quantity: i64) -> CartResult<()> {
        let Some(pos) = self.items.iter().position(|i| i.id == item_id) else {
            if quantity <= 0 {
                return Ok(());
            }
            return Err(CartError::ItemNotFound(item_id.to_string()));
        };

        if self.items[pos].is_gift {
            return Err(CartError::InvalidOperation {
                item_id: item_id.to_string(),
                reason: "gift quantity is fixed at 1".to_string(),
            });
        }

        if quantity <= 0 {
            self.items.remove(pos);
            self.touch();
            return Ok(());
        }

        if quantity > MAX_ITEM_QUANTITY {
            return Err(CartError::QuantityTooLarge {
                requested: quantity,
                max: MAX_ITEM_QUANTITY,
            });
        }

        if self.items[pos].quantity != quantity {
            self.items[pos].quantity = quantity;
            self.touch();
        }
        Ok(())
    }

    /// Removes every line.
    pub fn clear(&mut self) {
        if !self.items.is_empty() {
            self.items.clear();
            self.touch();
        }
    }

    /// Removes the gift lines for the given product refs.
    ///
    /// ## Returns
    /// The product refs that were actually removed, in cart order.
    pub fn remove_gifts(&mut self, product_refs: &[String]) -> Vec<String> {
        let mut removed = Vec::new();
        self.items.retain(|i| {
            if i.is_gift && product_refs.contains(&i.product_ref) {
                removed.push(i.product_ref.clone());
                false
            } else {
                true
            }
        });
        if !removed.is_empty() {
            self.touch();
        }
        removed
    }

    // -------------------------------------------------------------------------
    // Derived values
    // -------------------------------------------------------------------------

    /// Σ(unit price × quantity) over ordinary lines. Gifts never count.
    pub fn subtotal(&self) -> Money {
        self.items
            .iter()
            .filter(|i| !i.is_gift)
            .map(CartItem::line_total)
            .sum()
    }

    /// Σ quantity over all lines, gifts included.
    pub fn item_count(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Product refs of the gift lines, oldest first.
    pub fn gift_refs(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|i| i.is_gift)
            .map(|i| i.product_ref.clone())
            .collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MAX_UNIT_PRICE_CENTS;

    fn price(cents: i64) -> Money {
        Money::from_cents(cents)
    }

    #[test]
    fn test_add_same_product_merges() {
        let mut cart = Cart::new("c1");
        cart.add_item("tee", price(500), false).unwrap();
        let line = cart.add_item("tee", price(500), false).unwrap();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(line.quantity, 2);
        assert_eq!(cart.subtotal(), price(1000));
    }

    #[test]
    fn test_gift_add_is_idempotent() {
        let mut cart = Cart::new("c1");
        let first = cart.add_item("mug", price(0), true).unwrap();
        let revision = cart.revision();
        let second = cart.add_item("mug", price(0), true).unwrap();

        assert_eq!(cart.items().len(), 1);
        assert_eq!(first.id, second.id);
        assert_eq!(cart.revision(), revision);
    }

    #[test]
    fn test_gift_and_ordinary_lines_never_merge() {
        let mut cart = Cart::new("c1");
        cart.add_item("mug", price(300), false).unwrap();
        let gift = cart.add_item("mug", price(300), true).unwrap();

        assert_eq!(cart.items().len(), 2);
        assert_eq!(gift.unit_price, Money::zero());
        assert_eq!(gift.quantity, 1);
        assert_eq!(cart.subtotal(), price(300));
        assert_eq!(cart.item_count(), 2);
    }

    #[test]
    fn test_update_quantity_floor_removes() {
        let mut cart = Cart::new("c1");
        let a = cart.add_item("a", price(100), false).unwrap();
        let b = cart.add_item("b", price(100), false).unwrap();

        cart.update_quantity(&a.id, 0).unwrap();
        cart.update_quantity(&b.id, -3).unwrap();

        assert!(cart.is_empty());
        assert!(cart.items().iter().all(|i| i.quantity > 0));
    }

    #[test]
    fn test_update_quantity_on_gift_is_rejected() {
        let mut cart = Cart::new("c1");
        let gift = cart.add_item("mug", price(0), true).unwrap();
        let before = cart.clone();

        let err = cart.update_quantity(&gift.id, 3).unwrap_err();
        assert!(matches!(err, CartError::InvalidOperation { .. }));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_update_quantity_unknown_item() {
        let mut cart = Cart::new("c1");
        assert!(matches!(
            cart.update_quantity("nope", 2),
            Err(CartError::ItemNotFound(_))
        ));
        assert!(cart.update_quantity("nope", 0).is_ok());
    }

    #[test]
    fn test_remove_item_is_idempotent() {
        let mut cart = Cart::new("c1");
        let a = cart.add_item("a", price(100), false).unwrap();

        assert!(cart.remove_item(&a.id).is_some());
        let revision = cart.revision();
        assert!(cart.remove_item(&a.id).is_none());
        assert_eq!(cart.revision(), revision);
    }

    #[test]
    fn test_subtotal_excludes_gifts() {
        let now = Utc::now();
        let items = vec![
            CartItem {
                id: "1".to_string(),
                product_ref: "a".to_string(),
                name: None,
                unit_price: price(100),
                quantity: 2,
                is_gift: false,
                added_at: now,
            },
            CartItem {
                id: "2".to_string(),
                product_ref: "mug".to_string(),
                name: None,
                unit_price: price(999),
                quantity: 1,
                is_gift: true,
                added_at: now,
            },
        ];
        let cart = Cart::restore("c1", items, 2, now, now);

        assert_eq!(cart.subtotal(), price(200));
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_quantity_limit() {
        let mut cart = Cart::new("c1");
        cart.add_quantity("a", price(100), 999).unwrap();

        let err = cart.add_item("a", price(100), false).unwrap_err();
        assert_eq!(
            err,
            CartError::QuantityTooLarge {
                requested: 1000,
                max: MAX_ITEM_QUANTITY
            }
        );
        assert_eq!(cart.items()[0].quantity, 999);
    }

    #[test]
    fn test_cart_size_limit() {
        let mut cart = Cart::new("c1");
        for i in 0..MAX_CART_ITEMS {
            cart.add_item(&format!("p{i}"), price(100), false).unwrap();
        }
        let err = cart.add_item("one-more", price(100), false).unwrap_err();
        assert_eq!(err, CartError::CartTooLarge { max: MAX_CART_ITEMS });
    }

    #[test]
    fn test_negative_price_rejected() {
        let mut cart = Cart::new("c1");
        let err = cart.add_item("a", price(-1), false).unwrap_err();
        assert!(matches!(err, CartError::Validation(_)));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_remove_gifts_and_refs() {
        let mut cart = Cart::new("c1");
        cart.add_item("a", price(100), false).unwrap();
        cart.add_item("mug", price(0), true).unwrap();
        cart.add_item("tote", price(0), true).unwrap();
        assert_eq!(cart.gift_refs(), vec!["mug", "tote"]);

        let removed = cart.remove_gifts(&["tote".to_string(), "absent".to_string()]);
        assert_eq!(removed, vec!["tote"]);
        assert_eq!(cart.gift_refs(), vec!["mug"]);
    }

    #[test]
    fn test_add_product_freezes_name_and_price() {
        let product = ProductSummary {
            id: "tee".to_string(),
            slug: "black-tee".to_string(),
            name: "Black Tee".to_string(),
            price: price(2500),
            image_url: None,
            images: vec![],
            is_active: true,
        };
        let mut cart = Cart::new("c1");
        let line = cart.add_product(&product, 2, false).unwrap();

        assert_eq!(line.name.as_deref(), Some("Black Tee"));
        assert_eq!(line.line_total(), price(5000));
    }

    #[test]
    fn test_clear_bumps_revision_only_when_needed() {
        let mut cart = Cart::new("c1");
        cart.clear();
        assert_eq!(cart.revision(), 0);

        cart.add_item("a", price(100), false).unwrap();
        cart.clear();
        assert_eq!(cart.revision(), 2);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_price_and_quantity_bounds_keep_subtotal_exact() {
        let mut cart = Cart::new("c1");
        let err = cart
            .add_quantity("a", Money::from_cents(i64::MAX / 2), 3)
            .unwrap_err();
        assert!(matches!(
            err,
            CartError::Validation(ValidationError::OutOfRange { .. })
        ));
        assert!(cart.is_empty());

        let line = cart
            .add_quantity("a", Money::from_cents(MAX_UNIT_PRICE_CENTS), MAX_ITEM_QUANTITY)
            .unwrap();
        let err = cart.add_quantity("a", line.unit_price, i64::MAX).unwrap_err();
        assert!(matches!(err, CartError::QuantityTooLarge { .. }));
        assert_eq!(
            cart.subtotal().cents(),
            MAX_UNIT_PRICE_CENTS * MAX_ITEM_QUANTITY
        );
    }
}
