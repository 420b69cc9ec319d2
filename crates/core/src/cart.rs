//! The shopping cart value and its mutation rules.
//!
//! A [`Cart`] is the in-progress order a shopper is assembling. It holds an
//! ordered list of line items that all belong to exactly one shop. The type
//! is pure: persistence and change notification live in the storefront's
//! `CartStore`, which wraps this value.
//!
//! # Rules
//!
//! - Adding an item already in the cart increments its quantity; otherwise a
//!   new line is appended with quantity 1.
//! - Adding an item from a different shop is rejected with [`CartConflict`]
//!   and leaves the cart untouched. [`Cart::replace_with`] is the explicit
//!   "empty the cart and start an order from this shop" decision.
//! - Removing decrements by exactly one; a line whose quantity would reach
//!   zero is dropped.
//! - [`Cart::count`] is the number of distinct lines, not units.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{MenuItemId, Price, ShopId};

/// One distinct menu item and its quantity within a cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineItem {
    pub item_id: MenuItemId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    pub price: Price,
    pub shop_id: ShopId,
    #[serde(default)]
    pub shop_name: String,
    /// Always at least 1 inside a [`Cart`].
    pub quantity: u32,
}

impl CartLineItem {
    /// Price of this line (`price × quantity`).
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.price.times(self.quantity)
    }
}

/// Rejected attempt to mix shops in one cart.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cart already holds items from {cart_shop_name} ({cart_shop}); cannot add an item from shop {item_shop}")]
pub struct CartConflict {
    /// Shop the cart currently belongs to.
    pub cart_shop: ShopId,
    /// Display name of the cart's shop.
    pub cart_shop_name: String,
    /// Shop of the rejected item.
    pub item_shop: ShopId,
}

/// Result of a successful [`Cart::add`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// A new line was appended with quantity 1.
    Appended,
    /// An existing line's quantity was incremented.
    Incremented { quantity: u32 },
}

/// Result of [`Cart::remove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveOutcome {
    /// Quantity dropped by one and the line remains.
    Decremented { quantity: u32 },
    /// The line had quantity 1 and was removed.
    Removed,
    /// No line with that item ID exists.
    Absent,
}

/// A single-shop shopping cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLineItem>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Build a cart from stored lines, dropping any line with quantity 0.
    #[must_use]
    pub fn from_lines(mut lines: Vec<CartLineItem>) -> Self {
        lines.retain(|line| line.quantity > 0);
        Self { lines }
    }

    /// Add one unit of `item`.
    ///
    /// The incoming `quantity` is ignored: a new line always starts at 1.
    ///
    /// # Errors
    ///
    /// Returns [`CartConflict`] if the cart holds items from another shop.
    pub fn add(&mut self, item: CartLineItem) -> Result<AddOutcome, CartConflict> {
        if let Some(first) = self.lines.first()
            && first.shop_id != item.shop_id
        {
            return Err(CartConflict {
                cart_shop: first.shop_id.clone(),
                cart_shop_name: first.shop_name.clone(),
                item_shop: item.shop_id,
            });
        }

        if let Some(line) = self.lines.iter_mut().find(|l| l.item_id == item.item_id) {
            line.quantity = line.quantity.saturating_add(1);
            return Ok(AddOutcome::Incremented {
                quantity: line.quantity,
            });
        }

        self.lines.push(CartLineItem { quantity: 1, ..item });
        Ok(AddOutcome::Appended)
    }

    /// Empty the cart and add `item`, switching the cart to the item's shop.
    pub fn replace_with(&mut self, item: CartLineItem) {
        self.lines.clear();
        self.lines.push(CartLineItem { quantity: 1, ..item });
    }

    /// Remove one unit of `item_id`.
    pub fn remove(&mut self, item_id: &MenuItemId) -> RemoveOutcome {
        let Some(pos) = self.lines.iter().position(|l| &l.item_id == item_id) else {
            return RemoveOutcome::Absent;
        };

        let Some(line) = self.lines.get_mut(pos) else {
            return RemoveOutcome::Absent;
        };

        if line.quantity > 1 {
            line.quantity -= 1;
            RemoveOutcome::Decremented {
                quantity: line.quantity,
            }
        } else {
            self.lines.remove(pos);
            RemoveOutcome::Removed
        }
    }

    /// Subtract `submitted` lines, as placed in an order, from the cart.
    ///
    /// Quantities added since the submission stay. Returns whether the cart
    /// changed.
    pub fn settle(&mut self, submitted: &[CartLineItem]) -> bool {
        let before = self.lines.clone();
        for placed in submitted {
            if let Some(line) = self.lines.iter_mut().find(|l| l.item_id == placed.item_id) {
                line.quantity = line.quantity.saturating_sub(placed.quantity);
            }
        }
        self.lines.retain(|line| line.quantity > 0);
        self.lines != before
    }

    /// Remove every line.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of `price × quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.lines.iter().map(CartLineItem::line_total).sum()
    }

    /// Number of distinct line items (the navbar badge value).
    #[must_use]
    pub fn count(&self) -> usize {
        self.lines.len()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn units(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Quantity of `item_id` in the cart, or 0.
    #[must_use]
    pub fn quantity_of(&self, item_id: &MenuItemId) -> u32 {
        self.lines
            .iter()
            .find(|l| &l.item_id == item_id)
            .map_or(0, |l| l.quantity)
    }

    /// The shop this cart belongs to, if it has any lines.
    #[must_use]
    pub fn shop(&self) -> Option<(&ShopId, &str)> {
        self.lines
            .first()
            .map(|l| (&l.shop_id, l.shop_name.as_str()))
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// The cart's lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLineItem] {
        &self.lines
    }

    /// Consume the cart and return its lines.
    #[must_use]
    pub fn into_lines(self) -> Vec<CartLineItem> {
        self.lines
    }
}
