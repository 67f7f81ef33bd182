//! Cart store - the client-held collection of items selected before checkout.
//!
//! The cart keeps one line per distinct menu item id, in the order items were
//! first added. Quantities are always positive: a line driven to zero or below
//! is removed rather than kept. Quantities never exceed [`MAX_LINE_QUANTITY`].

use crate::errors::{Error, Result};
use crate::models::{CartLine, MAX_LINE_QUANTITY, MenuItem};
use std::fmt;
use tracing::warn;

/// Callback fired after an item has been added to the cart.
pub type ItemAddedHook = Box<dyn Fn(&MenuItem) + Send + Sync>;

/// In-memory cart for one point-of-sale session.
#[derive(Default)]
pub struct Cart {
    lines: Vec<CartLine>,
    on_item_added: Option<ItemAddedHook>,
}

impl fmt::Debug for Cart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cart")
            .field("lines", &self.lines)
            .field("has_hook", &self.on_item_added.is_some())
            .finish()
    }
}

impl Cart {
    /// Creates an empty cart.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the hook the presentation layer uses to show an
    /// "item added" notification.
    pub fn set_on_item_added(&mut self, hook: ItemAddedHook) {
        self.on_item_added = Some(hook);
    }

    /// Adds one unit of `item`, merging with an existing line for the same id.
    ///
    /// A line already at [`MAX_LINE_QUANTITY`] is left unchanged.
    pub fn add_item(&mut self, item: MenuItem) {
        if let Some(line) = self.lines.iter_mut().find(|l| l.item.id == item.id) {
            if line.quantity >= MAX_LINE_QUANTITY {
                warn!(item_id = %item.id, "Cart line is at its maximum quantity");
                return;
            }
            line.quantity += 1;
        } else {
            self.lines.push(CartLine {
                item: item.clone(),
                quantity: 1,
            });
        }

        if let Some(hook) = &self.on_item_added {
            hook(&item);
        }
    }

    /// Sets the quantity of a line. Zero or negative removes the line, an
    /// unknown id is ignored.
    ///
    /// # Errors
    /// Returns [`Error::InvalidQuantity`] above [`MAX_LINE_QUANTITY`]; the
    /// line is left as it was.
    pub fn update_quantity(&mut self, item_id: &str, quantity: i64) -> Result<()> {
        if quantity <= 0 {
            self.remove_item(item_id);
            return Ok(());
        }

        let quantity = u32::try_from(quantity)
            .ok()
            .filter(|q| *q <= MAX_LINE_QUANTITY)
            .ok_or_else(|| Error::InvalidQuantity {
                item_id: item_id.to_string(),
                quantity,
            })?;
        if let Some(line) = self.lines.iter_mut().find(|l| l.item.id == item_id) {
            line.quantity = quantity;
        }
        Ok(())
    }

    /// Removes the line for `item_id` if present.
    pub fn remove_item(&mut self, item_id: &str) {
        self.lines.retain(|l| l.item.id != item_id);
    }

    /// Empties the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of `price * quantity` over all lines.
    #[must_use]
    pub fn total(&self) -> f64 {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.lines.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Returns true when the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Owned copy of the lines, used as the checkout snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Vec<CartLine> {
        self.lines.clone()
    }
}
