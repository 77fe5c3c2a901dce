//! Cart Aggregate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::value_objects::LineKey;
use crate::{Result, StorefrontError};

/// One row in the cart, unique per (product, variant) pair. Prices are in
/// minor currency units. `max_inventory` is the last-known stock level and
/// only advisory: the checkout backend re-checks availability and is the
/// actual gate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub variant_id: Option<String>,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub price: i64,
    pub quantity: u32,
    pub image_url: Option<String>,
    pub sku: Option<String>,
    pub max_inventory: Option<u32>,
}

impl CartLine {
    pub fn key(&self) -> LineKey {
        LineKey::new(self.product_id.clone(), self.variant_id.clone())
    }

    pub fn line_total(&self) -> i64 {
        self.price * i64::from(self.quantity)
    }

    /// Clamp to [1, max_inventory]. A cap of zero still yields one: the cap
    /// is advisory, and sold-out lines are rejected by the checkout backend
    /// rather than silently dropped here.
    fn clamp(&self, quantity: u32) -> u32 {
        let upper = self.max_inventory.unwrap_or(u32::MAX);
        quantity.min(upper).max(1)
    }
}

/// Ordered collection of cart lines. Insertion order is preserved for
/// display. Totals are derived from the lines on every read so they can
/// never drift from the line data.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Cart {
    items: Vec<CartLine>,
    updated_at: Option<DateTime<Utc>>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn items(&self) -> &[CartLine] {
        &self.items
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn updated_at(&self) -> Option<DateTime<Utc>> {
        self.updated_at
    }

    /// Sum of quantities across all lines.
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Sum of price x quantity across all lines, in minor units.
    pub fn subtotal(&self) -> i64 {
        self.items.iter().map(|i| i.line_total()).sum()
    }

    /// Merge the line into the cart. An existing line with the same
    /// (product, variant) identity has its quantity incremented; the
    /// incoming line's metadata (price, name, inventory cap) replaces the
    /// stored copy so a stale tab cannot pin an outdated price. Quantities
    /// are clamped to the advisory inventory cap.
    pub fn add_item(&mut self, line: CartLine, quantity: u32) {
        let key = line.key();
        if let Some(existing) = self.items.iter_mut().find(|i| i.key() == key) {
            let merged = existing.quantity.saturating_add(quantity);
            *existing = line;
            existing.quantity = existing.clamp(merged);
        } else {
            let mut line = line;
            line.quantity = line.clamp(quantity);
            self.items.push(line);
        }
        self.touch();
    }

    /// Set the quantity of an existing line. Zero removes the line; any
    /// other value is clamped to the advisory inventory cap.
    pub fn update_quantity(&mut self, key: &LineKey, quantity: u32) -> Result<()> {
        let line = self
            .items
            .iter_mut()
            .find(|i| &i.key() == key)
            .ok_or(StorefrontError::LineNotFound)?;
        if quantity == 0 {
            self.items.retain(|i| &i.key() != key);
        } else {
            line.quantity = line.clamp(quantity);
        }
        self.touch();
        Ok(())
    }

    /// Delete the matching line. No-op if absent.
    pub fn remove_item(&mut self, key: &LineKey) {
        let before = self.items.len();
        self.items.retain(|i| &i.key() != key);
        if self.items.len() != before {
            self.touch();
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.touch();
    }

    fn touch(&mut self) {
        self.updated_at = Some(Utc::now());
    }
}
