use serde::{Deserialize, Serialize};

use crate::money::Money;

/// One selected image and how many units the client wants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartEntry {
    pub image_id: String,
    pub unit_price: Money,
    pub quantity: u32,
}

impl CartEntry {
    pub fn subtotal(&self) -> Money {
        self.unit_price.saturating_mul(self.quantity)
    }
}

/// Snapshot of a cart entry as submitted to checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct LineItem {
    pub image_id: String,
    pub quantity: u32,
    /// Price shown to the client. Checkout re-prices from the store.
    pub price: Money,
}

/// The client's selection while browsing a gallery.
///
/// The selected set is derived from the entries, so an image is selected
/// exactly when it has an entry. Entries keep the order they were first
/// selected in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    entries: Vec<CartEntry>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selecting an image already in the cart adds one more unit; deselecting
    /// drops the entry whatever its quantity.
    pub fn select(&mut self, image_id: &str, unit_price: Money, selected: bool) {
        if !selected {
            self.remove(image_id);
            return;
        }

        match self.position(image_id) {
            Some(index) => {
                let entry = &mut self.entries[index];
                entry.quantity = entry.quantity.saturating_add(1);
            }
            None => self.entries.push(CartEntry {
                image_id: image_id.to_string(),
                unit_price,
                quantity: 1,
            }),
        }
    }

    /// Overwrites the quantity of an existing entry. Zero or less removes it.
    /// Returns false when the image is not in the cart.
    pub fn set_quantity(&mut self, image_id: &str, quantity: i64) -> bool {
        let Some(index) = self.position(image_id) else {
            return false;
        };

        if quantity <= 0 {
            self.entries.remove(index);
        } else {
            self.entries[index].quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
        true
    }

    pub fn remove(&mut self, image_id: &str) -> bool {
        match self.position(image_id) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_selected(&self, image_id: &str) -> bool {
        self.position(image_id).is_some()
    }

    pub fn selected_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.image_id.as_str())
    }

    pub fn entries(&self) -> &[CartEntry] {
        &self.entries
    }

    pub fn quantity_of(&self, image_id: &str) -> u32 {
        self.position(image_id)
            .map(|index| self.entries[index].quantity)
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of units across all entries.
    pub fn item_count(&self) -> u32 {
        self.entries
            .iter()
            .fold(0u32, |count, entry| count.saturating_add(entry.quantity))
    }

    pub fn total(&self) -> Money {
        self.entries.iter().map(CartEntry::subtotal).sum()
    }

    pub fn line_items(&self) -> Vec<LineItem> {
        self.entries
            .iter()
            .map(|entry| LineItem {
                image_id: entry.image_id.clone(),
                quantity: entry.quantity,
                price: entry.unit_price,
            })
            .collect()
    }

    fn position(&self, image_id: &str) -> Option<usize> {
        self.entries
            .iter()
            .position(|entry| entry.image_id == image_id)
    }
}
