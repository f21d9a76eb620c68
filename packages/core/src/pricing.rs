use std::collections::BTreeMap;

use crate::money::Money;

/// Photographer-side price edits for one gallery, held locally until saved.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PriceSheet {
    loaded: BTreeMap<String, Money>,
    current: BTreeMap<String, Money>,
}

impl PriceSheet {
    pub fn new<I, S>(images: I) -> Self
    where
        I: IntoIterator<Item = (S, Money)>,
        S: Into<String>,
    {
        let loaded: BTreeMap<String, Money> = images
            .into_iter()
            .map(|(id, price)| (id.into(), price))
            .collect();
        Self {
            current: loaded.clone(),
            loaded,
        }
    }

    /// Assigns one price to every image in the sheet.
    pub fn set_all(&mut self, price: Money) {
        for value in self.current.values_mut() {
            *value = price;
        }
    }

    /// Overrides a single image. Unknown ids are refused.
    pub fn set(&mut self, image_id: &str, price: Money) -> bool {
        match self.current.get_mut(image_id) {
            Some(value) => {
                *value = price;
                true
            }
            None => false,
        }
    }

    pub fn price_of(&self, image_id: &str) -> Option<Money> {
        self.current.get(image_id).copied()
    }

    pub fn len(&self) -> usize {
        self.current.len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty()
    }

    /// Entries whose price differs from what was loaded.
    pub fn changes(&self) -> BTreeMap<String, Money> {
        self.current
            .iter()
            .filter(|(id, price)| self.loaded.get(*id) != Some(*price))
            .map(|(id, price)| (id.clone(), *price))
            .collect()
    }

    /// The full `{imageId: price}` mapping submitted on save.
    pub fn to_update(&self) -> BTreeMap<String, Money> {
        self.current.clone()
    }

    /// Marks the current prices as persisted.
    pub fn mark_saved(&mut self) {
        self.loaded = self.current.clone();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dollars(amount: f64) -> Money {
        Money::from_major(amount).unwrap()
    }

    #[test]
    fn bulk_then_individual_override() {
        let ids = ["i1", "i2", "i3", "i4", "i5"];
        let mut sheet = PriceSheet::new(ids.iter().map(|id| (*id, Money::ZERO)));

        sheet.set_all(dollars(10.0));
        assert!(sheet.set("i3", dollars(15.0)));

        let update = sheet.to_update();
        assert_eq!(update.len(), 5);
        assert_eq!(update.values().filter(|p| **p == dollars(10.0)).count(), 4);
        assert_eq!(update["i3"], dollars(15.0));
    }

    #[test]
    fn unknown_images_are_refused() {
        let mut sheet = PriceSheet::new([("a", dollars(1.0))]);
        assert!(!sheet.set("b", dollars(2.0)));
        assert_eq!(sheet.price_of("b"), None);
        assert_eq!(sheet.len(), 1);
    }

    #[test]
    fn changes_track_the_loaded_state() {
        let mut sheet = PriceSheet::new([("a", dollars(1.0)), ("b", dollars(2.0))]);
        assert!(sheet.changes().is_empty());

        sheet.set("a", dollars(4.0));
        sheet.set("b", dollars(2.0));
        let changes = sheet.changes();
        assert_eq!(changes.len(), 1);
        assert_eq!(changes["a"], dollars(4.0));

        sheet.mark_saved();
        assert!(sheet.changes().is_empty());
    }
}
