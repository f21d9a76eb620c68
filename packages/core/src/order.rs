use std::collections::HashMap;

use serde::Serialize;

use crate::money::{Money, MoneyError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PricingError {
    #[error("no line items")]
    Empty,
    #[error("image {0} is not part of this gallery")]
    UnknownImage(String),
    #[error("quantity for image {0} must be at least 1")]
    ZeroQuantity(String),
    #[error("order total overflowed")]
    Overflow,
}

impl From<MoneyError> for PricingError {
    fn from(_: MoneyError) -> Self {
        PricingError::Overflow
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedLine {
    pub image_id: String,
    pub quantity: u32,
    pub unit_price: Money,
    pub subtotal: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedOrder {
    pub lines: Vec<PricedLine>,
    pub total: Money,
}

/// Prices requested `(image_id, quantity)` pairs against the stored catalog.
///
/// Repeated ids are merged into one line (first occurrence keeps its place).
/// Unit prices always come from `catalog`; whatever price the client saw is
/// not an input here.
pub fn price_order<'a, I>(
    requested: I,
    catalog: &HashMap<String, Money>,
) -> Result<PricedOrder, PricingError>
where
    I: IntoIterator<Item = (&'a str, u32)>,
{
    let mut merged: Vec<(&'a str, u32)> = Vec::new();
    for (image_id, quantity) in requested {
        if quantity == 0 {
            return Err(PricingError::ZeroQuantity(image_id.to_string()));
        }
        match merged.iter_mut().find(|(id, _)| *id == image_id) {
            Some((_, existing)) => {
                *existing = existing.checked_add(quantity).ok_or(PricingError::Overflow)?
            }
            None => merged.push((image_id, quantity)),
        }
    }

    if merged.is_empty() {
        return Err(PricingError::Empty);
    }

    let mut lines = Vec::with_capacity(merged.len());
    let mut total = Money::ZERO;
    for (image_id, quantity) in merged {
        let unit_price = *catalog
            .get(image_id)
            .ok_or_else(|| PricingError::UnknownImage(image_id.to_string()))?;
        let subtotal = unit_price.checked_mul(quantity)?;
        total = total.checked_add(subtotal)?;
        lines.push(PricedLine {
            image_id: image_id.to_string(),
            quantity,
            unit_price,
            subtotal,
        });
    }

    Ok(PricedOrder { lines, total })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> HashMap<String, Money> {
        HashMap::from([
            ("a".to_string(), Money::from_minor(500).unwrap()),
            ("b".to_string(), Money::from_minor(300).unwrap()),
        ])
    }

    #[test]
    fn uses_stored_prices() {
        let order = price_order([("a", 2), ("b", 1)], &catalog()).unwrap();
        assert_eq!(order.total.minor(), 1300);
        assert_eq!(order.lines[0].subtotal.minor(), 1000);
        assert_eq!(order.lines[1].unit_price.minor(), 300);
    }

    #[test]
    fn merges_repeated_images() {
        let order = price_order([("b", 1), ("a", 1), ("b", 2)], &catalog()).unwrap();
        assert_eq!(order.lines.len(), 2);
        assert_eq!(order.lines[0].image_id, "b");
        assert_eq!(order.lines[0].quantity, 3);
        assert_eq!(order.total.minor(), 1400);
    }

    #[test]
    fn rejects_bad_requests() {
        let empty: [(&str, u32); 0] = [];
        assert_eq!(price_order(empty, &catalog()), Err(PricingError::Empty));
        assert_eq!(
            price_order([("zzz", 1)], &catalog()),
            Err(PricingError::UnknownImage("zzz".into()))
        );
        assert_eq!(
            price_order([("a", 0)], &catalog()),
            Err(PricingError::ZeroQuantity("a".into()))
        );
    }
}
