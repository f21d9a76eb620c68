use std::fmt;
use std::iter::Sum;
use std::ops::Add;

use serde::{Deserialize, Deserializer, Serialize, Serializer, de};

/// Largest amount accepted from the wire, in major units.
const MAX_MAJOR: f64 = 1_000_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, thiserror::Error)]
pub enum MoneyError {
    #[error("amount must not be negative")]
    Negative,
    #[error("amount must be a finite number")]
    NotFinite,
    #[error("amount is too large")]
    TooLarge,
    #[error("amount overflowed")]
    Overflow,
}

/// A non-negative amount held in minor currency units (cents).
///
/// On the wire it travels as a number in major units (`12.5` is 1250 cents).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[cfg_attr(feature = "openapi", schema(value_type = f64))]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_minor(minor: i64) -> Result<Self, MoneyError> {
        if minor < 0 {
            return Err(MoneyError::Negative);
        }
        Ok(Money(minor))
    }

    /// Converts a major-unit amount, rounding to the nearest minor unit.
    pub fn from_major(major: f64) -> Result<Self, MoneyError> {
        if !major.is_finite() {
            return Err(MoneyError::NotFinite);
        }
        if major < 0.0 {
            return Err(MoneyError::Negative);
        }
        if major > MAX_MAJOR {
            return Err(MoneyError::TooLarge);
        }
        Ok(Money((major * 100.0).round() as i64))
    }

    pub fn minor(self) -> i64 {
        self.0
    }

    pub fn to_major(self) -> f64 {
        self.0 as f64 / 100.0
    }

    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Money) -> Result<Money, MoneyError> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or(MoneyError::Overflow)
    }

    pub fn checked_mul(self, quantity: u32) -> Result<Money, MoneyError> {
        self.0
            .checked_mul(i64::from(quantity))
            .map(Money)
            .ok_or(MoneyError::Overflow)
    }

    /// Saturating variant used for client-side display totals.
    pub fn saturating_mul(self, quantity: u32) -> Money {
        Money(self.0.saturating_mul(i64::from(quantity)))
    }
}

impl Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, Add::add)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.0 / 100, self.0 % 100)
    }
}

impl Serialize for Money {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(self.to_major())
    }
}

impl<'de> Deserialize<'de> for Money {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let major = f64::deserialize(deserializer)?;
        Money::from_major(major).map_err(de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn major_amounts_round_to_nearest_cent() {
        assert_eq!(Money::from_major(5.0).unwrap().minor(), 500);
        assert_eq!(Money::from_major(19.99).unwrap().minor(), 1999);
        assert_eq!(Money::from_major(0.125).unwrap().minor(), 13);
        assert_eq!(Money::from_major(0.004).unwrap().minor(), 0);
        assert_eq!(Money::from_major(0.0).unwrap(), Money::ZERO);
    }

    #[test]
    fn rejects_invalid_amounts() {
        assert_eq!(Money::from_major(-1.0), Err(MoneyError::Negative));
        assert_eq!(Money::from_major(f64::NAN), Err(MoneyError::NotFinite));
        assert_eq!(Money::from_major(f64::INFINITY), Err(MoneyError::NotFinite));
        assert_eq!(Money::from_major(2e9), Err(MoneyError::TooLarge));
        assert_eq!(Money::from_minor(-5), Err(MoneyError::Negative));
    }

    #[test]
    fn wire_format_is_major_units() {
        let price: Money = serde_json::from_str("12.5").unwrap();
        assert_eq!(price.minor(), 1250);
        assert_eq!(serde_json::to_string(&price).unwrap(), "12.5");
        assert!(serde_json::from_str::<Money>("-3").is_err());
    }

    #[test]
    fn arithmetic() {
        let five = Money::from_minor(500).unwrap();
        assert_eq!(five.checked_mul(3).unwrap().minor(), 1500);
        assert_eq!(Money::from_minor(i64::MAX).unwrap().checked_mul(2), Err(MoneyError::Overflow));
        let sum: Money = [five, five, Money::from_minor(3).unwrap()].into_iter().sum();
        assert_eq!(sum.minor(), 1003);
        assert_eq!(sum.to_string(), "10.03");
    }
}
