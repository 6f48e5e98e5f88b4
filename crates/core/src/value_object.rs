//! Value objects: equality by value, not identity.
//!
//! Money, quantities and stock levels are all plain numbers underneath. Wrapping
//! them keeps the sign rules (prices and stock are never negative, a cart line
//! quantity is always positive) in one place instead of at every call site.

use serde::{Deserialize, Serialize};

use crate::error::{CartError, CartResult};

/// Monetary amount in minor currency units (e.g. cents).
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(u64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub fn from_minor(minor: u64) -> Self {
        Self(minor)
    }

    pub fn minor(&self) -> u64 {
        self.0
    }

    /// Line amount for `quantity` units at this unit price.
    ///
    /// Saturates instead of wrapping; a total that large is already meaningless.
    pub fn times(self, quantity: Quantity) -> Money {
        Money(self.0.saturating_mul(quantity.get() as u64))
    }
}

impl core::ops::Add for Money {
    type Output = Money;

    fn add(self, rhs: Money) -> Money {
        Money(self.0.saturating_add(rhs.0))
    }
}

impl core::iter::Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money {
        iter.fold(Money::ZERO, |acc, m| acc + m)
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A strictly positive number of units held by a cart line.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Quantity(i64);

impl Quantity {
    /// Validate a raw quantity. Zero and negatives are rejected: removing a
    /// line is its own operation.
    pub fn new(raw: i64) -> CartResult<Self> {
        if raw <= 0 {
            return Err(CartError::validation(format!(
                "quantity must be positive, got {raw}"
            )));
        }
        Ok(Self(raw))
    }

    pub fn get(&self) -> i64 {
        self.0
    }
}

impl<'de> Deserialize<'de> for Quantity {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = i64::deserialize(deserializer)?;
        Quantity::new(raw).map_err(serde::de::Error::custom)
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Units of a product still free for reservation. Never negative.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct StockLevel(i64);

impl StockLevel {
    pub fn new(raw: i64) -> CartResult<Self> {
        if raw < 0 {
            return Err(CartError::validation(format!(
                "stock level cannot be negative, got {raw}"
            )));
        }
        Ok(Self(raw))
    }

    pub fn get(&self) -> i64 {
        self.0
    }

    /// Remove `units` from the free stock, or `None` if that would go negative.
    pub fn checked_take(self, units: i64) -> Option<StockLevel> {
        let remaining = self.0.checked_sub(units)?;
        (remaining >= 0).then_some(StockLevel(remaining))
    }

    /// Return `units` to the free stock.
    ///
    /// Fails rather than clamping when the level would overflow, so released
    /// units are never silently dropped.
    pub fn put_back(self, units: i64) -> CartResult<StockLevel> {
        if units < 0 {
            return Err(CartError::validation(format!(
                "cannot put back a negative number of units, got {units}"
            )));
        }
        self.0.checked_add(units).map(StockLevel).ok_or_else(|| {
            CartError::validation(format!(
                "stock level {} cannot take back {units} more units",
                self.0
            ))
        })
    }
}

impl<'de> Deserialize<'de> for StockLevel {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = i64::deserialize(deserializer)?;
        StockLevel::new(raw).map_err(serde::de::Error::custom)
    }
}

impl core::fmt::Display for StockLevel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantity_rejects_zero_and_negative() {
        assert!(Quantity::new(0).is_err());
        assert!(Quantity::new(-4).is_err());
        assert_eq!(Quantity::new(3).unwrap().get(), 3);
    }

    #[test]
    fn stock_level_rejects_negative() {
        assert!(StockLevel::new(-1).is_err());
        assert_eq!(StockLevel::new(0).unwrap().get(), 0);
    }

    #[test]
    fn checked_take_floors_at_zero() {
        let stock = StockLevel::new(5).unwrap();
        assert_eq!(stock.checked_take(5).unwrap().get(), 0);
        assert!(stock.checked_take(6).is_none());
    }

    #[test]
    fn put_back_adds_units() {
        let stock = StockLevel::new(3).unwrap();
        assert_eq!(stock.put_back(4).unwrap().get(), 7);
        assert!(stock.put_back(-1).is_err());
    }

    #[test]
    fn put_back_overflow_is_an_error_not_a_clamp() {
        let stock = StockLevel::new(i64::MAX - 1).unwrap();
        assert_eq!(stock.put_back(1).unwrap().get(), i64::MAX);
        assert!(matches!(stock.put_back(2), Err(CartError::Validation(_))));
    }

    #[test]
    fn money_times_quantity() {
        let price = Money::from_minor(10);
        assert_eq!(price.times(Quantity::new(2).unwrap()), Money::from_minor(20));
    }

    #[test]
    fn money_sums() {
        let total: Money = [Money::from_minor(20), Money::from_minor(15)].into_iter().sum();
        assert_eq!(total.minor(), 35);
        let empty: Money = core::iter::empty().sum();
        assert_eq!(empty, Money::ZERO);
    }

    #[test]
    fn quantity_deserialize_validates() {
        let ok: Quantity = serde_json::from_str("2").unwrap();
        assert_eq!(ok.get(), 2);
        assert!(serde_json::from_str::<Quantity>("0").is_err());
    }
}
