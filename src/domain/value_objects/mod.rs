//! Value Objects for the storefront cart

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Ceiling applied to a line item whose stock is unknown or zero.
pub const DEFAULT_QUANTITY_CEILING: u32 = 10;

/// Money value object
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money { amount: Decimal, currency: String }

impl Money {
    pub fn new(amount: Decimal, currency: &str) -> Self { Self { amount, currency: currency.to_string() } }
    pub fn usd(amount: Decimal) -> Self { Self::new(amount, "USD") }
    pub fn zero(currency: &str) -> Self { Self::new(Decimal::ZERO, currency) }
    pub fn amount(&self) -> Decimal { self.amount }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn multiply(&self, qty: u32) -> Money { Money::new(self.amount * Decimal::from(qty), &self.currency) }

    /// Rounds to cents, half away from zero, for display.
    pub fn rounded(&self) -> Money {
        Money::new(
            self.amount.round_dp_with_strategy(2, rust_decimal::RoundingStrategy::MidpointAwayFromZero),
            &self.currency,
        )
    }
}

impl Default for Money { fn default() -> Self { Self::zero("USD") } }

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{} {}", self.rounded().amount, self.currency) }
}

/// Quantity of a single cart line, always at least one.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    pub const ONE: Quantity = Quantity(1);

    /// Clamps a requested quantity into `1..=ceiling`.
    ///
    /// Returns `None` for requests below one; callers treat that as a rejected update.
    pub fn clamped(requested: i64, ceiling: u32) -> Option<Self> {
        if requested < 1 { return None; }
        let ceiling = ceiling.max(1);
        let value = u32::try_from(requested).unwrap_or(u32::MAX).min(ceiling);
        Some(Self(value))
    }

    pub fn value(&self) -> u32 { self.0 }

    pub fn capped(&self, ceiling: u32) -> Self { Self(self.0.min(ceiling.max(1))) }

    /// One more unit, held at `ceiling`.
    pub fn incremented(&self, ceiling: u32) -> Self { Self(self.0.saturating_add(1).min(ceiling.max(1))) }
}

impl Default for Quantity { fn default() -> Self { Self::ONE } }

impl From<Quantity> for u32 {
    fn from(q: Quantity) -> u32 { q.0 }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if value == 0 { Err(QuantityError::Zero) } else { Ok(Self(value)) }
    }
}

#[derive(Debug, Clone)] pub enum QuantityError { Zero }
impl std::error::Error for QuantityError {}
impl fmt::Display for QuantityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "Quantity must be at least 1") }
}

/// Identifier of a shipping option. Any string is accepted; unknown ids price at zero.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShippingOptionId(String);

impl ShippingOptionId {
    pub const STANDARD: &'static str = "standard";
    pub const EXPRESS: &'static str = "express";
    pub const OVERNIGHT: &'static str = "overnight";

    pub fn new(value: impl Into<String>) -> Self { Self(value.into()) }
    pub fn standard() -> Self { Self::new(Self::STANDARD) }
    pub fn as_str(&self) -> &str { &self.0 }
}

impl Default for ShippingOptionId { fn default() -> Self { Self::standard() } }

impl fmt::Display for ShippingOptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_money_multiply() {
        let m = Money::usd(Decimal::new(1999, 2));
        assert_eq!(m.multiply(3).amount(), Decimal::new(5997, 2));
    }

    #[test]
    fn test_money_rounded() {
        assert_eq!(Money::usd(Decimal::new(12345, 3)).rounded().amount(), Decimal::new(1235, 2));
        assert_eq!(Money::usd(Decimal::new(8, 0)).to_string(), "8 USD");
    }

    #[test]
    fn test_quantity_clamped() {
        assert_eq!(Quantity::clamped(0, 5), None);
        assert_eq!(Quantity::clamped(-3, 5), None);
        assert_eq!(Quantity::clamped(4, 5).unwrap().value(), 4);
        assert_eq!(Quantity::clamped(99, 5).unwrap().value(), 5);
        assert_eq!(Quantity::clamped(i64::MAX, 10).unwrap().value(), 10);
        assert_eq!(Quantity::clamped(3, 0).unwrap().value(), 1);
    }

    #[test]
    fn test_quantity_incremented_holds_at_ceiling() {
        let q = Quantity::ONE.incremented(2);
        assert_eq!(q.value(), 2);
        assert_eq!(q.incremented(2).value(), 2);
        assert_eq!(Quantity::clamped(8, 10).unwrap().capped(3).value(), 3);
        assert_eq!(Quantity::ONE.capped(0).value(), 1);
    }

    #[test]
    fn test_quantity_rejects_zero_on_deserialize() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("4").unwrap().value(), 4);
    }

    #[test]
    fn test_shipping_option_default() {
        assert_eq!(ShippingOptionId::default().as_str(), "standard");
        assert_eq!(serde_json::to_string(&ShippingOptionId::new("express")).unwrap(), "\"express\"");
    }
}
