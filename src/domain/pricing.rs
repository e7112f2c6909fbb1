//! Fixed pricing tables: shipping rates, promo codes and tax.

use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::value_objects::ShippingOptionId;

/// Promo code that switches shipping to standard instead of discounting.
pub const FREESHIP_CODE: &str = "FREESHIP";

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingRate {
    pub id: ShippingOptionId,
    pub label: String,
    pub price: Decimal,
    /// Subtotal at or above which this option ships free. `None` never ships free.
    pub free_threshold: Option<Decimal>,
}

impl ShippingRate {
    fn new(id: &str, label: &str, price: Decimal, free_threshold: Option<Decimal>) -> Self {
        Self { id: ShippingOptionId::new(id), label: label.to_string(), price, free_threshold }
    }

    pub fn cost_for(&self, subtotal: Decimal) -> Decimal {
        match self.free_threshold {
            Some(threshold) if subtotal >= threshold => Decimal::ZERO,
            _ => self.price,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromoEffect {
    PercentOff(Decimal),
    FreeStandardShipping,
}

#[derive(Clone, Debug)]
pub struct PricingTable {
    shipping: Vec<ShippingRate>,
    promos: Vec<(String, PromoEffect)>,
    tax_rate: Decimal,
}

impl PricingTable {
    pub fn shipping_rates(&self) -> &[ShippingRate] { &self.shipping }
    pub fn tax_rate(&self) -> Decimal { self.tax_rate }

    pub fn shipping_rate(&self, id: &ShippingOptionId) -> Option<&ShippingRate> {
        self.shipping.iter().find(|r| &r.id == id)
    }

    /// Case-sensitive promo lookup.
    pub fn promo(&self, code: &str) -> Option<PromoEffect> {
        self.promos.iter().find(|(c, _)| c == code).map(|(_, effect)| *effect)
    }
}

impl Default for PricingTable {
    fn default() -> Self {
        Self {
            shipping: vec![
                ShippingRate::new(ShippingOptionId::STANDARD, "Standard Shipping (5-7 business days)", Decimal::new(599, 2), Some(Decimal::new(99, 0))),
                ShippingRate::new(ShippingOptionId::EXPRESS, "Express Shipping (2-3 business days)", Decimal::new(999, 2), Some(Decimal::new(150, 0))),
                ShippingRate::new(ShippingOptionId::OVERNIGHT, "Overnight Shipping", Decimal::new(2499, 2), None),
            ],
            promos: vec![
                ("SAVE10".to_string(), PromoEffect::PercentOff(Decimal::new(10, 0))),
                ("SAVE20".to_string(), PromoEffect::PercentOff(Decimal::new(20, 0))),
                ("WELCOME15".to_string(), PromoEffect::PercentOff(Decimal::new(15, 0))),
                (FREESHIP_CODE.to_string(), PromoEffect::FreeStandardShipping),
            ],
            tax_rate: Decimal::new(8, 2),
        }
    }
}
