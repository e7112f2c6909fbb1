//! Cart Aggregate

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::aggregates::line_item::{CartLineItem, LineItemCandidate};
use crate::domain::checkout::{self, CheckoutError, CheckoutReceipt};
use crate::domain::events::CartEvent;
use crate::domain::pricing::{PricingTable, PromoEffect};
use crate::domain::value_objects::{Money, Quantity, ShippingOptionId};
use crate::snapshot::CartSnapshot;

#[derive(Clone, Debug)]
pub struct Cart {
    id: String,
    items: Vec<CartLineItem>,
    promo_code: String,
    discount_percent: Decimal,
    shipping_option: ShippingOptionId,
    currency: String,
    pricing: Arc<PricingTable>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    events: Vec<CartEvent>,
}

/// Items and every derived total, rounded for display.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub items: Vec<CartLineItem>,
    pub item_count: u32,
    pub promo_code: String,
    pub discount_percent: Decimal,
    pub shipping_option: ShippingOptionId,
    pub subtotal: Money,
    pub shipping: Money,
    pub tax: Money,
    pub discount: Money,
    pub savings: Money,
    pub amount_to_free_shipping: Option<Money>,
    pub total: Money,
}

impl Cart {
    pub fn new(currency: &str) -> Self { Self::with_pricing(currency, Arc::new(PricingTable::default())) }

    pub fn with_pricing(currency: &str, pricing: Arc<PricingTable>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7().to_string(), items: vec![], promo_code: String::new(),
            discount_percent: Decimal::ZERO, shipping_option: ShippingOptionId::default(),
            currency: currency.to_string(), pricing, created_at: now, updated_at: now, events: vec![],
        }
    }

    /// Rehydrates a cart from a persisted snapshot.
    ///
    /// The discount is re-derived from the promo table; a stored code that is no longer
    /// valid is dropped. Quantities are capped at each item's ceiling, items with
    /// out-of-range prices are dropped, and duplicate ids keep their first occurrence.
    pub fn from_snapshot(snapshot: CartSnapshot, currency: &str, pricing: Arc<PricingTable>) -> Self {
        let mut cart = Self::with_pricing(currency, pricing);
        for mut item in snapshot.items {
            if cart.items.iter().any(|i| i.id == item.id) {
                warn!(item_id = %item.id, "dropping duplicate line item from snapshot");
                continue;
            }
            if let Err(e) = item.check_prices() {
                warn!(item_id = %item.id, error = %e, "dropping unpriceable line item from snapshot");
                continue;
            }
            item.quantity = item.quantity.capped(item.quantity_ceiling());
            cart.items.push(item);
        }
        cart.shipping_option = snapshot.shipping_option;
        if !snapshot.promo_code.is_empty() {
            match cart.pricing.promo(&snapshot.promo_code) {
                Some(PromoEffect::PercentOff(percent)) => {
                    cart.promo_code = snapshot.promo_code;
                    cart.discount_percent = percent;
                }
                Some(PromoEffect::FreeStandardShipping) => cart.promo_code = snapshot.promo_code,
                None => warn!(code = %snapshot.promo_code, "stored promo code is no longer valid, dropping it"),
            }
        }
        cart
    }

    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items.clone(),
            promo_code: self.promo_code.clone(),
            shipping_option: self.shipping_option.clone(),
        }
    }

    pub fn id(&self) -> &str { &self.id }
    pub fn items(&self) -> &[CartLineItem] { &self.items }
    pub fn currency(&self) -> &str { &self.currency }
    pub fn promo_code(&self) -> &str { &self.promo_code }
    pub fn discount_percent(&self) -> Decimal { self.discount_percent }
    pub fn shipping_option(&self) -> &ShippingOptionId { &self.shipping_option }
    pub fn pricing(&self) -> &PricingTable { &self.pricing }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn updated_at(&self) -> DateTime<Utc> { self.updated_at }
    pub fn is_empty(&self) -> bool { self.items.is_empty() }
    pub fn item(&self, id: &str) -> Option<&CartLineItem> { self.items.iter().find(|i| i.id == id) }

    /// Total units across all lines.
    pub fn item_count(&self) -> u32 { self.items.iter().map(|i| i.quantity.value()).sum() }

    /// Adds one unit of the candidate. Invalid candidates are logged and ignored.
    pub fn add_to_cart(&mut self, candidate: LineItemCandidate) {
        let new_item = match candidate.into_new_item() {
            Ok(item) => item,
            Err(e) => {
                warn!(error = %e, "rejected add to cart");
                return;
            }
        };

        if let Some(existing) = self.items.iter_mut().find(|i| i.id == new_item.id()) {
            let next = existing.quantity.incremented(existing.quantity_ceiling());
            if next == existing.quantity {
                debug!(item_id = %existing.id, quantity = next.value(), "item already at quantity ceiling");
                return;
            }
            existing.quantity = next;
            let event = CartEvent::QuantityChanged { item_id: existing.id.clone(), quantity: next.value() };
            self.raise_event(event);
        } else {
            let item = new_item.into_line_item();
            debug!(item_id = %item.id, "adding item to cart");
            let event = CartEvent::ItemAdded { item_id: item.id.clone(), quantity: item.quantity.value() };
            self.items.push(item);
            self.raise_event(event);
        }
        self.touch();
    }

    /// Sets a line's quantity, clamped to its ceiling. Quantities below one are logged and ignored.
    pub fn update_quantity(&mut self, id: &str, quantity: i64) {
        let Some(item) = self.items.iter_mut().find(|i| i.id == id) else { return };
        let Some(next) = Quantity::clamped(quantity, item.quantity_ceiling()) else {
            warn!(item_id = %id, quantity, "rejected quantity update");
            return;
        };
        if next == item.quantity { return; }
        item.quantity = next;
        self.raise_event(CartEvent::QuantityChanged { item_id: id.to_string(), quantity: next.value() });
        self.touch();
    }

    pub fn remove_from_cart(&mut self, id: &str) {
        let before = self.items.len();
        self.items.retain(|i| i.id != id);
        if self.items.len() == before { return; }
        self.raise_event(CartEvent::ItemRemoved { item_id: id.to_string() });
        self.touch();
    }

    /// Wishlists are not modeled; the item simply leaves the cart.
    pub fn move_to_wishlist(&mut self, id: &str) { self.remove_from_cart(id); }

    pub fn clear_cart(&mut self) {
        self.items.clear();
        self.raise_event(CartEvent::Cleared);
        self.touch();
    }

    /// Applies a promo code. Returns `false` and leaves the cart untouched when the code is unknown.
    ///
    /// `FREESHIP` does not discount: it switches shipping to standard and zeroes the discount.
    pub fn apply_promo_code(&mut self, code: &str) -> bool {
        let Some(effect) = self.pricing.promo(code) else {
            debug!(code, "unknown promo code");
            return false;
        };
        match effect {
            PromoEffect::PercentOff(percent) => self.discount_percent = percent,
            PromoEffect::FreeStandardShipping => {
                self.discount_percent = Decimal::ZERO;
                self.set_shipping_option(ShippingOptionId::STANDARD);
            }
        }
        self.promo_code = code.to_string();
        self.raise_event(CartEvent::PromoApplied { code: code.to_string(), discount_percent: self.discount_percent });
        self.touch();
        true
    }

    /// Selects a shipping option. Unknown ids are accepted and price at zero.
    pub fn set_shipping_option(&mut self, option: impl Into<String>) {
        self.shipping_option = ShippingOptionId::new(option);
        self.raise_event(CartEvent::ShippingSelected { option: self.shipping_option.clone() });
        self.touch();
    }

    /// Mock checkout. Fails immediately on an empty cart; never mutates the cart.
    pub async fn start_checkout(&self, delay: Duration) -> Result<CheckoutReceipt, CheckoutError> {
        let pending = checkout::prepare(self)?;
        checkout::submit(pending, delay).await
    }

    pub fn subtotal(&self) -> Money {
        Money::new(self.subtotal_amount(), &self.currency)
    }

    pub fn shipping_cost(&self) -> Money {
        let subtotal = self.subtotal_amount();
        let cost = self.pricing.shipping_rate(&self.shipping_option).map_or(Decimal::ZERO, |rate| rate.cost_for(subtotal));
        Money::new(cost, &self.currency)
    }

    pub fn tax(&self) -> Money {
        Money::new(self.subtotal_amount() * self.pricing.tax_rate(), &self.currency)
    }

    pub fn discount_amount(&self) -> Money {
        Money::new(self.subtotal_amount() * self.discount_percent / Decimal::ONE_HUNDRED, &self.currency)
    }

    /// Subtotal plus shipping and tax, less discount. Not floored at zero.
    pub fn total(&self) -> Money {
        let amount = self.subtotal_amount() + self.shipping_cost().amount() + self.tax().amount() - self.discount_amount().amount();
        Money::new(amount, &self.currency)
    }

    pub fn savings(&self) -> Money {
        Money::new(self.items.iter().map(CartLineItem::savings).sum(), &self.currency)
    }

    /// Subtotal still needed before the selected option ships free.
    pub fn amount_to_free_shipping(&self) -> Option<Money> {
        let threshold = self.pricing.shipping_rate(&self.shipping_option)?.free_threshold?;
        let remaining = (threshold - self.subtotal_amount()).max(Decimal::ZERO);
        Some(Money::new(remaining, &self.currency))
    }

    pub fn summary(&self) -> CartSummary {
        CartSummary {
            items: self.items.clone(),
            item_count: self.item_count(),
            promo_code: self.promo_code.clone(),
            discount_percent: self.discount_percent,
            shipping_option: self.shipping_option.clone(),
            subtotal: self.subtotal().rounded(),
            shipping: self.shipping_cost().rounded(),
            tax: self.tax().rounded(),
            discount: self.discount_amount().rounded(),
            savings: self.savings().rounded(),
            amount_to_free_shipping: self.amount_to_free_shipping().map(|m| m.rounded()),
            total: self.total().rounded(),
        }
    }

    pub fn take_events(&mut self) -> Vec<CartEvent> { std::mem::take(&mut self.events) }

    fn subtotal_amount(&self) -> Decimal {
        self.items.iter().map(|i| i.line_total(&self.currency).amount()).sum()
    }

    fn raise_event(&mut self, e: CartEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

impl Default for Cart { fn default() -> Self { Self::new("USD") } }

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, price: i64, stock: Option<u32>) -> LineItemCandidate {
        let c = LineItemCandidate::new(id, format!("Product {id}"), Decimal::new(price, 0));
        match stock { Some(s) => c.with_stock(s), None => c }
    }

    #[test]
    fn test_repeated_add_merges_and_clamps_to_stock() {
        let mut cart = Cart::default();
        for _ in 0..4 { cart.add_to_cart(candidate("A", 50, Some(3))); }
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item("A").unwrap().quantity.value(), 3);
        assert_eq!(cart.subtotal().amount(), Decimal::new(150, 0));
    }

    #[test]
    fn test_repeated_add_without_stock_clamps_to_ten() {
        let mut cart = Cart::default();
        for _ in 0..12 { cart.add_to_cart(candidate("B", 1, None)); }
        assert_eq!(cart.item("B").unwrap().quantity.value(), 10);
        assert_eq!(cart.item_count(), 10);
    }

    #[test]
    fn test_invalid_candidate_is_ignored() {
        let mut cart = Cart::default();
        cart.add_to_cart(LineItemCandidate { id: Some("X".into()), name: Some("X".into()), ..Default::default() });
        assert!(cart.is_empty());
        assert!(cart.take_events().is_empty());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut cart = Cart::default();
        cart.add_to_cart(candidate("b", 1, None));
        cart.add_to_cart(candidate("a", 1, None));
        cart.add_to_cart(candidate("b", 1, None));
        let ids: Vec<_> = cart.items().iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a"]);
    }

    #[test]
    fn test_update_quantity() {
        let mut cart = Cart::default();
        cart.add_to_cart(candidate("A", 20, Some(5)));
        cart.update_quantity("A", 4);
        assert_eq!(cart.item("A").unwrap().quantity.value(), 4);
        assert_eq!(cart.subtotal().amount(), Decimal::new(80, 0));
        cart.update_quantity("A", 50);
        assert_eq!(cart.item("A").unwrap().quantity.value(), 5);
        cart.update_quantity("A", 0);
        cart.update_quantity("A", -2);
        assert_eq!(cart.item("A").unwrap().quantity.value(), 5);
        cart.update_quantity("missing", 2);
        assert_eq!(cart.items().len(), 1);
    }

    #[test]
    fn test_remove_and_wishlist() {
        let mut cart = Cart::default();
        cart.add_to_cart(candidate("A", 10, None));
        cart.add_to_cart(candidate("B", 10, None));
        cart.remove_from_cart("A");
        assert!(cart.item("A").is_none());
        cart.remove_from_cart("A");
        cart.move_to_wishlist("B");
        assert!(cart.is_empty());
    }

    #[test]
    fn test_clear_cart() {
        let mut cart = Cart::default();
        cart.add_to_cart(candidate("A", 10, None));
        cart.clear_cart();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal().amount(), Decimal::ZERO);
    }

    #[test]
    fn test_apply_promo_code() {
        let mut cart = Cart::default();
        assert!(cart.apply_promo_code("SAVE10"));
        assert_eq!(cart.discount_percent(), Decimal::new(10, 0));
        assert_eq!(cart.promo_code(), "SAVE10");
        assert!(!cart.apply_promo_code("BOGUS"));
        assert_eq!(cart.discount_percent(), Decimal::new(10, 0));
        assert_eq!(cart.promo_code(), "SAVE10");
        assert!(!cart.apply_promo_code("save10"));
    }

    #[test]
    fn test_freeship_forces_standard_and_zero_discount() {
        let mut cart = Cart::default();
        cart.apply_promo_code("SAVE20");
        cart.set_shipping_option("overnight");
        assert!(cart.apply_promo_code("FREESHIP"));
        assert_eq!(cart.shipping_option().as_str(), "standard");
        assert_eq!(cart.discount_percent(), Decimal::ZERO);
        assert_eq!(cart.promo_code(), "FREESHIP");
    }

    #[test]
    fn test_express_shipping_threshold() {
        let mut cart = Cart::default();
        cart.set_shipping_option("express");
        assert_eq!(cart.shipping_cost().amount(), Decimal::new(999, 2));
        cart.add_to_cart(candidate("A", 50, None));
        cart.update_quantity("A", 3);
        assert_eq!(cart.subtotal().amount(), Decimal::new(150, 0));
        assert_eq!(cart.shipping_cost().amount(), Decimal::ZERO);
    }

    #[test]
    fn test_standard_shipping_threshold_and_unknown_option() {
        let mut cart = Cart::default();
        cart.add_to_cart(candidate("A", 98, None));
        assert_eq!(cart.shipping_cost().amount(), Decimal::new(599, 2));
        cart.add_to_cart(candidate("B", 1, None));
        assert_eq!(cart.shipping_cost().amount(), Decimal::ZERO);
        cart.set_shipping_option("teleport");
        assert_eq!(cart.shipping_cost().amount(), Decimal::ZERO);
        assert_eq!(cart.shipping_option().as_str(), "teleport");
    }

    #[test]
    fn test_totals() {
        let mut cart = Cart::default();
        cart.add_to_cart(candidate("A", 50, None));
        cart.apply_promo_code("SAVE10");
        // 50 + 5.99 shipping + 4.00 tax - 5.00 discount
        assert_eq!(cart.tax().amount(), Decimal::new(4, 0));
        assert_eq!(cart.discount_amount().amount(), Decimal::new(5, 0));
        assert_eq!(cart.total().amount(), Decimal::new(5499, 2));
    }

    #[test]
    fn test_amount_to_free_shipping() {
        let mut cart = Cart::default();
        cart.add_to_cart(candidate("A", 60, None));
        assert_eq!(cart.amount_to_free_shipping().unwrap().amount(), Decimal::new(39, 0));
        cart.update_quantity("A", 2);
        assert_eq!(cart.amount_to_free_shipping().unwrap().amount(), Decimal::ZERO);
        cart.set_shipping_option("overnight");
        assert!(cart.amount_to_free_shipping().is_none());
    }

    #[test]
    fn test_events_raised_only_on_change() {
        let mut cart = Cart::default();
        cart.add_to_cart(candidate("A", 5, Some(1)));
        cart.add_to_cart(candidate("A", 5, Some(1)));
        cart.update_quantity("A", 0);
        cart.remove_from_cart("nope");
        assert_eq!(cart.take_events(), vec![CartEvent::ItemAdded { item_id: "A".into(), quantity: 1 }]);
        assert!(cart.take_events().is_empty());
    }

    #[test]
    fn test_summary_rounds_for_display() {
        let mut cart = Cart::default();
        cart.add_to_cart(LineItemCandidate::new("A", "A", Decimal::new(1999, 2)));
        let summary = cart.summary();
        assert_eq!(summary.item_count, 1);
        assert_eq!(summary.tax.amount(), Decimal::new(160, 2));
        assert_eq!(summary.total.amount(), Decimal::new(2758, 2));
    }

    #[test]
    fn test_snapshot_rehydration_revalidates_promo() {
        let mut cart = Cart::default();
        cart.add_to_cart(candidate("A", 10, Some(2)));
        cart.apply_promo_code("SAVE20");
        cart.set_shipping_option("express");

        let restored = Cart::from_snapshot(cart.snapshot(), "USD", Arc::new(PricingTable::default()));
        assert_eq!(restored.items(), cart.items());
        assert_eq!(restored.discount_percent(), Decimal::new(20, 0));
        assert_eq!(restored.shipping_option().as_str(), "express");

        let mut stale = cart.snapshot();
        stale.promo_code = "SUMMER99".into();
        let restored = Cart::from_snapshot(stale, "USD", Arc::new(PricingTable::default()));
        assert_eq!(restored.promo_code(), "");
        assert_eq!(restored.discount_percent(), Decimal::ZERO);
    }

    #[test]
    fn test_snapshot_rehydration_keeps_freeship_and_saved_shipping() {
        let mut cart = Cart::default();
        cart.add_to_cart(candidate("A", 30, None));
        assert!(cart.apply_promo_code("FREESHIP"));
        cart.set_shipping_option("express");

        let restored = Cart::from_snapshot(cart.snapshot(), "USD", Arc::new(PricingTable::default()));
        assert_eq!(restored.promo_code(), "FREESHIP");
        assert_eq!(restored.discount_percent(), Decimal::ZERO);
        assert_eq!(restored.shipping_option().as_str(), "express");
        assert_eq!(restored.shipping_cost().amount(), Decimal::new(999, 2));
    }

    #[test]
    fn test_snapshot_rehydration_repairs_items() {
        let mut cart = Cart::default();
        cart.add_to_cart(candidate("A", 10, None));
        cart.update_quantity("A", 8);
        cart.add_to_cart(candidate("B", 5, None));
        let mut snapshot = cart.snapshot();
        snapshot.items[0].stock = Some(3);
        snapshot.items[1].price = "50000000000000000000000000000".parse().unwrap();
        snapshot.items.push(snapshot.items[0].clone());

        let restored = Cart::from_snapshot(snapshot, "USD", Arc::new(PricingTable::default()));
        assert_eq!(restored.items().len(), 1);
        assert_eq!(restored.item("A").unwrap().quantity.value(), 3);
        assert!(restored.item("B").is_none());
        assert_eq!(restored.total().amount(), Decimal::new(3839, 2));
    }

    #[test]
    fn test_oversized_price_never_reaches_totals() {
        let mut cart = Cart::default();
        let huge: Decimal = "50000000000000000000000000000".parse().unwrap();
        cart.add_to_cart(LineItemCandidate::new("big", "Big", huge));
        cart.add_to_cart(LineItemCandidate::new("big", "Big", huge));
        assert!(cart.is_empty());
        cart.add_to_cart(LineItemCandidate::new("max", "Max", Decimal::from(crate::domain::aggregates::line_item::MAX_UNIT_PRICE)).with_stock(u32::MAX));
        cart.update_quantity("max", i64::MAX);
        assert_eq!(cart.item("max").unwrap().quantity.value(), u32::MAX);
        assert!(cart.summary().total.amount() > Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_checkout_empty_cart_fails() {
        let cart = Cart::default();
        let result = cart.start_checkout(Duration::from_secs(30)).await;
        assert!(matches!(result, Err(CheckoutError::EmptyCart)));
    }

    #[tokio::test]
    async fn test_checkout_does_not_mutate_items() {
        let mut cart = Cart::default();
        cart.add_to_cart(candidate("A", 10, None));
        let before = cart.items().to_vec();
        let receipt = cart.start_checkout(Duration::from_millis(5)).await.unwrap();
        assert!(receipt.order_id.starts_with("ORD-"));
        assert_eq!(cart.items(), before.as_slice());
    }
}
