//! Domain events
use rust_decimal::Decimal;

use crate::domain::value_objects::ShippingOptionId;

#[derive(Clone, Debug, PartialEq)]
pub enum CartEvent {
    ItemAdded { item_id: String, quantity: u32 },
    QuantityChanged { item_id: String, quantity: u32 },
    ItemRemoved { item_id: String },
    Cleared,
    PromoApplied { code: String, discount_percent: Decimal },
    ShippingSelected { option: ShippingOptionId },
}
