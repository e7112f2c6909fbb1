//! Cart line items and the validated boundary they are built through

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::domain::value_objects::{Money, Quantity, DEFAULT_QUANTITY_CEILING};

pub const PLACEHOLDER_IMAGE: &str = "/images/placeholder.png";

/// Upper bound on unit and reference prices. Keeps price × `u32::MAX` units summed
/// over any cart well inside `Decimal` range, so totals cannot overflow.
pub const MAX_UNIT_PRICE: i64 = 1_000_000;

fn check_price(price: Decimal) -> Result<(), LineItemError> {
    if price < Decimal::ZERO { return Err(LineItemError::NegativePrice); }
    if price > Decimal::from(MAX_UNIT_PRICE) { return Err(LineItemError::PriceTooLarge(price)); }
    Ok(())
}

/// One product variant held in the cart.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLineItem {
    pub id: String,
    pub name: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_price: Option<Decimal>,
    pub quantity: Quantity,
    pub image: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
}

impl CartLineItem {
    /// Highest quantity this line may hold: its stock, or the default ceiling when stock is unknown or zero.
    pub fn quantity_ceiling(&self) -> u32 {
        match self.stock {
            Some(stock) if stock > 0 => stock,
            _ => DEFAULT_QUANTITY_CEILING,
        }
    }

    /// Price and reference price are within `0..=MAX_UNIT_PRICE`.
    pub fn check_prices(&self) -> Result<(), LineItemError> {
        check_price(self.price)?;
        self.original_price.map_or(Ok(()), check_price)
    }

    pub fn unit_price(&self, currency: &str) -> Money { Money::new(self.price, currency) }
    pub fn line_total(&self, currency: &str) -> Money { self.unit_price(currency).multiply(self.quantity.value()) }

    /// Per-line saving against the reference price, zero when there is none.
    pub fn savings(&self) -> Decimal {
        match self.original_price {
            Some(original) if original > self.price => (original - self.price) * Decimal::from(self.quantity.value()),
            _ => Decimal::ZERO,
        }
    }
}

/// Unvalidated add-to-cart input, as it arrives from a product page.
#[derive(Clone, Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct LineItemCandidate {
    #[validate(length(min = 1, max = 128))]
    pub id: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub name: Option<String>,
    pub price: Option<Decimal>,
    pub original_price: Option<Decimal>,
    pub image: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub brand: Option<String>,
    #[validate(length(min = 1, max = 200))]
    pub slug: Option<String>,
    pub stock: Option<u32>,
    #[validate(length(max = 64))]
    pub sku: Option<String>,
}

/// A candidate that passed validation; everything past this point can assume well-formed data.
#[derive(Clone, Debug, PartialEq)]
pub struct NewLineItem(CartLineItem);

impl NewLineItem {
    pub fn id(&self) -> &str { &self.0.id }
    pub fn into_line_item(self) -> CartLineItem { self.0 }
}

#[derive(Debug, Error)]
pub enum LineItemError {
    #[error("missing product id")]
    MissingId,
    #[error("missing product name")]
    MissingName,
    #[error("missing or non-numeric price")]
    MissingPrice,
    #[error("price must not be negative")]
    NegativePrice,
    #[error("price {0} exceeds the maximum of 1000000")]
    PriceTooLarge(Decimal),
    #[error("invalid line item: {0}")]
    Invalid(#[from] validator::ValidationErrors),
}

impl LineItemCandidate {
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: Decimal) -> Self {
        Self { id: Some(id.into()), name: Some(name.into()), price: Some(price), ..Default::default() }
    }

    pub fn with_stock(mut self, stock: u32) -> Self { self.stock = Some(stock); self }
    pub fn with_original_price(mut self, original: Decimal) -> Self { self.original_price = Some(original); self }

    /// Validates the candidate into a line item with quantity 1, filling image and slug defaults.
    pub fn into_new_item(self) -> Result<NewLineItem, LineItemError> {
        let id = self.id.clone().ok_or(LineItemError::MissingId)?;
        let name = self.name.clone().ok_or(LineItemError::MissingName)?;
        let price = self.price.ok_or(LineItemError::MissingPrice)?;
        check_price(price)?;
        if let Some(original) = self.original_price { check_price(original)?; }
        self.validate()?;

        let slug = self.slug.unwrap_or_else(|| id.clone());
        let image = self.image.filter(|i| !i.is_empty()).unwrap_or_else(|| PLACEHOLDER_IMAGE.to_string());
        Ok(NewLineItem(CartLineItem {
            id, name, price,
            original_price: self.original_price,
            quantity: Quantity::ONE,
            image,
            size: self.size, color: self.color, brand: self.brand,
            slug,
            stock: self.stock,
            sku: self.sku,
        }))
    }
}
