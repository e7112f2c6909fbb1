//! Mock checkout. No payment or inventory side effects; a fixed delay stands in for the round trip.

use chrono::Utc;
use rand::Rng;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::domain::aggregates::Cart;
use crate::domain::value_objects::Money;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckoutError {
    #[error("Cart is empty")]
    EmptyCart,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutReceipt {
    pub order_id: String,
    pub item_count: u32,
    pub total: Money,
}

/// What checkout needs from the cart, captured so the cart can be released during the delay.
#[derive(Debug, Clone)]
pub struct PendingCheckout {
    item_count: u32,
    total: Money,
}

pub fn prepare(cart: &Cart) -> Result<PendingCheckout, CheckoutError> {
    if cart.is_empty() { return Err(CheckoutError::EmptyCart); }
    Ok(PendingCheckout { item_count: cart.item_count(), total: cart.total().rounded() })
}

pub async fn submit(pending: PendingCheckout, delay: Duration) -> Result<CheckoutReceipt, CheckoutError> {
    tokio::time::sleep(delay).await;
    let order_id = generate_order_id();
    info!(order_id = %order_id, items = pending.item_count, total = %pending.total, "checkout completed");
    Ok(CheckoutReceipt { order_id, item_count: pending.item_count, total: pending.total })
}

/// `ORD-<unix millis>-<6 digit suffix>`. A placeholder, not unique across processes.
pub fn generate_order_id() -> String {
    let suffix: u32 = rand::thread_rng().gen_range(0..1_000_000);
    format!("ORD-{}-{:06}", Utc::now().timestamp_millis(), suffix)
}
