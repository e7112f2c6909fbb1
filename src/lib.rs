//! Storefront Cart
//!
//! The shopping-cart pricing store behind the storefront checkout flow.
//!
//! ## Features
//! - Line items unique by product id, quantities clamped to stock
//! - Subtotal, shipping, tax, discount and total derived on every read
//! - Promo codes and shipping options from fixed tables
//! - Snapshot persistence of items, promo code and shipping selection
//! - Mock checkout returning a placeholder order id

pub mod api;
pub mod config;
pub mod domain;
pub mod session;
pub mod snapshot;

use thiserror::Error;

pub use domain::aggregates::{Cart, CartLineItem, CartSummary, LineItemCandidate};
pub use domain::checkout::{CheckoutError, CheckoutReceipt};
pub use domain::value_objects::{Money, Quantity, ShippingOptionId};
pub use session::CartSession;
pub use snapshot::{CartSnapshot, JsonFileSnapshotStore, MemorySnapshotStore, SnapshotStore};

// =============================================================================
// Error Types
// =============================================================================

#[derive(Error, Debug)]
pub enum StorefrontError {
    #[error("Invalid line item: {0}")]
    LineItem(#[from] domain::aggregates::LineItemError),

    #[error("Storage error: {0}")]
    Storage(#[from] snapshot::SnapshotError),
}

pub type Result<T> = std::result::Result<T, StorefrontError>;
