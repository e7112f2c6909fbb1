//! Aggregates module
pub mod cart;
pub mod line_item;

pub use cart::{Cart, CartSummary};
pub use line_item::{CartLineItem, LineItemCandidate, LineItemError, NewLineItem};
