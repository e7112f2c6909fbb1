//! Cart domain: aggregate, value objects, pricing tables, checkout and events
pub mod aggregates;
pub mod checkout;
pub mod events;
pub mod pricing;
pub mod value_objects;
