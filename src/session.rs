//! The application-owned cart handle.
//!
//! Every mutation goes through the aggregate; when it changed something the
//! snapshot is written through to the store. Store failures are logged only.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::aggregates::{Cart, LineItemCandidate};
use crate::domain::checkout::{self, CheckoutError, CheckoutReceipt, PendingCheckout};
use crate::domain::pricing::PricingTable;
use crate::snapshot::SnapshotStore;

pub struct CartSession {
    cart: Cart,
    store: Arc<dyn SnapshotStore>,
    checkout_delay: Duration,
}

impl CartSession {
    /// Opens the session, rehydrating from the store when it holds a snapshot.
    pub fn open(store: Arc<dyn SnapshotStore>, currency: &str, checkout_delay: Duration) -> Self {
        let pricing = Arc::new(PricingTable::default());
        let cart = match store.load() {
            Ok(Some(snapshot)) => {
                debug!(items = snapshot.items.len(), "restored cart snapshot");
                Cart::from_snapshot(snapshot, currency, pricing)
            }
            Ok(None) => Cart::with_pricing(currency, pricing),
            Err(e) => {
                warn!(error = %e, "could not load cart snapshot, setting it aside and starting empty");
                if let Err(e) = store.set_aside() {
                    warn!(error = %e, "could not set aside unreadable cart snapshot");
                }
                Cart::with_pricing(currency, pricing)
            }
        };
        Self { cart, store, checkout_delay }
    }

    pub fn cart(&self) -> &Cart { &self.cart }
    pub fn checkout_delay(&self) -> Duration { self.checkout_delay }

    pub fn add_to_cart(&mut self, candidate: LineItemCandidate) { self.cart.add_to_cart(candidate); self.persist(); }

    /// Like [`add_to_cart`](Self::add_to_cart), but reports why a candidate was rejected.
    pub fn try_add_to_cart(&mut self, candidate: LineItemCandidate) -> crate::Result<()> {
        candidate.clone().into_new_item()?;
        self.add_to_cart(candidate);
        Ok(())
    }

    pub fn update_quantity(&mut self, id: &str, quantity: i64) { self.cart.update_quantity(id, quantity); self.persist(); }
    pub fn remove_from_cart(&mut self, id: &str) { self.cart.remove_from_cart(id); self.persist(); }
    pub fn move_to_wishlist(&mut self, id: &str) { self.cart.move_to_wishlist(id); self.persist(); }
    pub fn clear_cart(&mut self) { self.cart.clear_cart(); self.persist(); }
    pub fn set_shipping_option(&mut self, option: impl Into<String>) { self.cart.set_shipping_option(option); self.persist(); }

    pub fn apply_promo_code(&mut self, code: &str) -> bool {
        let applied = self.cart.apply_promo_code(code);
        self.persist();
        applied
    }

    /// First half of checkout, for callers that must not hold the session across the delay.
    pub fn prepare_checkout(&self) -> Result<PendingCheckout, CheckoutError> { checkout::prepare(&self.cart) }

    pub async fn start_checkout(&self) -> Result<CheckoutReceipt, CheckoutError> {
        self.cart.start_checkout(self.checkout_delay).await
    }

    /// Writes the current snapshot and reports failure, for shutdown.
    pub fn flush(&self) -> crate::Result<()> {
        self.store.save(&self.cart.snapshot())?;
        Ok(())
    }

    fn persist(&mut self) {
        let events = self.cart.take_events();
        if events.is_empty() { return; }
        debug!(?events, "cart changed");
        if let Err(e) = self.store.save(&self.cart.snapshot()) {
            warn!(error = %e, "failed to persist cart snapshot");
        }
    }
}
