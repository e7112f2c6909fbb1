//! Environment configuration

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub port: u16,
    /// JSON file holding the cart snapshot. `None` keeps the snapshot in memory.
    pub snapshot_path: Option<PathBuf>,
    pub checkout_delay: Duration,
    pub currency: String,
}

impl Default for Config {
    fn default() -> Self {
        Self { port: 8083, snapshot_path: None, checkout_delay: Duration::from_millis(1500), currency: "USD".to_string() }
    }
}

impl Config {
    /// Loads `.env` when present, then reads `PORT`, `CART_SNAPSHOT_PATH`, `CHECKOUT_DELAY_MS` and `CART_CURRENCY`.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let port = match lookup("PORT") {
            Some(v) => v.parse().with_context(|| format!("PORT must be a port number, got {v:?}"))?,
            None => defaults.port,
        };
        let checkout_delay = match lookup("CHECKOUT_DELAY_MS") {
            Some(v) => Duration::from_millis(v.parse().with_context(|| format!("CHECKOUT_DELAY_MS must be milliseconds, got {v:?}"))?),
            None => defaults.checkout_delay,
        };
        let snapshot_path = lookup("CART_SNAPSHOT_PATH").filter(|p| !p.is_empty()).map(PathBuf::from);
        let currency = lookup("CART_CURRENCY").map(|c| c.trim().to_uppercase()).filter(|c| !c.is_empty()).unwrap_or(defaults.currency);
        Ok(Self { port, snapshot_path, checkout_delay, currency })
    }
}
