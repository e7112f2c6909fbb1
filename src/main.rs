//! Storefront Cart - shopping cart pricing service

use anyhow::Result;
use std::sync::Arc;
use storefront_cart::{api, config::Config, CartSession, JsonFileSnapshotStore, MemorySnapshotStore, SnapshotStore};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let store: Arc<dyn SnapshotStore> = match &config.snapshot_path {
        Some(path) => Arc::new(JsonFileSnapshotStore::new(path)),
        None => Arc::new(MemorySnapshotStore::new()),
    };
    let state = api::AppState::new(CartSession::open(store, &config.currency, config.checkout_delay));
    let app = api::router(state.clone());

    tracing::info!(snapshot = ?config.snapshot_path, currency = %config.currency, "🛒 Storefront cart listening on 0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", config.port)).await?;
    axum::serve(listener, app).with_graceful_shutdown(async { tokio::signal::ctrl_c().await.ok(); }).await?;

    state.session.lock().await.flush()?;
    tracing::info!("cart snapshot flushed, shutting down");
    Ok(())
}
