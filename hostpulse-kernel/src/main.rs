/**
 * HOSTPULSE KERNEL - Point d'entrée du serveur central
 *
 * ROLE: wires config, store, health tracker and the HTTP router, then serves.
 * Agents push to /report, viewers subscribe to /ws.
 */

use anyhow::{Context, Result};
use hostpulse_kernel::config::load_config;
use hostpulse_kernel::{build_router, system_clock, AggregatorStore, AppState};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // .env optionnel
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cfg = load_config().await;
    info!(
        "broadcast every {:?}, push timeout {:?}",
        cfg.broadcast_interval(),
        cfg.push_timeout()
    );

    let store = Arc::new(AggregatorStore::new());
    let app = build_router(AppState::new(store, &cfg, system_clock()));

    let listener = TcpListener::bind(&cfg.listen)
        .await
        .with_context(|| format!("failed to bind {}", cfg.listen))?;
    info!("listening on http://{}", cfg.listen);

    axum::serve(listener, app).await.context("HTTP server failed")?;
    Ok(())
}
