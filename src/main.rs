//! aurora-relay server entry point.
//!
//! Starts the Axum server exposing the WebSocket endpoint and shuts the
//! message log down cleanly on ctrl-c.

use std::future::IntoFuture;
use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use aurora_relay::app_state::AppState;
use aurora_relay::config::RelayConfig;
use aurora_relay::persistence::MessageStore;
use aurora_relay::relay::RelayEngine;
use aurora_relay::ws;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = RelayConfig::from_env().map_err(anyhow::Error::from_boxed)?;
    tracing::info!(addr = %config.listen_addr, "starting aurora-relay");

    // Open the durable message log
    let store =
        MessageStore::connect(&config.database_url, config.database_max_connections).await?;

    // Build the engine and application state
    let engine = Arc::new(RelayEngine::new(store.clone()));
    let app_state = AppState { engine };

    // Build router
    let app = Router::new()
        .merge(ws::handler::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr).await?;
    tracing::info!(addr = %config.listen_addr, "relay listening");

    // Run until the process is told to stop; live WebSocket sessions do
    // not delay shutdown.
    tokio::select! {
        result = axum::serve(listener, app).into_future() => result?,
        () = shutdown_signal() => tracing::info!("shutdown signal received"),
    }

    // Flush and close the store before exit.
    store.close().await;
    tracing::info!("relay stopped");

    Ok(())
}

/// Resolves when the process receives ctrl-c.
async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to install shutdown handler");
    }
}
