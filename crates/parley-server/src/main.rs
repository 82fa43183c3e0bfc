//! # parley-server
//!
//! HTTP decision service for Parley appservers.
//!
//! This binary provides:
//! - **`POST /v1/authorize`**: asks the permission engine whether a caller may
//!   act on an object class, answering `200` or a mapped error status
//! - **`GET /health`** and **`GET /info`** for probes and operators
//!
//! Decisions read the SQLite database written by the rest of the platform.

mod api;
mod config;
mod error;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::EnvFilter;

use parley_authz::{Clock, Engine, SystemClock};
use parley_store::{Database, SqliteStorage};

use crate::api::AppState;
use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // -----------------------------------------------------------------------
    // 1. Initialize tracing (respects RUST_LOG env var)
    // -----------------------------------------------------------------------
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,parley_server=debug")),
        )
        .init();

    info!("Starting Parley authorization server v{}", env!("CARGO_PKG_VERSION"));

    // -----------------------------------------------------------------------
    // 2. Load configuration
    // -----------------------------------------------------------------------
    let config = ServerConfig::from_env();
    info!(?config, "Loaded configuration");

    // -----------------------------------------------------------------------
    // 3. Open storage and build the engine
    // -----------------------------------------------------------------------
    let db = Database::open_at(&config.database_path)?;
    let storage = Arc::new(SqliteStorage::new(db));
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let engine = Arc::new(Engine::new(storage, clock.clone()));

    let shutdown = CancellationToken::new();
    let http_addr = config.http_addr;
    let app_state = AppState {
        engine,
        clock,
        config: Arc::new(config),
        shutdown: shutdown.clone(),
    };

    // -----------------------------------------------------------------------
    // 4. Run the HTTP API server (blocks until shutdown)
    // -----------------------------------------------------------------------
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            return;
        }
        info!("Received Ctrl+C, shutting down");
        signal.cancel();
    });

    if let Err(e) = api::serve(app_state, http_addr).await {
        tracing::error!(error = %e, "HTTP server failed");
        return Err(e);
    }

    Ok(())
}
