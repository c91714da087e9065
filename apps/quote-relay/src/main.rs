//! Quote Relay Binary
//!
//! Starts the periodic snapshot broadcaster.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin quote-relay
//! ```
//!
//! # Environment Variables
//!
//! All optional:
//! - `QUOTE_SYMBOLS`: Comma-separated universe (default: Nifty-50 list)
//! - `QUOTE_REFRESH_SECS`: Update cycle period (default: 30)
//! - `QUOTE_FETCH_TIMEOUT_SECS`: Per-fetch bound, 0 disables (default: 10)
//! - `QUOTE_BROADCAST_MODE`: "on-change" | "always" (default: on-change)
//! - `QUOTE_MISSING_FIELDS`: "unavailable" | "zero" (default: unavailable)
//! - `QUOTE_WS_PORT`: WebSocket server port (default: 3000)
//! - `QUOTE_HEALTH_PORT`: Health check HTTP port (default: 8082)
//! - `QUOTE_SNAPSHOT_CAPACITY`: Broadcast channel capacity (default: 64)
//! - `QUOTE_PROVIDER_URL`: Provider base URL (default: Yahoo query host)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;

use quote_relay::infrastructure::broadcast::{BroadcastConfig, BroadcastHub};
use quote_relay::infrastructure::health::{HealthServer, HealthServerState};
use quote_relay::infrastructure::telemetry;
use quote_relay::infrastructure::ws::{QuoteStreamServer, WsSessionState};
use quote_relay::{
    RelayConfig, Scheduler, SnapshotStore, UpdateCycleService, YahooQuoteClient, init_metrics,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    telemetry::init();

    tracing::info!("Starting quote relay");

    let _metrics_handle = init_metrics();

    let config = RelayConfig::from_env()?;
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    let store = Arc::new(SnapshotStore::new());
    let broadcast_hub = Arc::new(BroadcastHub::new(BroadcastConfig::from(
        config.broadcast.clone(),
    )));

    let fetcher = Arc::new(YahooQuoteClient::new(config.provider.clone())?);

    let service = Arc::new(UpdateCycleService::new(
        config.universe.clone(),
        fetcher,
        Arc::clone(&store),
        Arc::clone(&broadcast_hub),
        config.broadcast_policy,
        config.missing_fields,
        config.fetch_timeout,
    ));

    let scheduler = Scheduler::new(service, config.refresh_interval, shutdown_token.clone());
    tokio::spawn(scheduler.run());

    let ws_state = Arc::new(WsSessionState::new(
        Arc::clone(&store),
        Arc::clone(&broadcast_hub),
    ));
    let ws_server = QuoteStreamServer::new(
        config.server.ws_port,
        Arc::clone(&ws_state),
        shutdown_token.clone(),
    );
    tokio::spawn(async move {
        if let Err(e) = ws_server.run().await {
            tracing::error!(error = %e, "WebSocket server error");
        }
    });

    let health_state = Arc::new(HealthServerState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        Arc::clone(&store),
        Arc::clone(&broadcast_hub),
        ws_state,
    ));
    let health_server = HealthServer::new(
        config.server.health_port,
        health_state,
        shutdown_token.clone(),
    );
    tokio::spawn(async move {
        if let Err(e) = health_server.run().await {
            tracing::error!(error = %e, "Health server error");
        }
    });

    tracing::info!("Quote relay ready");

    await_shutdown(shutdown_token).await;

    tracing::info!("Quote relay stopped");
    Ok(())
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Log the parsed configuration.
fn log_config(config: &RelayConfig) {
    tracing::info!(
        instruments = config.universe.len(),
        refresh_secs = config.refresh_interval.as_secs(),
        fetch_timeout_secs = config.fetch_timeout.map_or(0, |t| t.as_secs()),
        broadcast_mode = config.broadcast_policy.as_str(),
        missing_fields = config.missing_fields.as_str(),
        ws_port = config.server.ws_port,
        health_port = config.server.health_port,
        "Configuration loaded"
    );
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();
}
