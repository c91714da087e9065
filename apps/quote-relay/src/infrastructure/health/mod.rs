//! Health Check and Metrics Endpoint
//!
//! HTTP endpoint for health checks, snapshot status reporting, and
//! Prometheus metrics. Used by container orchestrators, load balancers,
//! and monitoring systems.
//!
//! # Endpoints
//!
//! - `GET /health` - Returns JSON health status
//! - `GET /healthz` - Kubernetes liveness probe (simple OK)
//! - `GET /readyz` - Kubernetes readiness probe (checks snapshot store)
//! - `GET /metrics` - Prometheus metrics in text format

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::domain::snapshot::SnapshotStore;
use crate::infrastructure::broadcast::SharedBroadcastHub;
use crate::infrastructure::metrics::get_metrics_handle;
use crate::infrastructure::ws::WsSessionState;

// =============================================================================
// Health Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy", "degraded", or "unhealthy".
    pub status: HealthStatus,
    /// Relay version.
    pub version: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Snapshot store status.
    pub snapshot: SnapshotStatus,
    /// Subscriber statistics.
    pub subscribers: SubscriberStatus,
}

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// A snapshot is available and at least one instrument resolves.
    Healthy,
    /// No cycle has completed yet; subscribers receive `pending`.
    Degraded,
    /// Every instrument in the latest snapshot failed to fetch.
    Unhealthy,
}

/// Snapshot store status.
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotStatus {
    /// Whether any cycle has completed.
    pub initialized: bool,
    /// Capture time of the current snapshot.
    pub as_of: Option<DateTime<Utc>>,
    /// Entries in the current snapshot.
    pub instruments: usize,
    /// Failure entries in the current snapshot.
    pub failed_instruments: usize,
}

/// Subscriber statistics.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriberStatus {
    /// Connected WebSocket sessions.
    pub sessions: usize,
    /// Total broadcast receivers.
    pub broadcast_receivers: usize,
}

// =============================================================================
// Health Server State
// =============================================================================

/// Shared state for the health server.
pub struct HealthServerState {
    version: String,
    started_at: Instant,
    store: Arc<SnapshotStore>,
    broadcast_hub: SharedBroadcastHub,
    sessions: Arc<WsSessionState>,
}

impl HealthServerState {
    /// Create new health server state.
    #[must_use]
    pub fn new(
        version: String,
        store: Arc<SnapshotStore>,
        broadcast_hub: SharedBroadcastHub,
        sessions: Arc<WsSessionState>,
    ) -> Self {
        Self {
            version,
            started_at: Instant::now(),
            store,
            broadcast_hub,
            sessions,
        }
    }
}

// =============================================================================
// Health Server
// =============================================================================

/// Health check HTTP server.
pub struct HealthServer {
    port: u16,
    state: Arc<HealthServerState>,
    cancel: CancellationToken,
}

impl HealthServer {
    /// Create a new health server.
    #[must_use]
    pub const fn new(port: u16, state: Arc<HealthServerState>, cancel: CancellationToken) -> Self {
        Self {
            port,
            state,
            cancel,
        }
    }

    /// Run the health server until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `HealthServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), HealthServerError> {
        let app = Router::new()
            .route("/health", get(health_handler))
            .route("/healthz", get(liveness_handler))
            .route("/readyz", get(readiness_handler))
            .route("/metrics", get(metrics_handler))
            .with_state(self.state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| HealthServerError::BindFailed(self.port, e.to_string()))?;

        tracing::info!(port = self.port, "Health server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| HealthServerError::ServerFailed(e.to_string()))?;

        tracing::info!("Health server stopped");
        Ok(())
    }
}

// =============================================================================
// HTTP Handlers
// =============================================================================

async fn health_handler(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    let response = build_health_response(&state);
    let status_code = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(response))
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn readiness_handler(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    if state.store.is_initialized() {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

async fn metrics_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            let body = handle.render();
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                body,
            )
        },
    )
}

fn build_health_response(state: &HealthServerState) -> HealthResponse {
    let snapshot = match state.store.read() {
        Some(current) => SnapshotStatus {
            initialized: true,
            as_of: Some(current.taken_at()),
            instruments: current.len(),
            failed_instruments: current.failed_count(),
        },
        None => SnapshotStatus {
            initialized: false,
            as_of: None,
            instruments: 0,
            failed_instruments: 0,
        },
    };

    HealthResponse {
        status: determine_health_status(&snapshot),
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        snapshot,
        subscribers: SubscriberStatus {
            sessions: state.sessions.session_count(),
            broadcast_receivers: state.broadcast_hub.receiver_count(),
        },
    }
}

fn determine_health_status(snapshot: &SnapshotStatus) -> HealthStatus {
    if !snapshot.initialized {
        return HealthStatus::Degraded;
    }
    if snapshot.instruments > 0 && snapshot.failed_instruments == snapshot.instruments {
        return HealthStatus::Unhealthy;
    }
    HealthStatus::Healthy
}

// =============================================================================
// Errors
// =============================================================================

/// Health server errors.
#[derive(Debug, thiserror::Error)]
pub enum HealthServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Healthy).unwrap(),
            "\"healthy\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Degraded).unwrap(),
            "\"degraded\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Unhealthy).unwrap(),
            "\"unhealthy\""
        );
    }

    #[test]
    fn determine_status_before_first_cycle() {
        let snapshot = SnapshotStatus {
            initialized: false,
            as_of: None,
            instruments: 0,
            failed_instruments: 0,
        };
        assert_eq!(determine_health_status(&snapshot), HealthStatus::Degraded);
    }

    #[test]
    fn determine_status_partial_failures() {
        let snapshot = SnapshotStatus {
            initialized: true,
            as_of: Some(Utc::now()),
            instruments: 50,
            failed_instruments: 3,
        };
        assert_eq!(determine_health_status(&snapshot), HealthStatus::Healthy);
    }

    #[test]
    fn determine_status_all_failed() {
        let snapshot = SnapshotStatus {
            initialized: true,
            as_of: Some(Utc::now()),
            instruments: 50,
            failed_instruments: 50,
        };
        assert_eq!(determine_health_status(&snapshot), HealthStatus::Unhealthy);
    }

    #[test]
    fn determine_status_empty_universe() {
        let snapshot = SnapshotStatus {
            initialized: true,
            as_of: Some(Utc::now()),
            instruments: 0,
            failed_instruments: 0,
        };
        assert_eq!(determine_health_status(&snapshot), HealthStatus::Healthy);
    }
}
