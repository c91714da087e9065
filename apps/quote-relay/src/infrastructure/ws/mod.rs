//! WebSocket Subscriber Endpoint
//!
//! Serves the subscriber-facing push channel at `/ws`. Each session:
//!
//! 1. subscribes to the broadcast hub,
//! 2. is immediately sent the current store contents (a `pending` message
//!    when no cycle has completed yet),
//! 3. then receives every promoted snapshot until it disconnects.
//!
//! Subscribers send nothing the relay acts on; inbound frames are only
//! ping/pong and close handling. A session that disconnects mid-broadcast
//! simply misses that message; there is no retry.
//!
//! # Outbound Messages
//!
//! ```json
//! {"type": "pending"}
//! {"type": "snapshot", "as_of": "2026-08-26T09:15:00Z", "entries": [...]}
//! ```

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::{
    Router,
    extract::State,
    extract::ws::{Message, WebSocket, WebSocketUpgrade},
    response::IntoResponse,
    routing::get,
};
use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::domain::quote::SnapshotEntry;
use crate::domain::snapshot::{Snapshot, SnapshotStore};
use crate::infrastructure::broadcast::SharedBroadcastHub;
use crate::infrastructure::metrics;

// =============================================================================
// Outbound Message
// =============================================================================

/// A message on its way to one subscriber session.
#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ServerMessage<'a> {
    /// The store has no snapshot yet (no cycle has completed).
    Pending,
    /// A complete snapshot.
    Snapshot {
        /// When the snapshot was captured.
        as_of: DateTime<Utc>,
        /// Per-instrument entries in universe order.
        entries: &'a [SnapshotEntry],
    },
}

impl<'a> ServerMessage<'a> {
    fn snapshot(snapshot: &'a Snapshot) -> Self {
        Self::Snapshot {
            as_of: snapshot.taken_at(),
            entries: snapshot.entries(),
        }
    }

    fn encode(&self) -> Option<String> {
        serde_json::to_string(self)
            .map_err(|e| tracing::error!(error = %e, "failed to encode outbound message"))
            .ok()
    }
}

// =============================================================================
// Session State
// =============================================================================

/// Shared state for the WebSocket endpoint.
pub struct WsSessionState {
    store: Arc<SnapshotStore>,
    hub: SharedBroadcastHub,
    sessions: AtomicUsize,
}

impl WsSessionState {
    /// Create new session state.
    #[must_use]
    pub const fn new(store: Arc<SnapshotStore>, hub: SharedBroadcastHub) -> Self {
        Self {
            store,
            hub,
            sessions: AtomicUsize::new(0),
        }
    }

    /// Number of currently connected sessions.
    #[must_use]
    pub fn session_count(&self) -> usize {
        self.sessions.load(Ordering::Relaxed)
    }
}

// =============================================================================
// Server
// =============================================================================

/// WebSocket push server.
pub struct QuoteStreamServer {
    port: u16,
    state: Arc<WsSessionState>,
    cancel: CancellationToken,
}

impl QuoteStreamServer {
    /// Create a new server.
    #[must_use]
    pub const fn new(port: u16, state: Arc<WsSessionState>, cancel: CancellationToken) -> Self {
        Self {
            port,
            state,
            cancel,
        }
    }

    /// Run the server until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `WsServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), WsServerError> {
        let app = router(self.state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| WsServerError::BindFailed(self.port, e.to_string()))?;

        tracing::info!(port = self.port, "WebSocket server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| WsServerError::ServerFailed(e.to_string()))?;

        tracing::info!("WebSocket server stopped");
        Ok(())
    }
}

/// Build the router serving `/ws`.
#[must_use]
pub fn router(state: Arc<WsSessionState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(state)
}

// =============================================================================
// Session Handling
// =============================================================================

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<WsSessionState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_session(socket, state))
}

async fn handle_session(socket: WebSocket, state: Arc<WsSessionState>) {
    let session_id = Uuid::new_v4();
    state.sessions.fetch_add(1, Ordering::Relaxed);
    metrics::session_opened();
    tracing::info!(%session_id, "subscriber connected");

    // Subscribe before the initial push so no promotion between the two
    // can be missed.
    let mut snapshot_rx = state.hub.snapshot_rx();
    let (mut sender, mut receiver) = socket.split();

    let initial = match state.store.read() {
        Some(snapshot) => ServerMessage::snapshot(&snapshot).encode(),
        None => ServerMessage::Pending.encode(),
    };
    let connected = match initial {
        Some(text) => sender.send(Message::Text(text.into())).await.is_ok(),
        None => false,
    };

    if connected {
        run_session_loop(session_id, &mut sender, &mut receiver, &mut snapshot_rx).await;
    }

    state.sessions.fetch_sub(1, Ordering::Relaxed);
    metrics::session_closed();
    tracing::info!(%session_id, "subscriber disconnected");
}

async fn run_session_loop(
    session_id: Uuid,
    sender: &mut futures_util::stream::SplitSink<WebSocket, Message>,
    receiver: &mut futures_util::stream::SplitStream<WebSocket>,
    snapshot_rx: &mut tokio::sync::broadcast::Receiver<crate::infrastructure::broadcast::SnapshotBroadcast>,
) {
    loop {
        tokio::select! {
            update = snapshot_rx.recv() => match update {
                Ok(update) => {
                    let Some(text) = ServerMessage::snapshot(&update.snapshot).encode() else {
                        continue;
                    };
                    if sender.send(Message::Text(text.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    // Stale snapshots are worthless; skip ahead to the
                    // newest one on the next recv.
                    tracing::warn!(%session_id, skipped, "session lagging behind broadcasts");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Ping(payload))) => {
                    if sender.send(Message::Pong(payload)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {
                    // Subscribers have nothing to say; ignore.
                }
                Some(Err(e)) => {
                    tracing::debug!(%session_id, error = %e, "session transport error");
                    break;
                }
            },
        }
    }
}

// =============================================================================
// Errors
// =============================================================================

/// WebSocket server errors.
#[derive(Debug, thiserror::Error)]
pub enum WsServerError {
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
