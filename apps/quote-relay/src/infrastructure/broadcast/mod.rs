//! Broadcast Channel Adapter
//!
//! Distributes promoted snapshots to WebSocket sessions using a tokio
//! broadcast channel: every session holds a receiver, the update cycle
//! sends once per promoted snapshot. Snapshots travel as `Arc`s, so a
//! broadcast to many sessions never clones the data.

use std::sync::Arc;

use tokio::sync::broadcast;

use crate::domain::snapshot::Snapshot;
use crate::infrastructure::config::BroadcastSettings;

// =============================================================================
// Broadcast Message
// =============================================================================

/// A promoted snapshot on its way to subscribers.
#[derive(Debug, Clone)]
pub struct SnapshotBroadcast {
    /// The snapshot data.
    pub snapshot: Arc<Snapshot>,
}

// =============================================================================
// Broadcast Hub
// =============================================================================

/// Configuration for the broadcast channel capacity.
#[derive(Debug, Clone, Copy)]
pub struct BroadcastConfig {
    /// Capacity of the snapshot channel. A session that lags behind by
    /// more than this many snapshots skips ahead to the newest one.
    pub snapshot_capacity: usize,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            snapshot_capacity: 64,
        }
    }
}

impl From<BroadcastSettings> for BroadcastConfig {
    fn from(settings: BroadcastSettings) -> Self {
        Self {
            snapshot_capacity: settings.snapshot_capacity,
        }
    }
}

/// Hub for the snapshot broadcast channel.
#[derive(Debug)]
pub struct BroadcastHub {
    snapshot_tx: broadcast::Sender<SnapshotBroadcast>,
}

impl BroadcastHub {
    /// Create a new broadcast hub with the given configuration.
    #[must_use]
    pub fn new(config: BroadcastConfig) -> Self {
        Self {
            snapshot_tx: broadcast::channel(config.snapshot_capacity).0,
        }
    }

    /// Create a new broadcast hub with default configuration.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(BroadcastConfig::default())
    }

    /// Send a snapshot to all subscribed sessions.
    ///
    /// Returns the number of receivers that received the message, or
    /// `None` if there are no active receivers.
    #[must_use]
    pub fn send_snapshot(&self, snapshot: Arc<Snapshot>) -> Option<usize> {
        self.snapshot_tx.send(SnapshotBroadcast { snapshot }).ok()
    }

    /// Get a new receiver for promoted snapshots.
    #[must_use]
    pub fn snapshot_rx(&self) -> broadcast::Receiver<SnapshotBroadcast> {
        self.snapshot_tx.subscribe()
    }

    /// Get the number of active snapshot receivers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.snapshot_tx.receiver_count()
    }
}

/// Shared broadcast hub reference.
pub type SharedBroadcastHub = Arc<BroadcastHub>;

// =============================================================================
// Tests
// =============================================================================
