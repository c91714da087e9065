//! Snapshots, the Snapshot Store, and Change Detection
//!
//! A snapshot is one complete point-in-time view of the universe: exactly
//! one entry per instrument, in universe order. The store holds the single
//! current snapshot behind an `Arc` swap, so readers always observe a
//! complete snapshot and never a partially-written one.
//!
//! Change detection compares entries structurally - field values and
//! failure markers - and deliberately ignores the capture timestamp, so a
//! cycle that re-fetches identical data is never re-broadcast under the
//! on-change policy.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

use super::quote::SnapshotEntry;

// =============================================================================
// Snapshot
// =============================================================================

/// One complete, ordered view of the universe.
#[derive(Debug, Clone)]
pub struct Snapshot {
    taken_at: DateTime<Utc>,
    entries: Vec<SnapshotEntry>,
}

impl Snapshot {
    /// Create a snapshot captured now.
    #[must_use]
    pub fn new(entries: Vec<SnapshotEntry>) -> Self {
        Self {
            taken_at: Utc::now(),
            entries,
        }
    }

    /// When this snapshot was captured.
    #[must_use]
    pub const fn taken_at(&self) -> DateTime<Utc> {
        self.taken_at
    }

    /// Entries in universe order.
    #[must_use]
    pub fn entries(&self) -> &[SnapshotEntry] {
        &self.entries
    }

    /// Number of entries (equals the universe size).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of failed-fetch entries.
    #[must_use]
    pub fn failed_count(&self) -> usize {
        self.entries.iter().filter(|e| e.is_failure()).count()
    }

    /// Structural equality over entries only, ignoring the capture time.
    #[must_use]
    pub fn entries_eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

// =============================================================================
// Broadcast Policy (Change Detector)
// =============================================================================

/// When a freshly built candidate snapshot warrants a broadcast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BroadcastPolicy {
    /// Broadcast only when the candidate differs from the stored snapshot.
    #[default]
    OnChange,
    /// Broadcast every cycle regardless of change.
    Always,
}

impl BroadcastPolicy {
    /// Parse policy from string.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "always" => Self::Always,
            _ => Self::OnChange,
        }
    }

    /// Get the policy name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::OnChange => "on-change",
            Self::Always => "always",
        }
    }

    /// Decide whether `candidate` should replace the store and be pushed.
    ///
    /// An uninitialized store always broadcasts: subscribers must see the
    /// first completed cycle.
    #[must_use]
    pub fn should_broadcast(self, current: Option<&Snapshot>, candidate: &Snapshot) -> bool {
        match self {
            Self::Always => true,
            Self::OnChange => current.is_none_or(|stored| !stored.entries_eq(candidate)),
        }
    }
}

// =============================================================================
// Snapshot Store
// =============================================================================

/// Holds the single current snapshot.
///
/// `read` and `replace` are constant-time and non-blocking with respect to
/// in-flight update cycles: the snapshot itself is immutable and shared by
/// `Arc`, and only the pointer swap takes the lock.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    current: RwLock<Option<Arc<Snapshot>>>,
}

impl SnapshotStore {
    /// Create an empty, uninitialized store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The current snapshot, or `None` before the first cycle completes.
    #[must_use]
    pub fn read(&self) -> Option<Arc<Snapshot>> {
        self.current.read().clone()
    }

    /// Atomically replace the stored snapshot.
    pub fn replace(&self, snapshot: Arc<Snapshot>) {
        *self.current.write() = Some(snapshot);
    }

    /// Whether at least one cycle has been promoted into the store.
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.current.read().is_some()
    }
}

// =============================================================================
// Tests
// =============================================================================
