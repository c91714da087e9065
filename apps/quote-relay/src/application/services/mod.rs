//! Update Cycle and Scheduler
//!
//! The core of the relay: [`UpdateCycleService`] runs one
//! fetch-everything-then-maybe-broadcast cycle, and [`Scheduler`] drives
//! it at a fixed cadence with at most one cycle in flight.
//!
//! # Cycle
//!
//! ```text
//! tick ──► fetch all symbols concurrently ──► candidate snapshot
//!                                                   │
//!                       stored snapshot ──► change detection
//!                                                   │ changed (or always)
//!                                     store.replace + hub broadcast
//! ```
//!
//! Per-instrument failures are isolated into their snapshot slot; the
//! candidate always has exactly one entry per universe symbol, in
//! universe order, regardless of fetch completion order.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::join_all;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{FetchError, QuoteFetcher};
use crate::domain::quote::{FetchFailure, MissingFieldPolicy, SnapshotEntry, Symbol};
use crate::domain::snapshot::{BroadcastPolicy, Snapshot, SnapshotStore};
use crate::domain::universe::Universe;
use crate::infrastructure::broadcast::SharedBroadcastHub;
use crate::infrastructure::metrics;

// =============================================================================
// Cycle Outcome
// =============================================================================

/// Summary of one completed update cycle.
#[derive(Debug, Clone, Copy)]
pub struct CycleOutcome {
    /// Entries in the candidate snapshot (equals the universe size).
    pub entries: usize,
    /// How many entries are fetch failures.
    pub failures: usize,
    /// Whether the candidate was promoted and broadcast.
    pub broadcast: bool,
    /// Sessions that received the broadcast (0 when not broadcast).
    pub receivers: usize,
}

// =============================================================================
// Update Cycle Service
// =============================================================================

/// Runs one full update cycle: fetch fan-out, change detection,
/// store promotion, and subscriber broadcast.
pub struct UpdateCycleService {
    universe: Universe,
    fetcher: Arc<dyn QuoteFetcher>,
    store: Arc<SnapshotStore>,
    hub: SharedBroadcastHub,
    broadcast_policy: BroadcastPolicy,
    missing_fields: MissingFieldPolicy,
    fetch_timeout: Option<Duration>,
}

impl UpdateCycleService {
    /// Create a new service.
    #[must_use]
    pub fn new(
        universe: Universe,
        fetcher: Arc<dyn QuoteFetcher>,
        store: Arc<SnapshotStore>,
        hub: SharedBroadcastHub,
        broadcast_policy: BroadcastPolicy,
        missing_fields: MissingFieldPolicy,
        fetch_timeout: Option<Duration>,
    ) -> Self {
        Self {
            universe,
            fetcher,
            store,
            hub,
            broadcast_policy,
            missing_fields,
            fetch_timeout,
        }
    }

    /// The store this service promotes snapshots into.
    #[must_use]
    pub fn store(&self) -> &Arc<SnapshotStore> {
        &self.store
    }

    /// Run one update cycle.
    ///
    /// Never fails: per-instrument errors land in their snapshot slot,
    /// and an unchanged candidate is simply discarded.
    pub async fn run_cycle(&self) -> CycleOutcome {
        let started = Instant::now();
        let candidate = self.collect_candidate().await;
        let entries = candidate.len();
        let failures = candidate.failed_count();

        let broadcast = {
            let current = self.store.read();
            self.broadcast_policy
                .should_broadcast(current.as_deref(), &candidate)
        };

        let mut receivers = 0;
        if broadcast {
            let snapshot = Arc::new(candidate);
            self.store.replace(Arc::clone(&snapshot));
            receivers = self.hub.send_snapshot(snapshot).unwrap_or(0);
        }

        metrics::record_cycle(started.elapsed(), entries, failures, broadcast);
        CycleOutcome {
            entries,
            failures,
            broadcast,
            receivers,
        }
    }

    /// Fetch every universe symbol concurrently and assemble the
    /// candidate snapshot in universe order.
    async fn collect_candidate(&self) -> Snapshot {
        let fetches = self.universe.symbols().iter().map(|s| self.fetch_entry(s));
        Snapshot::new(join_all(fetches).await)
    }

    /// Fetch one symbol, mapping errors and timeouts into its slot.
    async fn fetch_entry(&self, symbol: &Symbol) -> SnapshotEntry {
        let result = match self.fetch_timeout {
            Some(limit) => match tokio::time::timeout(limit, self.fetcher.fetch(symbol)).await {
                Ok(result) => result,
                Err(_) => Err(FetchError::Timeout),
            },
            None => self.fetcher.fetch(symbol).await,
        };

        match result {
            Ok(record) => SnapshotEntry::Quote(self.missing_fields.apply(record)),
            Err(error) => {
                tracing::debug!(symbol = %symbol, error = %error, "quote fetch failed");
                SnapshotEntry::Failed(FetchFailure {
                    symbol: symbol.clone(),
                    error: error.to_string(),
                })
            }
        }
    }
}

// =============================================================================
// Scheduler
// =============================================================================

/// Drives the update cycle at a fixed period.
///
/// The cycle is awaited inside the scheduler's own loop, so at most one
/// cycle is ever in flight; ticks that land while a cycle is still
/// running are skipped, never queued. The first tick fires immediately,
/// so subscribers never wait a full period for the store to initialize.
pub struct Scheduler {
    service: Arc<UpdateCycleService>,
    period: Duration,
    cancel: CancellationToken,
}

impl Scheduler {
    /// Create a new scheduler.
    #[must_use]
    pub const fn new(
        service: Arc<UpdateCycleService>,
        period: Duration,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            service,
            period,
            cancel,
        }
    }

    /// Run until cancelled.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(period_secs = self.period.as_secs(), "scheduler started");

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    tracing::info!("scheduler stopped");
                    break;
                }
                _ = ticker.tick() => {
                    match AssertUnwindSafe(self.service.run_cycle()).catch_unwind().await {
                        Ok(outcome) => {
                            tracing::info!(
                                entries = outcome.entries,
                                failures = outcome.failures,
                                broadcast = outcome.broadcast,
                                receivers = outcome.receivers,
                                "update cycle finished"
                            );
                        }
                        Err(_) => {
                            tracing::error!("update cycle panicked; previous snapshot kept");
                        }
                    }
                }
            }
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use mockall::mock;
    use rust_decimal::Decimal;

    use crate::domain::quote::QuoteRecord;
    use crate::infrastructure::broadcast::BroadcastHub;

    use super::*;

    mock! {
        Fetcher {}

        #[async_trait::async_trait]
        impl QuoteFetcher for Fetcher {
            async fn fetch(&self, symbol: &str) -> Result<QuoteRecord, FetchError>;
        }
    }

    fn make_quote(symbol: &str, price: &str) -> QuoteRecord {
        QuoteRecord {
            last_price: Some(Decimal::from_str(price).unwrap()),
            ..QuoteRecord::unavailable(symbol.to_string())
        }
    }

    fn make_service(fetcher: MockFetcher, symbols: &[&str]) -> UpdateCycleService {
        let universe =
            Universe::new(symbols.iter().map(|s| (*s).to_string()).collect()).unwrap();
        UpdateCycleService::new(
            universe,
            Arc::new(fetcher),
            Arc::new(SnapshotStore::new()),
            Arc::new(BroadcastHub::with_defaults()),
            BroadcastPolicy::OnChange,
            MissingFieldPolicy::Unavailable,
            None,
        )
    }

    #[tokio::test]
    async fn failure_is_isolated_to_its_slot() {
        let mut fetcher = MockFetcher::new();
        fetcher.expect_fetch().returning(|symbol| {
            if symbol == "BBB" {
                Err(FetchError::Transport("connection refused".to_string()))
            } else {
                Ok(make_quote(symbol, "100.5"))
            }
        });

        let service = make_service(fetcher, &["AAA", "BBB", "CCC"]);
        let outcome = service.run_cycle().await;

        assert_eq!(outcome.entries, 3);
        assert_eq!(outcome.failures, 1);
        assert!(outcome.broadcast);

        let snapshot = service.store().read().unwrap();
        let symbols: Vec<&str> = snapshot.entries().iter().map(SnapshotEntry::symbol).collect();
        assert_eq!(symbols, ["AAA", "BBB", "CCC"]);
        assert!(!snapshot.entries()[0].is_failure());
        assert!(snapshot.entries()[1].is_failure());
        assert!(!snapshot.entries()[2].is_failure());
    }

    #[tokio::test]
    async fn unchanged_candidate_is_discarded() {
        let mut fetcher = MockFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|symbol| Ok(make_quote(symbol, "100.5")));

        let service = make_service(fetcher, &["AAA"]);
        let first = service.run_cycle().await;
        let first_snapshot = service.store().read().unwrap();
        let second = service.run_cycle().await;

        assert!(first.broadcast);
        assert!(!second.broadcast);
        // The store still holds the first promoted snapshot.
        assert!(Arc::ptr_eq(&first_snapshot, &service.store().read().unwrap()));
    }
}
