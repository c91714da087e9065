//! Update Cycle Integration Tests
//!
//! Tests the fetch fan-out, partial-failure isolation, change detection,
//! field policies, fetch timeouts, and the scheduler's single-flight
//! cadence (driven on tokio's paused clock).

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::collections::HashSet;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::broadcast::error::TryRecvError;
use tokio_util::sync::CancellationToken;

use quote_relay::{
    BroadcastHub, BroadcastPolicy, FetchError, MissingFieldPolicy, QuoteFetcher, QuoteRecord,
    Scheduler, SnapshotEntry, SnapshotStore, Universe, UpdateCycleService,
};

/// Scripted fetcher: configurable failures, latency, and a call counter.
struct StubFetcher {
    fail: HashSet<String>,
    delay: Option<Duration>,
    price: Decimal,
    calls: AtomicUsize,
}

impl StubFetcher {
    fn new(price: &str) -> Self {
        Self {
            fail: HashSet::new(),
            delay: None,
            price: Decimal::from_str(price).unwrap(),
            calls: AtomicUsize::new(0),
        }
    }

    fn failing(mut self, symbols: &[&str]) -> Self {
        self.fail = symbols.iter().map(|s| (*s).to_string()).collect();
        self
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl QuoteFetcher for StubFetcher {
    async fn fetch(&self, symbol: &str) -> Result<QuoteRecord, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail.contains(symbol) {
            return Err(FetchError::Transport("connection refused".to_string()));
        }
        Ok(QuoteRecord {
            last_price: Some(self.price),
            ..QuoteRecord::unavailable(symbol.to_string())
        })
    }
}

fn universe(symbols: &[&str]) -> Universe {
    Universe::new(symbols.iter().map(|s| (*s).to_string()).collect()).unwrap()
}

fn service_with(
    fetcher: Arc<StubFetcher>,
    symbols: &[&str],
    broadcast_policy: BroadcastPolicy,
    missing_fields: MissingFieldPolicy,
    fetch_timeout: Option<Duration>,
) -> UpdateCycleService {
    UpdateCycleService::new(
        universe(symbols),
        fetcher,
        Arc::new(SnapshotStore::new()),
        Arc::new(BroadcastHub::with_defaults()),
        broadcast_policy,
        missing_fields,
        fetch_timeout,
    )
}

fn default_service(fetcher: Arc<StubFetcher>, symbols: &[&str]) -> UpdateCycleService {
    service_with(
        fetcher,
        symbols,
        BroadcastPolicy::OnChange,
        MissingFieldPolicy::Unavailable,
        None,
    )
}

// =============================================================================
// Snapshot Assembly
// =============================================================================

#[tokio::test]
async fn snapshot_preserves_universe_order() {
    let fetcher = Arc::new(StubFetcher::new("100.5"));
    let service = default_service(fetcher, &["INFY.NS", "TCS.NS", "SBIN.NS"]);

    let outcome = service.run_cycle().await;
    assert_eq!(outcome.entries, 3);
    assert_eq!(outcome.failures, 0);

    let snapshot = service.store().read().unwrap();
    let symbols: Vec<&str> = snapshot.entries().iter().map(SnapshotEntry::symbol).collect();
    assert_eq!(symbols, ["INFY.NS", "TCS.NS", "SBIN.NS"]);
}

#[tokio::test]
async fn empty_universe_yields_empty_snapshot() {
    let fetcher = Arc::new(StubFetcher::new("100.5"));
    let service = default_service(Arc::clone(&fetcher), &[]);

    let outcome = service.run_cycle().await;
    assert_eq!(outcome.entries, 0);
    assert_eq!(fetcher.calls(), 0);
    assert!(service.store().read().unwrap().is_empty());
}

#[tokio::test]
async fn failures_are_isolated_per_symbol() {
    let fetcher = Arc::new(StubFetcher::new("100.5").failing(&["TCS.NS"]));
    let service = default_service(fetcher, &["INFY.NS", "TCS.NS", "SBIN.NS"]);

    let outcome = service.run_cycle().await;
    assert_eq!(outcome.entries, 3);
    assert_eq!(outcome.failures, 1);

    let snapshot = service.store().read().unwrap();
    match &snapshot.entries()[1] {
        SnapshotEntry::Failed(failure) => {
            assert_eq!(failure.symbol, "TCS.NS");
            assert!(failure.error.contains("connection refused"));
        }
        SnapshotEntry::Quote(_) => panic!("expected a failure entry"),
    }
    assert!(!snapshot.entries()[0].is_failure());
    assert!(!snapshot.entries()[2].is_failure());
}

// =============================================================================
// Change Detection
// =============================================================================

#[tokio::test]
async fn identical_cycles_broadcast_once() {
    let fetcher = Arc::new(StubFetcher::new("100.5"));
    let hub = Arc::new(BroadcastHub::with_defaults());
    let service = UpdateCycleService::new(
        universe(&["TCS.NS"]),
        fetcher,
        Arc::new(SnapshotStore::new()),
        Arc::clone(&hub),
        BroadcastPolicy::OnChange,
        MissingFieldPolicy::Unavailable,
        None,
    );

    let mut rx = hub.snapshot_rx();
    let first = service.run_cycle().await;
    let second = service.run_cycle().await;

    assert!(first.broadcast);
    assert!(!second.broadcast);

    rx.try_recv().unwrap();
    assert!(matches!(rx.try_recv(), Err(TryRecvError::Empty)));
}

#[tokio::test]
async fn always_mode_broadcasts_every_cycle() {
    let fetcher = Arc::new(StubFetcher::new("100.5"));
    let service = service_with(
        fetcher,
        &["TCS.NS"],
        BroadcastPolicy::Always,
        MissingFieldPolicy::Unavailable,
        None,
    );

    assert!(service.run_cycle().await.broadcast);
    assert!(service.run_cycle().await.broadcast);
}

// =============================================================================
// Field Policies
// =============================================================================

#[tokio::test]
async fn zero_policy_fills_unavailable_fields() {
    let fetcher = Arc::new(StubFetcher::new("100.5"));
    let service = service_with(
        fetcher,
        &["TCS.NS"],
        BroadcastPolicy::OnChange,
        MissingFieldPolicy::Zero,
        None,
    );

    service.run_cycle().await;
    let snapshot = service.store().read().unwrap();
    match &snapshot.entries()[0] {
        SnapshotEntry::Quote(record) => {
            assert_eq!(record.last_price, Some(Decimal::from_str("100.5").unwrap()));
            assert_eq!(record.open, Some(Decimal::ZERO));
            assert_eq!(record.volume, Some(0));
        }
        SnapshotEntry::Failed(_) => panic!("expected a quote entry"),
    }
}

#[tokio::test]
async fn unavailable_policy_serializes_null() {
    let fetcher = Arc::new(StubFetcher::new("100.5"));
    let service = default_service(fetcher, &["TCS.NS"]);

    service.run_cycle().await;
    let snapshot = service.store().read().unwrap();
    let value = serde_json::to_value(&snapshot.entries()[0]).unwrap();
    assert_eq!(value["ltp"], "100.5");
    assert!(value["open"].is_null());
    assert!(value["volume"].is_null());
}

// =============================================================================
// Timeouts and Scheduling
// =============================================================================

#[tokio::test(start_paused = true)]
async fn slow_fetch_times_out_into_failure_entry() {
    let fetcher = Arc::new(StubFetcher::new("100.5").delayed(Duration::from_secs(60)));
    let service = service_with(
        fetcher,
        &["TCS.NS"],
        BroadcastPolicy::OnChange,
        MissingFieldPolicy::Unavailable,
        Some(Duration::from_secs(5)),
    );

    let outcome = service.run_cycle().await;
    assert_eq!(outcome.failures, 1);

    let snapshot = service.store().read().unwrap();
    match &snapshot.entries()[0] {
        SnapshotEntry::Failed(failure) => assert!(failure.error.contains("timeout")),
        SnapshotEntry::Quote(_) => panic!("expected a failure entry"),
    }
}

#[tokio::test(start_paused = true)]
async fn overrunning_cycle_skips_ticks_instead_of_queuing() {
    // Each cycle takes 25s against a 10s period: ticks at t=10 and t=20
    // land mid-cycle and must be skipped, so by t=40 exactly two cycles
    // have started (t=0 and t=30).
    let fetcher = Arc::new(StubFetcher::new("100.5").delayed(Duration::from_secs(25)));
    let service = Arc::new(default_service(Arc::clone(&fetcher), &["TCS.NS"]));

    let cancel = CancellationToken::new();
    let scheduler = Scheduler::new(service, Duration::from_secs(10), cancel.clone());
    let handle = tokio::spawn(scheduler.run());

    tokio::time::sleep(Duration::from_secs(40)).await;
    cancel.cancel();
    handle.await.unwrap();

    assert_eq!(fetcher.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn first_cycle_runs_immediately() {
    let fetcher = Arc::new(StubFetcher::new("100.5"));
    let service = Arc::new(default_service(fetcher, &["TCS.NS"]));
    let store = Arc::clone(service.store());

    let cancel = CancellationToken::new();
    let scheduler = Scheduler::new(service, Duration::from_secs(3600), cancel.clone());
    let handle = tokio::spawn(scheduler.run());

    tokio::time::sleep(Duration::from_secs(1)).await;
    cancel.cancel();
    handle.await.unwrap();

    assert!(store.is_initialized());
}
