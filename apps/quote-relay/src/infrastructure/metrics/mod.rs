//! Prometheus Metrics Module
//!
//! Exposes application metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Cycles**: update cycle counts, durations, and broadcast decisions
//! - **Fetches**: per-instrument fetch failures
//! - **Sessions**: connected WebSocket subscriber count
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the health server port.

use std::sync::OnceLock;
use std::time::Duration;

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// # Panics
///
/// Panics if the recorder cannot be installed.
#[allow(clippy::expect_used)]
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let builder = PrometheusBuilder::new();
            let handle = builder
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            register_metrics();
            handle
        })
        .clone()
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "quote_relay_cycles_total",
        "Total update cycles completed"
    );
    describe_counter!(
        "quote_relay_broadcasts_total",
        "Total snapshots promoted and broadcast to subscribers"
    );
    describe_counter!(
        "quote_relay_fetch_failures_total",
        "Total per-instrument fetch failures recorded in snapshots"
    );

    describe_gauge!(
        "quote_relay_sessions",
        "Number of connected WebSocket subscriber sessions"
    );
    describe_gauge!(
        "quote_relay_snapshot_entries",
        "Entries in the most recent candidate snapshot"
    );

    describe_histogram!(
        "quote_relay_cycle_duration_seconds",
        "Wall-clock duration of one update cycle"
    );
}

// =============================================================================
// Metric Recording Functions
// =============================================================================

/// Record the outcome of one completed update cycle.
pub fn record_cycle(duration: Duration, entries: usize, failures: usize, broadcast: bool) {
    counter!("quote_relay_cycles_total").increment(1);
    if broadcast {
        counter!("quote_relay_broadcasts_total").increment(1);
    }
    if failures > 0 {
        counter!("quote_relay_fetch_failures_total").increment(failures as u64);
    }
    #[allow(clippy::cast_precision_loss)]
    gauge!("quote_relay_snapshot_entries").set(entries as f64);
    histogram!("quote_relay_cycle_duration_seconds").record(duration.as_secs_f64());
}

/// Record a subscriber session opening.
pub fn session_opened() {
    gauge!("quote_relay_sessions").increment(1.0);
}

/// Record a subscriber session closing.
pub fn session_closed() {
    gauge!("quote_relay_sessions").decrement(1.0);
}
