#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Quote Relay - Periodic Snapshot Broadcaster
//!
//! A service that polls a quote provider for a fixed instrument universe
//! on a fixed cadence, assembles each poll into a point-in-time snapshot,
//! and pushes changed snapshots to WebSocket subscribers.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Core snapshot logic and data types
//!   - `universe`: The fixed instrument list and its validation
//!   - `quote`: Per-instrument quote records and failure entries
//!   - `snapshot`: Snapshot assembly, change detection, the store
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: The quote fetcher interface
//!   - `services`: The update cycle and its scheduler
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `yahoo`: HTTP client for the quote provider
//!   - `broadcast`: Channel-based snapshot distribution
//!   - `ws`: Subscriber-facing WebSocket endpoint
//!   - `health`: Health check HTTP endpoint
//!   - `config`: Configuration loaded from the environment
//!
//! # Data Flow
//!
//! ```text
//!                ┌───────────┐     ┌──────────┐     ┌───────────┐
//! Quote API ────►│  Update   │────►│ Snapshot │────►│ WebSocket │──► Client 1
//!  (HTTP)        │  Cycle    │     │  Store + │     │  Server   │──► Client 2
//!                └───────────┘     │ Broadcast│     └───────────┘──► Client N
//!                      ▲           └──────────┘
//!                 Scheduler
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core snapshot types with no external integrations.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::quote::{
    FetchFailure, MissingFieldPolicy, QuoteRecord, SnapshotEntry, Symbol,
};
pub use domain::snapshot::{BroadcastPolicy, Snapshot, SnapshotStore};
pub use domain::universe::{NIFTY_50, Universe, UniverseError};

// Application ports and services
pub use application::ports::{FetchError, QuoteFetcher};
pub use application::services::{CycleOutcome, Scheduler, UpdateCycleService};

// Infrastructure config
pub use infrastructure::config::{
    BroadcastSettings, ConfigError, ProviderSettings, RelayConfig, ServerSettings,
};

// Health server
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};

// Broadcast hub (for integration tests)
pub use infrastructure::broadcast::{
    BroadcastConfig, BroadcastHub, SharedBroadcastHub, SnapshotBroadcast,
};

// WebSocket server (for integration tests)
pub use infrastructure::ws::{QuoteStreamServer, WsServerError, WsSessionState};

// Provider client
pub use infrastructure::yahoo::YahooQuoteClient;

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry;
