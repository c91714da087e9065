//! Domain layer - Core quote and snapshot types with no I/O.

/// Instrument universe - the fixed, ordered symbol list.
pub mod universe;

/// Quote records and per-instrument snapshot entries.
pub mod quote;

/// Snapshots, the snapshot store, and change detection.
pub mod snapshot;
