//! Application layer - Use cases and port definitions.

/// Ports - interfaces the infrastructure adapters implement.
pub mod ports;

/// Services - the update cycle and its scheduler.
pub mod services;
