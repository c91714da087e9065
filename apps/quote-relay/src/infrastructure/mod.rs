//! Infrastructure layer - Adapters and external integrations.

/// Yahoo-style HTTP quote provider client.
pub mod yahoo;

/// Channel-based snapshot distribution.
pub mod broadcast;

/// Subscriber-facing WebSocket endpoint.
pub mod ws;

/// Health check HTTP endpoint.
pub mod health;

/// Prometheus metrics.
pub mod metrics;

/// Tracing initialization.
pub mod telemetry;

/// Configuration loaded from the environment.
pub mod config;
