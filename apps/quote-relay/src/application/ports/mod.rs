//! Port Interfaces
//!
//! Contracts between the update cycle and the outside world, following
//! the hexagonal layering: the application layer depends on these traits,
//! infrastructure adapters implement them.
//!
//! ## Driven Ports (Outbound)
//!
//! - [`QuoteFetcher`]: one-shot quote retrieval for a single instrument

use async_trait::async_trait;

use crate::domain::quote::QuoteRecord;

/// Errors a quote fetch can produce.
///
/// The `Display` form becomes the failure reason recorded in the
/// instrument's snapshot slot.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The request never reached the provider or the connection broke.
    #[error("request failed: {0}")]
    Transport(String),

    /// The provider answered with a non-success HTTP status.
    #[error("provider returned HTTP {status}")]
    Http {
        /// HTTP status code.
        status: u16,
    },

    /// The provider response could not be decoded.
    #[error("failed to decode provider response: {0}")]
    Decode(String),

    /// The provider returned no quote for the symbol.
    #[error("no quote returned")]
    Empty,

    /// The fetch exceeded the configured per-fetch bound.
    #[error("timeout")]
    Timeout,
}

/// Retrieves the current quote for one instrument.
///
/// The relay performs no retries; a returned error occupies that
/// instrument's snapshot slot for the cycle and the next cycle tries
/// again from scratch.
#[async_trait]
pub trait QuoteFetcher: Send + Sync {
    /// Fetch the current quote for `symbol`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` when the quote could not be retrieved; the
    /// error never aborts the surrounding update cycle.
    async fn fetch(&self, symbol: &str) -> Result<QuoteRecord, FetchError>;
}
