//! Quote Records and Snapshot Entries
//!
//! Per-instrument quote data as it appears in a snapshot. Each numeric
//! field is either a present value or an explicit "unavailable" marker
//! (`None`); a failed fetch is a distinct entry shape carrying the reason,
//! never a zeroed-out quote.
//!
//! # Wire Format
//!
//! Entries serialize to the subscriber-facing JSON shape:
//!
//! ```json
//! {"symbol": "TCS.NS", "ltp": "4120.5", "change": "-12.3", ...}
//! {"symbol": "INFY.NS", "error": "timeout"}
//! ```
//!
//! Prices serialize as decimal strings so numeric precision is lossless;
//! unavailable fields serialize as `null`, which keeps them distinct from
//! a genuine zero.

use rust_decimal::Decimal;
use serde::Serialize;

/// A symbol string identifying one instrument.
pub type Symbol = String;

// =============================================================================
// Quote Record
// =============================================================================

/// One instrument's quote fields.
///
/// Every numeric field is optional: `None` means the provider did not
/// report the field. See [`MissingFieldPolicy`] for how unavailable fields
/// are treated before a snapshot is published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRecord {
    /// Instrument symbol.
    pub symbol: Symbol,
    /// Last traded price.
    #[serde(rename = "ltp")]
    pub last_price: Option<Decimal>,
    /// Absolute change since previous close.
    pub change: Option<Decimal>,
    /// Percent change since previous close.
    pub percent_change: Option<Decimal>,
    /// Opening price.
    pub open: Option<Decimal>,
    /// Day high.
    #[serde(rename = "high")]
    pub day_high: Option<Decimal>,
    /// Day low.
    #[serde(rename = "low")]
    pub day_low: Option<Decimal>,
    /// Previous close.
    pub prev_close: Option<Decimal>,
    /// Traded volume.
    pub volume: Option<u64>,
    /// Market capitalization.
    pub market_cap: Option<Decimal>,
}

impl QuoteRecord {
    /// A record for `symbol` with every field unavailable.
    #[must_use]
    pub const fn unavailable(symbol: Symbol) -> Self {
        Self {
            symbol,
            last_price: None,
            change: None,
            percent_change: None,
            open: None,
            day_high: None,
            day_low: None,
            prev_close: None,
            volume: None,
            market_cap: None,
        }
    }

    /// Replace every unavailable field with zero.
    #[must_use]
    pub fn zero_filled(self) -> Self {
        Self {
            symbol: self.symbol,
            last_price: Some(self.last_price.unwrap_or(Decimal::ZERO)),
            change: Some(self.change.unwrap_or(Decimal::ZERO)),
            percent_change: Some(self.percent_change.unwrap_or(Decimal::ZERO)),
            open: Some(self.open.unwrap_or(Decimal::ZERO)),
            day_high: Some(self.day_high.unwrap_or(Decimal::ZERO)),
            day_low: Some(self.day_low.unwrap_or(Decimal::ZERO)),
            prev_close: Some(self.prev_close.unwrap_or(Decimal::ZERO)),
            volume: Some(self.volume.unwrap_or(0)),
            market_cap: Some(self.market_cap.unwrap_or(Decimal::ZERO)),
        }
    }
}

// =============================================================================
// Missing-Field Policy
// =============================================================================

/// How unavailable numeric fields are handled before publication.
///
/// Applied uniformly to all fields of all instruments; the two modes were
/// both observed in production deployments of this logic, so the choice is
/// an explicit configuration axis rather than a hard-coded behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingFieldPolicy {
    /// Keep unavailable fields as `null` on the wire.
    #[default]
    Unavailable,
    /// Substitute zero for unavailable fields.
    Zero,
}

impl MissingFieldPolicy {
    /// Parse policy from string.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "zero" => Self::Zero,
            _ => Self::Unavailable,
        }
    }

    /// Get the policy name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::Zero => "zero",
        }
    }

    /// Apply this policy to a fetched record.
    #[must_use]
    pub fn apply(self, record: QuoteRecord) -> QuoteRecord {
        match self {
            Self::Unavailable => record,
            Self::Zero => record.zero_filled(),
        }
    }
}

// =============================================================================
// Snapshot Entries
// =============================================================================

/// A failed fetch occupying an instrument's snapshot slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    /// Instrument symbol.
    pub symbol: Symbol,
    /// Failure reason.
    pub error: String,
}

/// One snapshot slot: a quote or a failure, always carrying the symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SnapshotEntry {
    /// A successfully fetched quote.
    Quote(QuoteRecord),
    /// A failed fetch with its reason.
    Failed(FetchFailure),
}

impl SnapshotEntry {
    /// The instrument symbol this entry belongs to.
    #[must_use]
    pub fn symbol(&self) -> &str {
        match self {
            Self::Quote(record) => &record.symbol,
            Self::Failed(failure) => &failure.symbol,
        }
    }

    /// Whether this entry records a failed fetch.
    #[must_use]
    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

// =============================================================================
// Tests
// =============================================================================
