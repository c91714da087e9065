//! Instrument Universe
//!
//! The fixed, ordered list of instrument symbols the relay serves.
//! Configured once at startup and never mutated afterwards; the order is
//! used for deterministic snapshot construction.

use super::quote::Symbol;

/// Default instrument universe: the Nifty-50 constituents.
pub const NIFTY_50: &[&str] = &[
    "RELIANCE.NS",
    "INFY.NS",
    "TCS.NS",
    "HDFCBANK.NS",
    "ICICIBANK.NS",
    "KOTAKBANK.NS",
    "SBIN.NS",
    "AXISBANK.NS",
    "HINDUNILVR.NS",
    "ITC.NS",
    "LT.NS",
    "BAJFINANCE.NS",
    "ASIANPAINT.NS",
    "SUNPHARMA.NS",
    "WIPRO.NS",
    "TECHM.NS",
    "POWERGRID.NS",
    "TATAMOTORS.NS",
    "TATASTEEL.NS",
    "HCLTECH.NS",
    "ULTRACEMCO.NS",
    "NTPC.NS",
    "NESTLEIND.NS",
    "JSWSTEEL.NS",
    "BHARTIARTL.NS",
    "MARUTI.NS",
    "M&M.NS",
    "GRASIM.NS",
    "CIPLA.NS",
    "DRREDDY.NS",
    "BAJAJFINSV.NS",
    "HDFCLIFE.NS",
    "SBILIFE.NS",
    "ADANIENT.NS",
    "ADANIPORTS.NS",
    "COALINDIA.NS",
    "HINDALCO.NS",
    "HEROMOTOCO.NS",
    "EICHERMOT.NS",
    "APOLLOHOSP.NS",
    "TITAN.NS",
    "TRENT.NS",
    "BEL.NS",
    "JIOFIN.NS",
    "ONGC.NS",
    "DIVISLAB.NS",
    "INDUSINDBK.NS",
    "ADANIGREEN.NS",
    "HAVELLS.NS",
    "TATACONSUM.NS",
];

/// Errors produced when constructing a universe.
#[derive(Debug, thiserror::Error)]
pub enum UniverseError {
    /// A symbol appeared more than once.
    #[error("duplicate symbol in universe: {0}")]
    DuplicateSymbol(String),

    /// A symbol was empty after trimming.
    #[error("empty symbol in universe")]
    EmptySymbol,
}

/// The fixed, ordered instrument universe.
///
/// Symbols are unique and keep their configured order for the lifetime of
/// the process. An empty universe is valid; every cycle then produces an
/// empty snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Universe {
    symbols: Vec<Symbol>,
}

impl Universe {
    /// Create a universe from an ordered symbol list.
    ///
    /// # Errors
    ///
    /// Returns `UniverseError` if a symbol is empty or appears twice.
    pub fn new(symbols: Vec<Symbol>) -> Result<Self, UniverseError> {
        let mut seen = std::collections::HashSet::new();
        for symbol in &symbols {
            if symbol.is_empty() {
                return Err(UniverseError::EmptySymbol);
            }
            if !seen.insert(symbol.as_str()) {
                return Err(UniverseError::DuplicateSymbol(symbol.clone()));
            }
        }
        Ok(Self { symbols })
    }

    /// Parse a comma-separated symbol list, trimming whitespace.
    ///
    /// # Errors
    ///
    /// Returns `UniverseError` if a symbol appears twice.
    pub fn parse(list: &str) -> Result<Self, UniverseError> {
        let symbols = list
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        Self::new(symbols)
    }

    /// The built-in default universe (Nifty-50 constituents).
    #[must_use]
    pub fn nifty50() -> Self {
        Self {
            symbols: NIFTY_50.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Symbols in configured order.
    #[must_use]
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Number of instruments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether the universe has no instruments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}

// =============================================================================
// Tests
// =============================================================================
