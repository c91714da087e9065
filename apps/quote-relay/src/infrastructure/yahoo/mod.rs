//! Yahoo Quote Client
//!
//! HTTP adapter implementing the [`QuoteFetcher`] port against a
//! Yahoo-style quote endpoint:
//!
//! ```text
//! GET {base}/v7/finance/quote?symbols={symbol}
//! ```
//!
//! The response envelope carries a `quoteResponse.result` array of quote
//! objects with camelCase fields (`regularMarketPrice`, ...). Every field
//! is optional on the wire; absent fields stay unavailable in the domain
//! record and the missing-field policy decides their fate downstream.

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::application::ports::{FetchError, QuoteFetcher};
use crate::domain::quote::QuoteRecord;
use crate::infrastructure::config::ProviderSettings;

const USER_AGENT: &str = concat!("quote-relay/", env!("CARGO_PKG_VERSION"));

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct QuoteEnvelope {
    #[serde(rename = "quoteResponse")]
    quote_response: QuoteResponse,
}

#[derive(Debug, Deserialize)]
struct QuoteResponse {
    #[serde(default)]
    result: Vec<WireQuote>,
}

/// One quote object as the provider sends it. Unknown fields are ignored.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireQuote {
    regular_market_price: Option<f64>,
    regular_market_change: Option<f64>,
    regular_market_change_percent: Option<f64>,
    regular_market_open: Option<f64>,
    regular_market_day_high: Option<f64>,
    regular_market_day_low: Option<f64>,
    regular_market_previous_close: Option<f64>,
    regular_market_volume: Option<u64>,
    market_cap: Option<f64>,
}

impl WireQuote {
    /// Map into the domain record, keyed by the requested symbol so the
    /// entry always occupies the right universe slot.
    fn into_record(self, symbol: &str) -> QuoteRecord {
        QuoteRecord {
            symbol: symbol.to_string(),
            last_price: decimal(self.regular_market_price),
            change: decimal(self.regular_market_change),
            percent_change: decimal(self.regular_market_change_percent),
            open: decimal(self.regular_market_open),
            day_high: decimal(self.regular_market_day_high),
            day_low: decimal(self.regular_market_day_low),
            prev_close: decimal(self.regular_market_previous_close),
            volume: self.regular_market_volume,
            market_cap: decimal(self.market_cap),
        }
    }
}

fn decimal(value: Option<f64>) -> Option<Decimal> {
    value.and_then(Decimal::from_f64_retain)
}

// =============================================================================
// Client
// =============================================================================

/// HTTP client for the quote endpoint.
pub struct YahooQuoteClient {
    http: reqwest::Client,
    base_url: String,
}

impl YahooQuoteClient {
    /// Create a new client.
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Transport` if the HTTP client cannot be built.
    pub fn new(settings: ProviderSettings) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            base_url: settings.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl QuoteFetcher for YahooQuoteClient {
    async fn fetch(&self, symbol: &str) -> Result<QuoteRecord, FetchError> {
        let url = format!("{}/v7/finance/quote", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&[("symbols", symbol)])
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                status: status.as_u16(),
            });
        }

        let envelope: QuoteEnvelope = response
            .json()
            .await
            .map_err(|e| FetchError::Decode(e.to_string()))?;

        let wire = envelope
            .quote_response
            .result
            .into_iter()
            .next()
            .ok_or(FetchError::Empty)?;

        Ok(wire.into_record(symbol))
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn deserialize_full_quote() {
        let body = r#"{
            "quoteResponse": {
                "result": [{
                    "symbol": "TCS.NS",
                    "regularMarketPrice": 4120.5,
                    "regularMarketChange": -12.25,
                    "regularMarketChangePercent": -0.296,
                    "regularMarketOpen": 4131.0,
                    "regularMarketDayHigh": 4140.0,
                    "regularMarketDayLow": 4100.0,
                    "regularMarketPreviousClose": 4132.75,
                    "regularMarketVolume": 1250000,
                    "marketCap": 1490000000000,
                    "someUnknownField": true
                }],
                "error": null
            }
        }"#;

        let envelope: QuoteEnvelope = serde_json::from_str(body).unwrap();
        let record = envelope
            .quote_response
            .result
            .into_iter()
            .next()
            .unwrap()
            .into_record("TCS.NS");

        assert_eq!(record.symbol, "TCS.NS");
        assert_eq!(record.last_price, Some(Decimal::from_str("4120.5").unwrap()));
        assert_eq!(record.volume, Some(1_250_000));
        assert_eq!(
            record.prev_close,
            Some(Decimal::from_str("4132.75").unwrap())
        );
    }

    #[test]
    fn absent_fields_stay_unavailable() {
        let body = r#"{
            "quoteResponse": {
                "result": [{"symbol": "TCS.NS", "regularMarketPrice": 4120.5}]
            }
        }"#;

        let envelope: QuoteEnvelope = serde_json::from_str(body).unwrap();
        let record = envelope
            .quote_response
            .result
            .into_iter()
            .next()
            .unwrap()
            .into_record("TCS.NS");

        assert!(record.last_price.is_some());
        assert!(record.open.is_none());
        assert!(record.volume.is_none());
        assert!(record.market_cap.is_none());
    }

    #[test]
    fn empty_result_array_deserializes() {
        let body = r#"{"quoteResponse": {"result": []}}"#;
        let envelope: QuoteEnvelope = serde_json::from_str(body).unwrap();
        assert!(envelope.quote_response.result.is_empty());
    }

    #[test]
    fn record_uses_requested_symbol() {
        // The universe slot is keyed by the requested symbol even if the
        // provider echoes a normalized variant.
        let body = r#"{"quoteResponse": {"result": [{"symbol": "TCS.BO"}]}}"#;
        let envelope: QuoteEnvelope = serde_json::from_str(body).unwrap();
        let record = envelope
            .quote_response
            .result
            .into_iter()
            .next()
            .unwrap()
            .into_record("TCS.NS");
        assert_eq!(record.symbol, "TCS.NS");
    }
}
