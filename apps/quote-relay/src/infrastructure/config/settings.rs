//! Relay Configuration Settings
//!
//! Configuration types for the quote relay, loaded from environment
//! variables. Every knob has a typed default; only a malformed universe
//! is a startup error.
//!
//! # Environment Variables
//!
//! - `QUOTE_SYMBOLS`: comma-separated universe (default: Nifty-50 list)
//! - `QUOTE_REFRESH_SECS`: update cycle period (default: 30)
//! - `QUOTE_FETCH_TIMEOUT_SECS`: per-fetch bound, 0 disables (default: 10)
//! - `QUOTE_BROADCAST_MODE`: "on-change" | "always" (default: on-change)
//! - `QUOTE_MISSING_FIELDS`: "unavailable" | "zero" (default: unavailable)
//! - `QUOTE_WS_PORT`: WebSocket server port (default: 3000)
//! - `QUOTE_HEALTH_PORT`: health check HTTP port (default: 8082)
//! - `QUOTE_SNAPSHOT_CAPACITY`: broadcast channel capacity (default: 64)
//! - `QUOTE_PROVIDER_URL`: provider base URL (default: Yahoo query host)

use std::time::Duration;

use crate::domain::quote::MissingFieldPolicy;
use crate::domain::snapshot::BroadcastPolicy;
use crate::domain::universe::{Universe, UniverseError};

/// Server port settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// WebSocket server port.
    pub ws_port: u16,
    /// Health check HTTP port.
    pub health_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            ws_port: 3000,
            health_port: 8082,
        }
    }
}

/// Broadcast channel settings.
#[derive(Debug, Clone)]
pub struct BroadcastSettings {
    /// Capacity of the snapshot broadcast channel.
    pub snapshot_capacity: usize,
}

impl Default for BroadcastSettings {
    fn default() -> Self {
        Self {
            snapshot_capacity: 64,
        }
    }
}

/// Quote provider settings.
#[derive(Debug, Clone)]
pub struct ProviderSettings {
    /// Base URL of the quote endpoint.
    pub base_url: String,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            base_url: "https://query1.finance.yahoo.com".to_string(),
        }
    }
}

/// Complete relay configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// The instrument universe.
    pub universe: Universe,
    /// Update cycle period.
    pub refresh_interval: Duration,
    /// Per-fetch bound; `None` means unbounded.
    pub fetch_timeout: Option<Duration>,
    /// Broadcast-on-change vs always-broadcast.
    pub broadcast_policy: BroadcastPolicy,
    /// Unavailable-field handling.
    pub missing_fields: MissingFieldPolicy,
    /// Server port settings.
    pub server: ServerSettings,
    /// Broadcast channel settings.
    pub broadcast: BroadcastSettings,
    /// Quote provider settings.
    pub provider: ProviderSettings,
}

impl RelayConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if `QUOTE_SYMBOLS` is set but empty or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let universe = match std::env::var("QUOTE_SYMBOLS") {
            Ok(list) => {
                if list.trim().is_empty() {
                    return Err(ConfigError::EmptyValue("QUOTE_SYMBOLS".to_string()));
                }
                Universe::parse(&list)?
            }
            Err(_) => Universe::nifty50(),
        };

        let refresh_secs = parse_env_u64("QUOTE_REFRESH_SECS", 30).max(1);

        let fetch_timeout = match parse_env_u64("QUOTE_FETCH_TIMEOUT_SECS", 10) {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        };

        let broadcast_policy = std::env::var("QUOTE_BROADCAST_MODE")
            .map(|s| BroadcastPolicy::from_str_case_insensitive(&s))
            .unwrap_or_default();

        let missing_fields = std::env::var("QUOTE_MISSING_FIELDS")
            .map(|s| MissingFieldPolicy::from_str_case_insensitive(&s))
            .unwrap_or_default();

        let server = ServerSettings {
            ws_port: parse_env_u16("QUOTE_WS_PORT", ServerSettings::default().ws_port),
            health_port: parse_env_u16("QUOTE_HEALTH_PORT", ServerSettings::default().health_port),
        };

        let broadcast = BroadcastSettings {
            snapshot_capacity: parse_env_usize(
                "QUOTE_SNAPSHOT_CAPACITY",
                BroadcastSettings::default().snapshot_capacity,
            ),
        };

        let provider = ProviderSettings {
            base_url: std::env::var("QUOTE_PROVIDER_URL")
                .unwrap_or_else(|_| ProviderSettings::default().base_url),
        };

        Ok(Self {
            universe,
            refresh_interval: Duration::from_secs(refresh_secs),
            fetch_timeout,
            broadcast_policy,
            missing_fields,
            server,
            broadcast,
            provider,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),

    /// The configured universe is invalid.
    #[error("invalid universe: {0}")]
    InvalidUniverse(#[from] UniverseError),
}

fn parse_env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
