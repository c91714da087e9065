//! Configuration
//!
//! Relay configuration types, loaded from environment variables.

mod settings;

pub use settings::{
    BroadcastSettings, ConfigError, ProviderSettings, RelayConfig, ServerSettings,
};
