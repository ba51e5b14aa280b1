//! Settings type definitions.
//!
//! All types use `#[serde(rename_all = "camelCase")]`. Each type implements
//! [`Default`] with production values, and `#[serde(default)]` lets a partial
//! JSON file fill in only what it overrides.

mod live;
mod server;

pub use live::*;
pub use server::*;

use serde::{Deserialize, Serialize};

use crate::errors::{Result, SettingsError};

/// Root settings type for the clinic client.
///
/// # JSON Format
///
/// ```json
/// {
///   "server": { "origin": "https://clinic.example.com" },
///   "live": { "reconnect": { "mode": "exponential" } }
/// }
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ClinicSettings {
    /// Settings schema version.
    pub version: String,
    /// Application name.
    pub name: String,
    /// Backend connection settings.
    pub server: ServerSettings,
    /// Session probe and freshness settings.
    pub session: SessionSettings,
    /// Live-update channel settings.
    pub live: LiveSettings,
    /// Collection cache settings.
    pub cache: CacheSettings,
    /// Logging configuration.
    pub logging: LoggingSettings,
}

impl Default for ClinicSettings {
    fn default() -> Self {
        Self {
            version: "0.1.0".to_string(),
            name: "clinic".to_string(),
            server: ServerSettings::default(),
            session: SessionSettings::default(),
            live: LiveSettings::default(),
            cache: CacheSettings::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl ClinicSettings {
    /// Check cross-field constraints the type system does not capture.
    pub fn validate(&self) -> Result<()> {
        let origin = self.server.origin.as_str();
        if !(origin.starts_with("http://") || origin.starts_with("https://")) {
            return Err(SettingsError::InvalidValue(format!(
                "server.origin must start with http:// or https://, got {origin}"
            )));
        }
        if let Some(url) = &self.live.url {
            if !(url.starts_with("ws://") || url.starts_with("wss://")) {
                return Err(SettingsError::InvalidValue(format!(
                    "live.url must start with ws:// or wss://, got {url}"
                )));
            }
        }
        if self.live.reconnect.delay_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "live.reconnect.delayMs must be greater than zero".to_string(),
            ));
        }
        if self.live.reconnect.max_delay_ms < self.live.reconnect.delay_ms {
            return Err(SettingsError::InvalidValue(
                "live.reconnect.maxDelayMs must not be below delayMs".to_string(),
            ));
        }
        Ok(())
    }
}

/// Logging configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingSettings {
    /// Default filter directive (overridden by `RUST_LOG`).
    pub level: String,
    /// `compact` or `json`.
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}
