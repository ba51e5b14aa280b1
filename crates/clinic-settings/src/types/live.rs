use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Live-update channel settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LiveSettings {
    /// Whether the console connects the live channel at all.
    pub enabled: bool,
    /// Explicit WebSocket URL. When unset it is derived from `server.origin`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Only connect while a session is authenticated.
    pub require_session: bool,
    /// Reconnect timing.
    pub reconnect: ReconnectSettings,
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            url: None,
            require_session: false,
            reconnect: ReconnectSettings::default(),
        }
    }
}

/// How the reconnect delay evolves across consecutive drops.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReconnectMode {
    /// Same delay every time.
    #[default]
    Fixed,
    /// Doubling delay from `delayMs`, capped at `maxDelayMs`.
    Exponential,
}

/// Reconnect timing.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReconnectSettings {
    /// Fixed or exponential.
    pub mode: ReconnectMode,
    /// Delay before the first reconnect (and every one, in fixed mode).
    pub delay_ms: u64,
    /// Cap for exponential mode.
    pub max_delay_ms: u64,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self {
            mode: ReconnectMode::Fixed,
            delay_ms: 3000,
            max_delay_ms: 30_000,
        }
    }
}

impl ReconnectSettings {
    /// Base delay as a [`Duration`].
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Cap as a [`Duration`].
    pub fn max_delay(&self) -> Duration {
        Duration::from_millis(self.max_delay_ms)
    }
}
