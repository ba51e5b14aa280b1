//! Reconnect delay policy.

use std::time::Duration;

use clinic_core::retry::backoff_duration;
use clinic_settings::{ReconnectMode, ReconnectSettings};

/// Delay before the first reconnect by default.
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// How long to wait before reconnecting after a drop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReconnectPolicy {
    /// The same delay after every drop.
    Fixed {
        /// Delay.
        delay: Duration,
    },
    /// `base * 2^n` after the n-th consecutive drop, capped at `max`.
    Exponential {
        /// First delay.
        base: Duration,
        /// Cap.
        max: Duration,
    },
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::Fixed {
            delay: DEFAULT_RECONNECT_DELAY,
        }
    }
}

impl ReconnectPolicy {
    /// Delay before the reconnect following `consecutive_drops` earlier
    /// drops without a successful open in between (zero-based).
    pub fn delay(&self, consecutive_drops: u32) -> Duration {
        match *self {
            Self::Fixed { delay } => delay,
            Self::Exponential { base, max } => backoff_duration(
                consecutive_drops,
                u64::try_from(base.as_millis()).unwrap_or(u64::MAX),
                u64::try_from(max.as_millis()).unwrap_or(u64::MAX),
            ),
        }
    }
}

impl From<&ReconnectSettings> for ReconnectPolicy {
    fn from(settings: &ReconnectSettings) -> Self {
        match settings.mode {
            ReconnectMode::Fixed => Self::Fixed {
                delay: settings.delay(),
            },
            ReconnectMode::Exponential => Self::Exponential {
                base: settings.delay(),
                max: settings.max_delay(),
            },
        }
    }
}
