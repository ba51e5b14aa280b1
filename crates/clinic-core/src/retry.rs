//! Backoff math shared by the session probe (bounded retries) and the live
//! channel (unbounded reconnects).
//!
//! - [`RetryConfig`]: retry count plus base and cap of the backoff
//! - [`calculate_backoff_delay`]: capped exponential delay in milliseconds
//! - [`backoff_duration`]: the same, as a [`Duration`]

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Default maximum retries for the session probe.
pub const DEFAULT_MAX_RETRIES: u32 = 3;
/// Default base delay in milliseconds.
pub const DEFAULT_BASE_DELAY_MS: u64 = 1000;
/// Default maximum delay in milliseconds.
pub const DEFAULT_MAX_DELAY_MS: u64 = 30_000;

/// Configuration for retry logic.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RetryConfig {
    /// Maximum number of retry attempts after the first try (default: 3).
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Base delay for exponential backoff in ms (default: 1000).
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    /// Maximum delay between retries in ms (default: 30000).
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}
fn default_base_delay_ms() -> u64 {
    DEFAULT_BASE_DELAY_MS
}
fn default_max_delay_ms() -> u64 {
    DEFAULT_MAX_DELAY_MS
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_DELAY_MS,
        }
    }
}

impl RetryConfig {
    /// Delay before retry number `attempt` (zero-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        backoff_duration(attempt, self.base_delay_ms, self.max_delay_ms)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Backoff calculation
// ─────────────────────────────────────────────────────────────────────────────

/// Calculate exponential backoff delay in milliseconds.
///
/// Formula: `min(max_delay, base_delay * 2^attempt)`
///
/// # Arguments
///
/// * `attempt`: zero-based attempt index (0 for first retry)
/// * `base_delay_ms`: base delay in milliseconds
/// * `max_delay_ms`: maximum delay cap
#[must_use]
pub fn calculate_backoff_delay(attempt: u32, base_delay_ms: u64, max_delay_ms: u64) -> u64 {
    let exponential = base_delay_ms.saturating_mul(1u64 << attempt.min(31));
    exponential.min(max_delay_ms)
}

/// [`calculate_backoff_delay`] as a [`Duration`].
#[must_use]
pub fn backoff_duration(attempt: u32, base_delay_ms: u64, max_delay_ms: u64) -> Duration {
    Duration::from_millis(calculate_backoff_delay(
        attempt,
        base_delay_ms,
        max_delay_ms,
    ))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retry_config_defaults() {
        let config = RetryConfig::default();
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.base_delay_ms, 1000);
        assert_eq!(config.max_delay_ms, 30_000);
    }

    #[test]
    fn retry_config_serde_defaults() {
        let config: RetryConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, RetryConfig::default());

        let config: RetryConfig = serde_json::from_str(r#"{"maxRetries": 1}"#).unwrap();
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.base_delay_ms, 1000);
    }

    #[test]
    fn backoff_exponential_growth() {
        assert_eq!(calculate_backoff_delay(0, 1000, 30_000), 1000);
        assert_eq!(calculate_backoff_delay(1, 1000, 30_000), 2000);
        assert_eq!(calculate_backoff_delay(2, 1000, 30_000), 4000);
        assert_eq!(calculate_backoff_delay(3, 1000, 30_000), 8000);
    }

    #[test]
    fn backoff_caps_at_max() {
        assert_eq!(calculate_backoff_delay(10, 1000, 30_000), 30_000);
    }

    #[test]
    fn backoff_high_attempt_no_overflow() {
        assert_eq!(calculate_backoff_delay(100, 1000, 30_000), 30_000);
        assert_eq!(calculate_backoff_delay(63, u64::MAX, u64::MAX), u64::MAX);
    }

    #[test]
    fn delay_for_uses_config() {
        let config = RetryConfig {
            max_retries: 3,
            base_delay_ms: 100,
            max_delay_ms: 250,
        };
        assert_eq!(config.delay_for(0), Duration::from_millis(100));
        assert_eq!(config.delay_for(1), Duration::from_millis(200));
        assert_eq!(config.delay_for(2), Duration::from_millis(250));
    }
}
