use std::time::Duration;

use clinic_core::RetryConfig;
use serde::{Deserialize, Serialize};

/// Backend connection settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Page origin of the dashboard backend (scheme, host, port).
    pub origin: String,
    /// Per-request timeout for HTTP calls in milliseconds.
    pub request_timeout_ms: u64,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            origin: "http://localhost:5000".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

impl ServerSettings {
    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

/// Session probe and freshness settings.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SessionSettings {
    /// How long a probed session is served from cache without a new probe.
    pub freshness_ms: u64,
    /// Retry policy for the session probe. Rejections are never retried.
    pub probe_retry: RetryConfig,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            freshness_ms: 5 * 60 * 1000,
            probe_retry: RetryConfig::default(),
        }
    }
}

impl SessionSettings {
    /// Freshness window as a [`Duration`].
    pub fn freshness(&self) -> Duration {
        Duration::from_millis(self.freshness_ms)
    }
}

/// Collection cache settings.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CacheSettings {
    /// Age after which a collection slot is re-fetched on read. `None` means
    /// collections only go stale through an explicit staleness mark.
    pub collection_stale_ms: Option<u64>,
}

impl CacheSettings {
    /// Collection staleness window as a [`Duration`].
    pub fn collection_stale_after(&self) -> Option<Duration> {
        self.collection_stale_ms.map(Duration::from_millis)
    }
}
