//! Wiring of the client crates around one shared cache.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clinic_api::{ApiClient, ChatSession, CollectionFetcher};
use clinic_auth::{HttpAuthBackend, SessionManager};
use clinic_cache::QueryCache;
use clinic_core::TracingNotifier;
use clinic_live::{LiveConfig, LiveUpdateChannel};
use clinic_settings::{ClinicSettings, SettingsError};

/// Load settings from `path` (or the default location), falling back to
/// defaults when the file is unreadable or invalid. The load error, if any,
/// is returned alongside so it can be logged once logging is up.
pub fn load_config(path: Option<&Path>) -> (ClinicSettings, Option<SettingsError>) {
    let loaded = match path {
        Some(path) => clinic_settings::load_settings_from_path(path),
        None => clinic_settings::load_settings(),
    };
    match loaded {
        Ok(settings) => (settings, None),
        Err(e) => (ClinicSettings::default(), Some(e)),
    }
}

/// The wired client.
pub struct App {
    /// Effective settings.
    pub settings: ClinicSettings,
    /// Shared cache.
    pub cache: Arc<QueryCache>,
    /// HTTP client (one cookie store for every component).
    pub api: ApiClient,
    /// Session lifecycle.
    pub session: SessionManager,
}

impl App {
    /// Build every component from settings. No I/O happens here.
    pub fn new(settings: ClinicSettings) -> Result<Self> {
        let cache = Arc::new(QueryCache::new(
            settings.session.freshness(),
            settings.cache.collection_stale_after(),
        ));
        let api = ApiClient::new(&settings.server.origin, settings.server.request_timeout())
            .with_context(|| format!("Invalid server origin: {}", settings.server.origin))?;
        let session = SessionManager::new(
            Arc::new(HttpAuthBackend::new(api.clone())),
            Arc::clone(&cache),
            Arc::new(TracingNotifier),
            settings.session.probe_retry.clone(),
        );
        Ok(Self {
            settings,
            cache,
            api,
            session,
        })
    }

    /// Cache-backed collection reads.
    pub fn collections(&self) -> CollectionFetcher {
        CollectionFetcher::new(self.api.clone(), Arc::clone(&self.cache))
    }

    /// Live channel writing into the shared cache. Not yet connected.
    pub fn live_channel(&self) -> Result<LiveUpdateChannel> {
        let config =
            LiveConfig::from_settings(&self.settings).context("Invalid live channel settings")?;
        Ok(LiveUpdateChannel::new(config, Arc::clone(&self.cache)))
    }

    /// A fresh chat conversation.
    pub fn chat(&self) -> ChatSession {
        ChatSession::new(self.api.clone())
    }
}
