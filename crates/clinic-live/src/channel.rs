//! The live-update channel.
//!
//! One background task owns the connection. It connects, sends a single
//! `REQUEST_INITIAL_DATA`, applies every inbound frame to the cache in
//! receipt order, and after any close waits out the reconnect delay before
//! trying again. [`LiveUpdateChannel::shutdown`] cancels the task wherever it
//! is: connecting, reading, or waiting to reconnect.

use std::sync::Arc;

use clinic_cache::{QueryCache, QueryKey};
use clinic_settings::ClinicSettings;
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;

use crate::endpoint::live_url_from_origin;
use crate::errors::Result;
use crate::handler::apply_message;
use crate::protocol::ClientMessage;
use crate::reconnect::ReconnectPolicy;
use crate::transport::{Connector, LiveConnection, WsConnector};

/// Where the connection is in its cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionPhase {
    /// Handshake in progress.
    Connecting,
    /// Connected and reading.
    Open,
    /// Not connected: before the first connect, between attempts, or after
    /// shutdown.
    #[default]
    Closed,
}

/// Observable connection state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStatus {
    /// Current phase.
    pub phase: ConnectionPhase,
    /// Drops since the last successful open.
    pub reconnect_attempts: u32,
}

/// Channel configuration.
#[derive(Clone, Debug)]
pub struct LiveConfig {
    /// WebSocket endpoint.
    pub url: Url,
    /// Delay between a drop and the next attempt.
    pub policy: ReconnectPolicy,
    /// Connect only while a user is signed in.
    pub require_session: bool,
}

impl LiveConfig {
    /// Default policy, no session gate.
    pub fn new(url: Url) -> Self {
        Self {
            url,
            policy: ReconnectPolicy::default(),
            require_session: false,
        }
    }

    /// Build from loaded settings. An explicit `live.url` wins over the URL
    /// derived from `server.origin`.
    pub fn from_settings(settings: &ClinicSettings) -> Result<Self> {
        let url = match &settings.live.url {
            Some(url) => Url::parse(url)?,
            None => live_url_from_origin(&settings.server.origin)?,
        };
        Ok(Self {
            url,
            policy: ReconnectPolicy::from(&settings.live.reconnect),
            require_session: settings.live.require_session,
        })
    }
}

/// Persistent push connection that keeps the cache's collections fresh.
pub struct LiveUpdateChannel {
    config: Arc<LiveConfig>,
    cache: Arc<QueryCache>,
    connector: Arc<dyn Connector>,
    cancel: CancellationToken,
    status: Arc<watch::Sender<ConnectionStatus>>,
    task: parking_lot::Mutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for LiveUpdateChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveUpdateChannel")
            .field("url", &self.config.url.as_str())
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

impl LiveUpdateChannel {
    /// Channel over real WebSockets.
    pub fn new(config: LiveConfig, cache: Arc<QueryCache>) -> Self {
        Self::with_connector(config, cache, Arc::new(WsConnector))
    }

    /// Channel over a custom transport.
    pub fn with_connector(
        config: LiveConfig,
        cache: Arc<QueryCache>,
        connector: Arc<dyn Connector>,
    ) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::default());
        Self {
            config: Arc::new(config),
            cache,
            connector,
            cancel: CancellationToken::new(),
            status: Arc::new(status),
            task: parking_lot::Mutex::new(None),
        }
    }

    /// Start the connection task. Does nothing if it is already running or
    /// the channel has been shut down.
    pub fn connect(&self) {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|handle| !handle.is_finished()) {
            debug!("live channel already running");
            return;
        }
        if self.cancel.is_cancelled() {
            warn!("live channel was shut down; ignoring connect");
            return;
        }

        let worker = Worker {
            config: Arc::clone(&self.config),
            cache: Arc::clone(&self.cache),
            connector: Arc::clone(&self.connector),
            cancel: self.cancel.clone(),
            status: Arc::clone(&self.status),
        };
        info!(url = %self.config.url, "starting live channel");
        *task = Some(tokio::spawn(worker.run()));
    }

    /// Close the connection and cancel any pending reconnect. Waits for the
    /// task to finish. The channel cannot be restarted afterwards.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "live channel task ended abnormally");
            }
        }
        self.status.send_modify(|s| s.phase = ConnectionPhase::Closed);
        info!("live channel shut down");
    }

    /// Current connection status.
    pub fn status(&self) -> ConnectionStatus {
        *self.status.borrow()
    }

    /// Subscribe to status changes.
    pub fn subscribe_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.status.subscribe()
    }

    /// The endpoint this channel connects to.
    pub fn url(&self) -> &Url {
        &self.config.url
    }
}

impl Drop for LiveUpdateChannel {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

enum PumpEnd {
    Closed,
    SessionEnded,
    Cancelled,
}

struct Worker {
    config: Arc<LiveConfig>,
    cache: Arc<QueryCache>,
    connector: Arc<dyn Connector>,
    cancel: CancellationToken,
    status: Arc<watch::Sender<ConnectionStatus>>,
}

impl Worker {
    async fn run(self) {
        let mut drops: u32 = 0;
        loop {
            if self.config.require_session && !self.wait_for_session().await {
                break;
            }

            self.set_status(ConnectionPhase::Connecting, drops);
            let connected = tokio::select! {
                () = self.cancel.cancelled() => break,
                result = self.connector.connect(&self.config.url) => result,
            };

            match connected {
                Ok(mut conn) => {
                    info!(url = %self.config.url, "live channel open");
                    drops = 0;
                    self.set_status(ConnectionPhase::Open, drops);
                    let end = self.pump(conn.as_mut()).await;
                    match end {
                        PumpEnd::Cancelled => {
                            conn.close().await;
                            break;
                        }
                        PumpEnd::SessionEnded => conn.close().await,
                        PumpEnd::Closed => {}
                    }
                }
                Err(e) => warn!(url = %self.config.url, error = %e, "live channel connect failed"),
            }

            let delay = self.config.policy.delay(drops);
            drops = drops.saturating_add(1);
            self.set_status(ConnectionPhase::Closed, drops);
            info!(
                delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                attempt = drops,
                "live channel reconnect scheduled"
            );
            tokio::select! {
                () = self.cancel.cancelled() => break,
                () = tokio::time::sleep(delay) => {}
            }
        }
        self.set_status(ConnectionPhase::Closed, drops);
        debug!("live channel task exiting");
    }

    async fn pump(&self, conn: &mut dyn LiveConnection) -> PumpEnd {
        let request = match ClientMessage::RequestInitialData.to_text() {
            Ok(text) => text,
            Err(e) => {
                warn!(error = %e, "failed to encode initial data request");
                return PumpEnd::Closed;
            }
        };
        if let Err(e) = conn.send_text(request).await {
            warn!(error = %e, "failed to request initial data");
            return PumpEnd::Closed;
        }

        let mut session = self.cache.subscribe(QueryKey::CurrentUser);
        loop {
            tokio::select! {
                () = self.cancel.cancelled() => return PumpEnd::Cancelled,
                changed = session.changed(), if self.config.require_session => {
                    if changed.is_err() || !self.has_session() {
                        info!("session ended; closing live channel");
                        return PumpEnd::SessionEnded;
                    }
                }
                frame = conn.next_text() => match frame {
                    Ok(Some(text)) => {
                        let _ = apply_message(&self.cache, &text);
                    }
                    Ok(None) => {
                        info!("live channel closed by server");
                        return PumpEnd::Closed;
                    }
                    Err(e) => {
                        warn!(error = %e, "live channel read failed");
                        return PumpEnd::Closed;
                    }
                },
            }
        }
    }

    /// Wait until a user is signed in. `false` if cancelled first.
    async fn wait_for_session(&self) -> bool {
        let mut session = self.cache.subscribe(QueryKey::CurrentUser);
        let mut logged = false;
        loop {
            if self.has_session() {
                return true;
            }
            if !logged {
                info!("live channel waiting for a signed-in session");
                logged = true;
            }
            tokio::select! {
                () = self.cancel.cancelled() => return false,
                changed = session.changed() => {
                    if changed.is_err() {
                        return false;
                    }
                }
            }
        }
    }

    fn has_session(&self) -> bool {
        matches!(self.cache.current_user().get().as_deref(), Some(Some(_)))
    }

    fn set_status(&self, phase: ConnectionPhase, reconnect_attempts: u32) {
        let _ = self.status.send_replace(ConnectionStatus {
            phase,
            reconnect_attempts,
        });
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
