//! Session lifecycle.
//!
//! [`SessionManager`] is the only writer of the cache's current-user slot.
//! Reads are served from the slot while it is fresh; an empty slot is filled
//! by an awaited probe; a slot past its freshness window is served as-is
//! while a background probe refreshes it.
//!
//! Login and logout each allow one call in flight. A second call while the
//! first is pending fails with [`AuthError::OperationInProgress`] without
//! touching the backend or the cache.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clinic_cache::QueryCache;
use clinic_core::{Notifier, RetryConfig, SessionState, Toast, User};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

use crate::backend::AuthBackend;
use crate::errors::{AuthError, Result};
use crate::forms::{FindIdForm, LoginRequest, RegisterForm};

const LOGIN_FAILED: &str = "Login failed";
const LOGOUT_FAILED: &str = "Logout failed";
const REGISTER_FAILED: &str = "Registration failed";
const FIND_ID_FAILED: &str = "Account lookup failed";

struct Inner {
    backend: Arc<dyn AuthBackend>,
    cache: Arc<QueryCache>,
    notifier: Arc<dyn Notifier>,
    probe_retry: RetryConfig,
    login_slot: Mutex<()>,
    logout_slot: Mutex<()>,
    refreshing: AtomicBool,
}

/// Owns the authenticated-user state.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("state", &self.state())
            .field("probe_retry", &self.inner.probe_retry)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    /// Create a manager writing to `cache`'s current-user slot.
    pub fn new(
        backend: Arc<dyn AuthBackend>,
        cache: Arc<QueryCache>,
        notifier: Arc<dyn Notifier>,
        probe_retry: RetryConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                backend,
                cache,
                notifier,
                probe_retry,
                login_slot: Mutex::new(()),
                logout_slot: Mutex::new(()),
                refreshing: AtomicBool::new(false),
            }),
        }
    }

    /// The shared cache this manager writes to.
    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.inner.cache
    }

    /// Current session.
    ///
    /// - fresh slot: cached value, no network
    /// - empty slot: awaited probe (with retries)
    /// - stale slot: cached value, plus a background probe
    pub async fn current_session(&self) -> Result<Option<User>> {
        let slot = self.inner.cache.current_user();
        match slot.get() {
            Some(user) if !slot.is_stale() => Ok((*user).clone()),
            Some(user) => {
                self.spawn_refresh();
                Ok((*user).clone())
            }
            None => {
                let user = slot.get_or_fetch(|| self.probe()).await?;
                Ok((*user).clone())
            }
        }
    }

    /// Probe the backend now and replace the cached session with the result.
    /// A login or logout that completes while the probe is out wins.
    pub async fn refresh_session(&self) -> Result<Option<User>> {
        let user = self
            .inner
            .cache
            .current_user()
            .refetch(|| self.probe())
            .await?;
        Ok((*user).clone())
    }

    /// Session state from the cache, without I/O. An unprobed session reads
    /// as anonymous.
    pub fn state(&self) -> SessionState {
        let user = self
            .inner
            .cache
            .current_user()
            .get()
            .and_then(|user| (*user).clone());
        SessionState::from_user(user)
    }

    /// Subscribe to current-user changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.cache.current_user().subscribe()
    }

    /// Sign in.
    #[tracing::instrument(skip_all, fields(username = %username))]
    pub async fn login(&self, username: &str, password: &str, remember: bool) -> Result<User> {
        let Ok(_guard) = self.inner.login_slot.try_lock() else {
            debug!("login already in flight");
            return Err(AuthError::OperationInProgress("login"));
        };

        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
            remember,
        };
        match self.inner.backend.login(&request).await {
            Ok(user) => {
                info!(user_id = user.id, role = %user.role, "login succeeded");
                self.inner.cache.current_user().set(Some(user.clone()));
                self.notify(Toast::success(
                    "Login successful",
                    format!("Welcome, {}!", user.name),
                ));
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, kind = e.error_kind(), "login failed");
                self.notify(Toast::failure(LOGIN_FAILED, e.user_message(LOGIN_FAILED)));
                Err(e)
            }
        }
    }

    /// Sign out.
    #[tracing::instrument(skip_all)]
    pub async fn logout(&self) -> Result<()> {
        let Ok(_guard) = self.inner.logout_slot.try_lock() else {
            debug!("logout already in flight");
            return Err(AuthError::OperationInProgress("logout"));
        };

        match self.inner.backend.logout().await {
            Ok(()) => {
                info!("logout succeeded");
                self.inner.cache.current_user().set(None);
                self.notify(Toast::success("Logged out", "You have been safely logged out."));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, kind = e.error_kind(), "logout failed");
                self.notify(Toast::failure(LOGOUT_FAILED, e.user_message(LOGOUT_FAILED)));
                Err(e)
            }
        }
    }

    /// Create an account. Does not sign in.
    #[tracing::instrument(skip_all, fields(username = %form.username))]
    pub async fn register(&self, form: &RegisterForm) -> Result<()> {
        form.validate()?;
        match self.inner.backend.register(form).await {
            Ok(()) => {
                info!("registration succeeded");
                self.notify(Toast::success(
                    "Registration complete",
                    "You can now sign in.",
                ));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, kind = e.error_kind(), "registration failed");
                self.notify(Toast::failure(REGISTER_FAILED, e.user_message(REGISTER_FAILED)));
                Err(e)
            }
        }
    }

    /// Request the user ID be sent to the registered email.
    #[tracing::instrument(skip_all)]
    pub async fn find_id(&self, form: &FindIdForm) -> Result<()> {
        form.validate()?;
        match self.inner.backend.find_id(form).await {
            Ok(()) => {
                info!("find-id request accepted");
                self.notify(Toast::success(
                    "Account found",
                    "Your user ID has been sent to your registered email.",
                ));
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, kind = e.error_kind(), "find-id failed");
                self.notify(Toast::failure(FIND_ID_FAILED, e.user_message(FIND_ID_FAILED)));
                Err(e)
            }
        }
    }

    /// Probe with bounded exponential backoff. A rejection is `Ok(None)` from
    /// the backend and never reaches the retry path.
    async fn probe(&self) -> Result<Option<User>> {
        let retry = &self.inner.probe_retry;
        let mut attempt = 0;
        loop {
            match self.inner.backend.fetch_user().await {
                Ok(user) => {
                    debug!(authenticated = user.is_some(), "session probe completed");
                    return Ok(user);
                }
                Err(e) if attempt < retry.max_retries && e.is_retryable() => {
                    let delay = retry.delay_for(attempt);
                    attempt += 1;
                    warn!(
                        attempt,
                        max_retries = retry.max_retries,
                        delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                        error = %e,
                        "session probe failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    warn!(attempt, error = %e, kind = e.error_kind(), "session probe failed");
                    return Err(e);
                }
            }
        }
    }

    fn spawn_refresh(&self) {
        if self.inner.refreshing.swap(true, Ordering::AcqRel) {
            return;
        }
        let this = self.clone();
        drop(tokio::spawn(async move {
            let result = this
                .inner
                .cache
                .current_user()
                .get_or_fetch(|| this.probe())
                .await;
            if let Err(e) = result {
                warn!(error = %e, "background session refresh failed; keeping cached session");
            }
            this.inner.refreshing.store(false, Ordering::Release);
        }));
    }

    fn notify(&self, toast: Toast) {
        self.inner.notifier.notify(toast);
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use clinic_core::{ChannelNotifier, Role};
    use parking_lot::Mutex as SyncMutex;
    use tokio::sync::{Notify, mpsc};

    use super::*;

    fn doc1() -> User {
        User {
            id: 1,
            username: "doc1".into(),
            name: "Dr. Lee".into(),
            role: Role::Doctor,
        }
    }

    fn server_error() -> AuthError {
        AuthError::Rejected {
            status: 503,
            message: None,
        }
    }

    /// Backend scripted per call. Unscripted probes answer `Ok(None)`.
    #[derive(Default)]
    struct ScriptedBackend {
        probes: SyncMutex<VecDeque<Result<Option<User>>>>,
        logins: SyncMutex<VecDeque<Result<User>>>,
        logouts: SyncMutex<VecDeque<Result<()>>>,
        probe_calls: AtomicUsize,
        login_calls: AtomicUsize,
        register_calls: AtomicUsize,
        login_gate: Option<Arc<Notify>>,
        probe_gate: Option<Arc<Notify>>,
    }

    impl ScriptedBackend {
        fn probe_calls(&self) -> usize {
            self.probe_calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl AuthBackend for ScriptedBackend {
        async fn fetch_user(&self) -> Result<Option<User>> {
            let _ = self.probe_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.probe_gate {
                gate.notified().await;
            }
            self.probes.lock().pop_front().unwrap_or(Ok(None))
        }

        async fn login(&self, _request: &LoginRequest) -> Result<User> {
            let _ = self.login_calls.fetch_add(1, Ordering::SeqCst);
            if let Some(gate) = &self.login_gate {
                gate.notified().await;
            }
            self.logins.lock().pop_front().unwrap_or_else(|| Ok(doc1()))
        }

        async fn logout(&self) -> Result<()> {
            self.logouts.lock().pop_front().unwrap_or(Ok(()))
        }

        async fn register(&self, _form: &RegisterForm) -> Result<()> {
            let _ = self.register_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn find_id(&self, _form: &FindIdForm) -> Result<()> {
            Err(AuthError::Rejected {
                status: 404,
                message: Some("no matching account".into()),
            })
        }
    }

    fn manager(
        backend: Arc<ScriptedBackend>,
    ) -> (SessionManager, mpsc::UnboundedReceiver<Toast>) {
        let (notifier, rx) = ChannelNotifier::new();
        let manager = SessionManager::new(
            backend,
            Arc::new(QueryCache::new(Duration::from_secs(300), None)),
            Arc::new(notifier),
            RetryConfig::default(),
        );
        (manager, rx)
    }

    #[tokio::test]
    async fn empty_slot_probes_once() {
        let backend = Arc::new(ScriptedBackend::default());
        backend.probes.lock().push_back(Ok(Some(doc1())));
        let (m, _rx) = manager(Arc::clone(&backend));

        assert_eq!(m.current_session().await.unwrap(), Some(doc1()));
        assert_eq!(m.current_session().await.unwrap(), Some(doc1()));
        assert_eq!(backend.probe_calls(), 1);
        assert!(m.state().is_authenticated());
    }

    #[tokio::test]
    async fn rejected_probe_is_silent_anonymous() {
        let backend = Arc::new(ScriptedBackend::default());
        let (m, mut rx) = manager(Arc::clone(&backend));

        assert_eq!(m.current_session().await.unwrap(), None);
        assert_eq!(m.state(), SessionState::Anonymous);
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn login_caches_user_and_skips_probe() {
        let backend = Arc::new(ScriptedBackend::default());
        let (m, mut rx) = manager(Arc::clone(&backend));

        let user = m.login("doc1", "validpass", false).await.unwrap();
        assert_eq!(user, doc1());
        assert_eq!(m.current_session().await.unwrap(), Some(doc1()));
        assert_eq!(backend.probe_calls(), 0);

        let toast = rx.try_recv().unwrap();
        assert!(!toast.is_failure());
        assert!(toast.description.contains("Dr. Lee"));
    }

    #[tokio::test]
    async fn last_successful_login_wins() {
        let backend = Arc::new(ScriptedBackend::default());
        let nurse = User {
            id: 2,
            username: "nurse2".into(),
            name: "Park".into(),
            role: Role::Nurse,
        };
        {
            let mut logins = backend.logins.lock();
            logins.push_back(Ok(doc1()));
            logins.push_back(Ok(nurse.clone()));
        }
        let (m, _rx) = manager(Arc::clone(&backend));

        let _ = m.login("doc1", "validpass", false).await.unwrap();
        let _ = m.login("nurse2", "validpass", false).await.unwrap();
        assert_eq!(m.current_session().await.unwrap(), Some(nurse));
    }

    #[tokio::test]
    async fn failed_login_keeps_session_and_notifies() {
        let backend = Arc::new(ScriptedBackend::default());
        backend.logins.lock().push_back(Ok(doc1()));
        backend.logins.lock().push_back(Err(AuthError::Rejected {
            status: 401,
            message: Some("invalid credentials".into()),
        }));
        let (m, mut rx) = manager(Arc::clone(&backend));
        let _ = m.login("doc1", "validpass", false).await.unwrap();
        let _ = rx.try_recv().unwrap();

        let err = m.login("doc1", "wrong", false).await.unwrap_err();
        assert_eq!(err.to_string(), "invalid credentials");
        assert_eq!(m.state().user(), Some(&doc1()));

        let toast = rx.try_recv().unwrap();
        assert!(toast.is_failure());
        assert_eq!(toast.description, "invalid credentials");
    }

    #[tokio::test]
    async fn concurrent_login_fails_fast() {
        let gate = Arc::new(Notify::new());
        let backend = Arc::new(ScriptedBackend {
            login_gate: Some(Arc::clone(&gate)),
            ..ScriptedBackend::default()
        });
        let (m, mut rx) = manager(Arc::clone(&backend));

        let first = tokio::spawn({
            let m = m.clone();
            async move { m.login("doc1", "validpass", false).await }
        });
        while backend.login_calls.load(Ordering::SeqCst) == 0 {
            tokio::task::yield_now().await;
        }

        let second = m.login("doc1", "validpass", false).await;
        assert_matches!(second, Err(AuthError::OperationInProgress("login")));
        assert_eq!(backend.login_calls.load(Ordering::SeqCst), 1);
        assert!(rx.try_recv().is_err());

        gate.notify_one();
        assert_eq!(first.await.unwrap().unwrap(), doc1());
    }

    #[tokio::test]
    async fn logout_clears_session_without_probe() {
        let backend = Arc::new(ScriptedBackend::default());
        let (m, mut rx) = manager(Arc::clone(&backend));
        let _ = m.login("doc1", "validpass", false).await.unwrap();
        let _ = rx.try_recv().unwrap();

        m.logout().await.unwrap();
        assert_eq!(m.current_session().await.unwrap(), None);
        assert_eq!(backend.probe_calls(), 0);
        assert!(!rx.try_recv().unwrap().is_failure());
    }

    #[tokio::test]
    async fn failed_logout_keeps_session() {
        let backend = Arc::new(ScriptedBackend::default());
        backend
            .logouts
            .lock()
            .push_back(Err(AuthError::Unreachable("connection refused".into())));
        let (m, mut rx) = manager(Arc::clone(&backend));
        let _ = m.login("doc1", "validpass", false).await.unwrap();
        let _ = rx.try_recv().unwrap();

        assert!(m.logout().await.is_err());
        assert!(m.state().is_authenticated());
        let toast = rx.try_recv().unwrap();
        assert!(toast.is_failure());
        assert_eq!(toast.description, crate::errors::UNREACHABLE_MESSAGE);
    }

    #[tokio::test(start_paused = true)]
    async fn probe_retries_with_backoff() {
        let backend = Arc::new(ScriptedBackend::default());
        {
            let mut probes = backend.probes.lock();
            probes.push_back(Err(server_error()));
            probes.push_back(Err(server_error()));
            probes.push_back(Ok(Some(doc1())));
        }
        let (m, _rx) = manager(Arc::clone(&backend));

        let start = tokio::time::Instant::now();
        assert_eq!(m.current_session().await.unwrap(), Some(doc1()));
        assert_eq!(backend.probe_calls(), 3);
        // 1s + 2s of backoff.
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test(start_paused = true)]
    async fn probe_gives_up_after_three_retries() {
        let backend = Arc::new(ScriptedBackend::default());
        {
            let mut probes = backend.probes.lock();
            for _ in 0..5 {
                probes.push_back(Err(server_error()));
            }
        }
        let (m, _rx) = manager(Arc::clone(&backend));

        assert!(m.current_session().await.is_err());
        assert_eq!(backend.probe_calls(), 4);
        assert!(m.cache().current_user().get().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_session_served_while_refreshing() {
        let backend = Arc::new(ScriptedBackend::default());
        backend.probes.lock().push_back(Ok(Some(doc1())));
        let (m, _rx) = manager(Arc::clone(&backend));
        assert_eq!(m.current_session().await.unwrap(), Some(doc1()));

        tokio::time::advance(Duration::from_secs(301)).await;
        // Backend now reports the session gone; the stale value is still served.
        assert_eq!(m.current_session().await.unwrap(), Some(doc1()));

        let mut rx = m.subscribe();
        rx.changed().await.unwrap();
        assert_eq!(backend.probe_calls(), 2);
        assert_eq!(m.current_session().await.unwrap(), None);
    }

    async fn wait_for_probe(backend: &ScriptedBackend, calls: usize) {
        while backend.probe_calls() < calls {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn login_during_pending_probe_is_kept() {
        let gate = Arc::new(Notify::new());
        let backend = Arc::new(ScriptedBackend {
            probe_gate: Some(Arc::clone(&gate)),
            ..ScriptedBackend::default()
        });
        let (m, _rx) = manager(Arc::clone(&backend));

        let boot = tokio::spawn({
            let m = m.clone();
            async move { m.current_session().await }
        });
        wait_for_probe(&backend, 1).await;

        let _ = m.login("doc1", "validpass", false).await.unwrap();
        assert!(m.state().is_authenticated());

        // The probe was sent before the login and answers "no session".
        gate.notify_one();
        assert_eq!(boot.await.unwrap().unwrap(), Some(doc1()));
        assert_eq!(m.state().user(), Some(&doc1()));
    }

    #[tokio::test(start_paused = true)]
    async fn logout_during_background_refresh_is_kept() {
        let gate = Arc::new(Notify::new());
        let backend = Arc::new(ScriptedBackend {
            probe_gate: Some(Arc::clone(&gate)),
            ..ScriptedBackend::default()
        });
        let (m, _rx) = manager(Arc::clone(&backend));
        let _ = m.login("doc1", "validpass", false).await.unwrap();

        tokio::time::advance(Duration::from_secs(301)).await;
        backend.probes.lock().push_back(Ok(Some(doc1())));
        assert_eq!(m.current_session().await.unwrap(), Some(doc1()));
        wait_for_probe(&backend, 1).await;

        m.logout().await.unwrap();
        assert_eq!(m.state(), SessionState::Anonymous);

        let mut rx = m.subscribe();
        let _ = rx.borrow_and_update();
        gate.notify_one();
        while m.inner.refreshing.load(Ordering::Acquire) {
            tokio::task::yield_now().await;
        }
        assert_eq!(m.state(), SessionState::Anonymous);
        assert!(!rx.has_changed().unwrap());
    }

    #[tokio::test]
    async fn refresh_session_always_probes() {
        let backend = Arc::new(ScriptedBackend::default());
        let (m, _rx) = manager(Arc::clone(&backend));
        let _ = m.login("doc1", "validpass", false).await.unwrap();

        assert_eq!(m.refresh_session().await.unwrap(), None);
        assert_eq!(backend.probe_calls(), 1);
        assert_eq!(m.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn register_validates_before_sending() {
        let backend = Arc::new(ScriptedBackend::default());
        let (m, mut rx) = manager(Arc::clone(&backend));
        let mut form = RegisterForm {
            username: "doc9".into(),
            password: "validpass".into(),
            confirm_password: "mismatch".into(),
            email: "doc9@clinic.example".into(),
            name: "Dr. Yoon".into(),
        };

        assert_matches!(
            m.register(&form).await,
            Err(AuthError::Validation { field: "confirmPassword", .. })
        );
        assert_eq!(backend.register_calls.load(Ordering::SeqCst), 0);
        assert!(rx.try_recv().is_err());

        form.confirm_password = "validpass".into();
        m.register(&form).await.unwrap();
        assert_eq!(backend.register_calls.load(Ordering::SeqCst), 1);
        assert!(!rx.try_recv().unwrap().is_failure());
        assert_eq!(m.state(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn find_id_failure_uses_server_message() {
        let backend = Arc::new(ScriptedBackend::default());
        let (m, mut rx) = manager(backend);
        let form = FindIdForm {
            email: "kim@clinic.example".into(),
            name: "Kim".into(),
        };

        assert!(m.find_id(&form).await.is_err());
        let toast = rx.try_recv().unwrap();
        assert!(toast.is_failure());
        assert_eq!(toast.description, "no matching account");
    }
}
