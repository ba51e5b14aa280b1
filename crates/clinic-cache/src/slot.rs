//! A single named, independently replaceable cache slot.
//!
//! Writes always replace the whole value. The only non-replacing mutation is
//! the staleness mark set by [`Slot::invalidate`]. Every mutation bumps a
//! version counter published over a [`watch`] channel so readers can react.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::{Mutex, watch};
use tokio::time::Instant;
use tracing::debug;

use crate::key::QueryKey;

struct SlotState<T> {
    value: Option<Arc<T>>,
    updated_at: Option<Instant>,
    stale: bool,
    writes: u64,
}

/// A typed cache slot.
pub struct Slot<T> {
    key: QueryKey,
    stale_after: Option<Duration>,
    state: RwLock<SlotState<T>>,
    version: watch::Sender<u64>,
    fetch_lock: Mutex<()>,
}

impl<T> Slot<T> {
    /// Create an empty slot.
    ///
    /// `stale_after` is the age at which a populated value counts as stale.
    /// `None` means the value only goes stale through [`Slot::invalidate`].
    pub fn new(key: QueryKey, stale_after: Option<Duration>) -> Self {
        let (version, _) = watch::channel(0);
        Self {
            key,
            stale_after,
            state: RwLock::new(SlotState {
                value: None,
                updated_at: None,
                stale: false,
                writes: 0,
            }),
            version,
            fetch_lock: Mutex::new(()),
        }
    }

    /// The slot's key.
    pub fn key(&self) -> QueryKey {
        self.key
    }

    /// Current value, if the slot has ever been written.
    pub fn get(&self) -> Option<Arc<T>> {
        self.state.read().value.clone()
    }

    /// Replace the value wholesale and clear any staleness mark.
    pub fn set(&self, value: T) {
        self.replace(Arc::new(value));
    }

    fn replace(&self, value: Arc<T>) {
        Self::write_into(&mut self.state.write(), value);
        debug!(key = %self.key, "cache slot replaced");
        self.bump();
    }

    fn write_into(state: &mut SlotState<T>, value: Arc<T>) {
        state.value = Some(value);
        state.updated_at = Some(Instant::now());
        state.stale = false;
        state.writes = state.writes.wrapping_add(1);
    }

    /// Store a fetched value unless a direct write landed after `since`, in
    /// which case that newer value is kept and returned.
    fn settle(&self, since: u64, fetched: T) -> Arc<T> {
        let value = {
            let mut state = self.state.write();
            if state.writes != since {
                if let Some(current) = &state.value {
                    debug!(key = %self.key, "cache slot written during fetch; dropping fetched value");
                    return Arc::clone(current);
                }
            }
            let value = Arc::new(fetched);
            Self::write_into(&mut state, Arc::clone(&value));
            value
        };
        debug!(key = %self.key, "cache slot replaced");
        self.bump();
        value
    }

    fn writes(&self) -> u64 {
        self.state.read().writes
    }

    /// Mark the value stale without touching it.
    pub fn invalidate(&self) {
        self.state.write().stale = true;
        debug!(key = %self.key, "cache slot marked stale");
        self.bump();
    }

    /// Whether the slot carries an explicit staleness mark or has outlived its
    /// window. An empty slot is not stale; it is missing.
    pub fn is_stale(&self) -> bool {
        let state = self.state.read();
        if state.value.is_none() {
            return false;
        }
        if state.stale {
            return true;
        }
        match (self.stale_after, state.updated_at) {
            (Some(window), Some(at)) => at.elapsed() >= window,
            _ => false,
        }
    }

    /// Whether the next read should go to the backend.
    pub fn needs_fetch(&self) -> bool {
        self.get().is_none() || self.is_stale()
    }

    /// When the value was last replaced.
    pub fn updated_at(&self) -> Option<Instant> {
        self.state.read().updated_at
    }

    /// Subscribe to mutations. The received value is a version counter that
    /// increases on every `set` and `invalidate`.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.version.subscribe()
    }

    /// Current version counter.
    pub fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Return the cached value, or run `fetch` to refill the slot when it is
    /// empty or stale.
    ///
    /// Concurrent callers share one fetch: the first takes the fetch lock,
    /// the rest wait on it and then find the slot fresh. A failed fetch
    /// leaves the slot as it was. A [`Slot::set`] that lands while the fetch
    /// is in flight wins over the fetched value.
    pub async fn get_or_fetch<F, Fut, E>(&self, fetch: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if let Some(value) = self.fresh() {
            return Ok(value);
        }

        let _guard = self.fetch_lock.lock().await;
        if let Some(value) = self.fresh() {
            return Ok(value);
        }

        debug!(key = %self.key, "fetching cache slot");
        let since = self.writes();
        let fetched = fetch().await?;
        Ok(self.settle(since, fetched))
    }

    /// Run `fetch` regardless of freshness, sharing the fetch lock with
    /// [`Slot::get_or_fetch`]. Same write rules apply.
    pub async fn refetch<F, Fut, E>(&self, fetch: F) -> Result<Arc<T>, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let _guard = self.fetch_lock.lock().await;
        debug!(key = %self.key, "refetching cache slot");
        let since = self.writes();
        let fetched = fetch().await?;
        Ok(self.settle(since, fetched))
    }

    fn fresh(&self) -> Option<Arc<T>> {
        if self.needs_fetch() {
            return None;
        }
        self.get()
    }

    fn bump(&self) {
        self.version.send_modify(|v| *v = v.wrapping_add(1));
    }
}

impl<T> std::fmt::Debug for Slot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("Slot")
            .field("key", &self.key)
            .field("populated", &state.value.is_some())
            .field("stale", &state.stale)
            .finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
