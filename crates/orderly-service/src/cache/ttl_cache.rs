//! Generic time-to-live cache with a background sweeper.

use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// A cached value with its timestamps.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub created_at: Instant,
    /// `None` means the entry never expires.
    pub expires_at: Option<Instant>,
}

impl<V> CacheEntry<V> {
    /// Returns true once `now` has reached the expiry instant.
    #[must_use]
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

/// Longest sweep period the sweeper will schedule.
const MAX_SWEEP_INTERVAL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

struct Store<V> {
    entries: RwLock<HashMap<String, CacheEntry<V>>>,
}

impl<V> Store<V> {
    fn purge_expired(&self) -> usize {
        let now = Instant::now();

        let expired: Vec<String> = self
            .entries
            .read()
            .iter()
            .filter(|(_, entry)| entry.is_expired(now))
            .map(|(key, _)| key.clone())
            .collect();

        if expired.is_empty() {
            return 0;
        }

        let mut entries = self.entries.write();
        let mut removed = 0;
        for key in expired {
            // A concurrent set may have refreshed the key since the scan.
            if entries.get(&key).is_some_and(|entry| entry.is_expired(now)) {
                entries.remove(&key);
                removed += 1;
            }
        }
        removed
    }
}

/// Concurrency-safe string-keyed cache with per-entry TTL.
///
/// Reads never return an entry whose expiry has passed, whether or not the
/// sweeper has visited it yet. The sweeper runs every `sweep_interval` for
/// the lifetime of the cache and stops on [`TtlCache::stop`] or drop.
///
/// A single reader/writer lock guards the whole key space.
pub struct TtlCache<V> {
    store: Arc<Store<V>>,
    default_ttl: Duration,
    sweep_interval: Duration,
    stop_tx: watch::Sender<bool>,
    sweeper: Mutex<Option<JoinHandle<()>>>,
}

impl<V> TtlCache<V>
where
    V: Clone + Send + Sync + 'static,
{
    /// Creates a cache and starts its sweeper on the current Tokio runtime.
    ///
    /// A zero `sweep_interval`, or no runtime, leaves the cache with lazy
    /// expiry only.
    #[must_use]
    pub fn new(default_ttl: Duration, sweep_interval: Duration) -> Self {
        let store = Arc::new(Store {
            entries: RwLock::new(HashMap::new()),
        });
        let (stop_tx, stop_rx) = watch::channel(false);

        let sweeper = if sweep_interval.is_zero() {
            None
        } else if let Ok(handle) = tokio::runtime::Handle::try_current() {
            Some(handle.spawn(sweep_loop(Arc::downgrade(&store), sweep_interval, stop_rx)))
        } else {
            warn!("No Tokio runtime; cache sweeper not started");
            None
        };

        Self {
            store,
            default_ttl,
            sweep_interval,
            stop_tx,
            sweeper: Mutex::new(sweeper),
        }
    }

    /// Returns the value for `key` if present and not expired.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<V> {
        let now = Instant::now();
        self.store
            .entries
            .read()
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone())
    }

    /// Inserts or replaces the entry for `key`.
    ///
    /// A zero `ttl` means the cache's default TTL. If that default is also
    /// zero, or the expiry instant is not representable, the entry never
    /// expires.
    pub fn set(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let ttl = if ttl.is_zero() { self.default_ttl } else { ttl };
        let now = Instant::now();
        let entry = CacheEntry {
            value,
            created_at: now,
            expires_at: if ttl.is_zero() { None } else { now.checked_add(ttl) },
        };
        self.store.entries.write().insert(key.into(), entry);
    }

    /// Removes every expired entry and returns how many were removed.
    ///
    /// Keys are collected under the shared lock and deleted under the
    /// exclusive lock, so readers are only blocked for the deletion.
    pub fn purge_expired(&self) -> usize {
        self.store.purge_expired()
    }

    /// Number of stored entries, including expired ones not yet swept.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.entries.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[must_use]
    pub const fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// Returns true while the background sweeper is alive.
    #[must_use]
    pub fn is_sweeping(&self) -> bool {
        self.sweeper
            .lock()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Stops the sweeper and waits for it to exit.
    pub async fn stop(&self) {
        self.stop_tx.send_replace(true);
        let handle = self.sweeper.lock().take();
        if let Some(handle) = handle {
            if let Err(e) = handle.await {
                warn!(error = %e, "Cache sweeper ended abnormally");
            }
            debug!("Cache sweeper stopped");
        }
    }
}

impl<V> Drop for TtlCache<V> {
    fn drop(&mut self) {
        self.stop_tx.send_replace(true);
    }
}

impl<V> std::fmt::Debug for TtlCache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("entries", &self.store.entries.read().len())
            .field("default_ttl", &self.default_ttl)
            .field("sweep_interval", &self.sweep_interval)
            .finish_non_exhaustive()
    }
}

async fn sweep_loop<V>(store: Weak<Store<V>>, every: Duration, mut stop_rx: watch::Receiver<bool>) {
    let every = every.min(MAX_SWEEP_INTERVAL);
    let mut ticker = tokio::time::interval_at(Instant::now() + every, every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(store) = store.upgrade() else { break };
                let removed = store.purge_expired();
                if removed > 0 {
                    debug!(removed, "Swept expired cache entries");
                }
            }
            changed = stop_rx.changed() => {
                if changed.is_err() || *stop_rx.borrow() {
                    break;
                }
            }
        }
    }
}
