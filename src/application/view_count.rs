//! Time-boxed memo of page-view counts.
//!
//! Entries are stored as `{"views": n, "timestamp": ms}` under
//! `view-count-{path}`, the same shape the browser keeps in `localStorage`.
//! An entry is fresh while `now - timestamp < ttl`. Storage failures never
//! surface to callers: they degrade to a miss (on read) or a no-op (on write).

use std::{
    num::NonZeroUsize,
    sync::{Mutex, MutexGuard},
};

use lru::LruCache;
use metrics::counter;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::{debug, warn};

const SOURCE: &str = "folio::application::view_count";
const KEY_PREFIX: &str = "view-count-";

pub const VIEW_COUNT_TTL: Duration = Duration::hours(24);
/// Paths kept by the in-memory store before the least recently used is dropped.
pub const VIEW_COUNT_CAPACITY: usize = 1024;

pub const METRIC_VIEW_CACHE_HIT: &str = "folio_view_cache_hit_total";
pub const METRIC_VIEW_CACHE_MISS: &str = "folio_view_cache_miss_total";
pub const METRIC_VIEW_CACHE_EXPIRED: &str = "folio_view_cache_expired_total";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key-value store unavailable: {0}")]
    Unavailable(String),
}

/// String key-value storage backing the cache.
pub trait KeyValueStore: Send + Sync {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError>;
    fn set_raw(&self, key: &str, value: String) -> Result<(), StoreError>;
    fn remove(&self, key: &str) -> Result<(), StoreError>;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> OffsetDateTime;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> OffsetDateTime {
        OffsetDateTime::now_utc()
    }
}

/// Bounded LRU store; paths come from requests, so entries must not pile up.
pub struct MemoryStore {
    entries: Mutex<LruCache<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_capacity(VIEW_COUNT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, LruCache<String, String>>, StoreError> {
        self.entries
            .lock()
            .map_err(|_| StoreError::Unavailable("view-count store lock poisoned".to_string()))
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set_raw(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.lock()?.put(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.lock()?.pop(key);
        Ok(())
    }
}

/// A cached count for one path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViewCountEntry {
    pub views: u64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
}

pub struct ViewCountCache<S = MemoryStore, C = SystemClock> {
    store: S,
    clock: C,
    ttl: Duration,
}

impl ViewCountCache {
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new(), SystemClock)
    }
}

impl<S: KeyValueStore, C: Clock> ViewCountCache<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self {
            store,
            clock,
            ttl: VIEW_COUNT_TTL,
        }
    }

    pub fn storage_key(path: &str) -> String {
        format!("{KEY_PREFIX}{path}")
    }

    /// A fresh count for `path`, evicting it when stale.
    pub fn get(&self, path: &str) -> Option<u64> {
        let key = Self::storage_key(path);
        let raw = match self.store.get_raw(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                counter!(METRIC_VIEW_CACHE_MISS).increment(1);
                return None;
            }
            Err(err) => {
                warn!(target = SOURCE, key = %key, error = %err, "view-count read failed");
                counter!(METRIC_VIEW_CACHE_MISS).increment(1);
                return None;
            }
        };

        let entry: ViewCountEntry = match serde_json::from_str(&raw) {
            Ok(entry) => entry,
            Err(err) => {
                debug!(target = SOURCE, key = %key, error = %err, "ignoring corrupt view-count entry");
                counter!(METRIC_VIEW_CACHE_MISS).increment(1);
                return None;
            }
        };

        if self.is_fresh(&entry) {
            counter!(METRIC_VIEW_CACHE_HIT).increment(1);
            return Some(entry.views);
        }

        counter!(METRIC_VIEW_CACHE_EXPIRED).increment(1);
        if let Err(err) = self.store.remove(&key) {
            warn!(target = SOURCE, key = %key, error = %err, "view-count eviction failed");
        }
        None
    }

    pub fn set(&self, path: &str, views: u64) {
        let key = Self::storage_key(path);
        let entry = ViewCountEntry {
            views,
            timestamp: unix_millis(self.clock.now()),
        };
        let encoded = match serde_json::to_string(&entry) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(target = SOURCE, key = %key, error = %err, "view-count encode failed");
                return;
            }
        };
        if let Err(err) = self.store.set_raw(&key, encoded) {
            warn!(target = SOURCE, key = %key, error = %err, "view-count write failed");
        }
    }

    fn is_fresh(&self, entry: &ViewCountEntry) -> bool {
        let age_ms = unix_millis(self.clock.now()).saturating_sub(entry.timestamp);
        i128::from(age_ms) < self.ttl.whole_milliseconds()
    }
}

fn unix_millis(at: OffsetDateTime) -> i64 {
    (at.unix_timestamp_nanos() / 1_000_000) as i64
}
