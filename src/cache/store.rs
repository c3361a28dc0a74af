//! Primary tier: bounded in-process cache with LRU eviction and lazy TTL expiry.

use std::{num::NonZeroUsize, sync::Mutex, time::Duration};

use lru::LruCache;
use metrics::counter;
use tokio::time::Instant;
use tracing::debug;

use super::config::CacheConfig;
use super::keys::CacheKey;
use super::lock::lock_primary;

const METRIC_PRIMARY_HIT: &str = "localizer_cache_primary_hit_total";
const METRIC_PRIMARY_MISS: &str = "localizer_cache_primary_miss_total";
const METRIC_PRIMARY_EVICT: &str = "localizer_cache_primary_evict_total";
const METRIC_PRIMARY_EXPIRED: &str = "localizer_cache_primary_expired_total";

struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// Bounded key/value store with least-recently-used eviction and a fixed
/// per-entry time-to-live.
///
/// Expiry is anchored at insertion (or refresh through [`ExpiringLru::put`]);
/// reads promote recency but never extend an entry's life. Expired entries
/// are purged by the read that finds them, there is no background sweep.
///
/// Every operation runs under a single mutex covering the full
/// check-evict-or-touch sequence. The guard is never held across an await.
pub struct ExpiringLru<V> {
    ttl: Duration,
    entries: Mutex<LruCache<CacheKey, Entry<V>>>,
}

impl<V: Clone> ExpiringLru<V> {
    pub fn new(capacity: NonZeroUsize, ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.primary_capacity_non_zero(), config.primary_ttl())
    }

    /// Return a clone of the live value for `key`, promoting it to most recent.
    ///
    /// An entry whose age has reached the TTL is removed and reported absent.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let mut entries = lock_primary(&self.entries, "get");

        let Some(expired) = entries
            .peek(key)
            .map(|entry| entry.inserted_at.elapsed() >= self.ttl)
        else {
            drop(entries);
            counter!(METRIC_PRIMARY_MISS).increment(1);
            return None;
        };

        if expired {
            entries.pop(key);
            drop(entries);
            debug!(cache = "primary", key = %key, outcome = "expired", "dropping expired entry");
            counter!(METRIC_PRIMARY_EXPIRED).increment(1);
            counter!(METRIC_PRIMARY_MISS).increment(1);
            return None;
        }

        let value = entries.get(key).map(|entry| entry.value.clone());
        drop(entries);
        counter!(METRIC_PRIMARY_HIT).increment(1);
        value
    }

    /// Insert or refresh `key`.
    ///
    /// An existing entry gets the new value, a fresh timestamp and moves to
    /// most recent. A new key at capacity evicts the least recently used
    /// entry first; that entry's key is returned.
    pub fn put(&self, key: CacheKey, value: V) -> Option<CacheKey> {
        let entry = Entry {
            value,
            inserted_at: Instant::now(),
        };

        let evicted = {
            let mut entries = lock_primary(&self.entries, "put");
            match entries.push(key.clone(), entry) {
                Some((previous, _)) if previous != key => Some(previous),
                _ => None,
            }
        };

        if let Some(evicted_key) = evicted.as_ref() {
            debug!(cache = "primary", key = %evicted_key, outcome = "evicted", "capacity eviction");
            counter!(METRIC_PRIMARY_EVICT).increment(1);
        }

        evicted
    }

    /// Number of stored entries, including expired entries not yet visited.
    pub fn len(&self) -> usize {
        lock_primary(&self.entries, "len").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        lock_primary(&self.entries, "capacity").cap().get()
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Drop every entry.
    pub fn clear(&self) {
        lock_primary(&self.entries, "clear").clear();
    }
}
