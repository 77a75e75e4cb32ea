//! Keyed Result Cache Module
//!
//! Generic TTL-based store mapping an opaque string key to a previously
//! computed result. Used by the rate limiter for memoized call results and
//! by the document-database gateway for its short-lived read cache.

use std::collections::HashMap;

use parking_lot::Mutex;

use crate::cache::{CacheStats, ResultEntry};
use crate::clock::SharedClock;

// == Keyed Result Cache ==
/// Time-evicted key/value store with overwrite semantics.
///
/// Eviction is time-based only; there is no LRU or capacity bound. Expired
/// entries are dropped lazily on read and in bulk by [`purge_expired`],
/// which the background sweep task calls periodically.
///
/// [`purge_expired`]: KeyedResultCache::purge_expired
pub struct KeyedResultCache<T> {
    entries: Mutex<Inner<T>>,
    clock: SharedClock,
}

struct Inner<T> {
    map: HashMap<String, ResultEntry<T>>,
    stats: CacheStats,
}

impl<T: Clone> KeyedResultCache<T> {
    // == Constructor ==
    /// Creates an empty cache reading time from the given clock.
    pub fn new(clock: SharedClock) -> Self {
        Self {
            entries: Mutex::new(Inner {
                map: HashMap::new(),
                stats: CacheStats::new(),
            }),
            clock,
        }
    }

    // == Get ==
    /// Returns the live value for `key`, or `None` on miss or expiry.
    ///
    /// An expired entry is removed on the spot and counted as a miss.
    pub fn get(&self, key: &str) -> Option<T> {
        let now = self.clock.now_ms();
        let mut inner = self.entries.lock();

        match inner.map.get(key) {
            Some(entry) if !entry.is_expired(now) => {
                let value = entry.value.clone();
                inner.stats.record_hit();
                Some(value)
            }
            Some(_) => {
                inner.map.remove(key);
                inner.stats.record_evictions(1);
                inner.stats.record_miss();
                None
            }
            None => {
                inner.stats.record_miss();
                None
            }
        }
    }

    // == Put ==
    /// Stores `value` under `key`, expiring `ttl_ms` from now.
    ///
    /// An existing entry is overwritten and its TTL reset.
    pub fn put(&self, key: &str, value: T, ttl_ms: i64) {
        let now = self.clock.now_ms();
        let mut inner = self.entries.lock();
        inner
            .map
            .insert(key.to_string(), ResultEntry::new(value, now, ttl_ms));
    }

    /// Stores `value` under `key` with an explicit expiry timestamp.
    pub fn put_until(&self, key: &str, value: T, expires_at: i64) {
        let now = self.clock.now_ms();
        let mut inner = self.entries.lock();
        inner
            .map
            .insert(key.to_string(), ResultEntry::until(value, now, expires_at));
    }

    // == Clear ==
    /// Forces immediate eviction of `key`, allowing the next caller through.
    pub fn clear(&self, key: &str) {
        self.entries.lock().map.remove(key);
    }

    /// Removes every entry.
    pub fn clear_all(&self) {
        self.entries.lock().map.clear();
    }

    // == Purge Expired ==
    /// Removes all expired entries; returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let mut inner = self.entries.lock();

        let before = inner.map.len();
        inner.map.retain(|_, entry| !entry.is_expired(now));
        let removed = before - inner.map.len();

        inner.stats.record_evictions(removed as u64);
        removed
    }

    // == Stats ==
    /// Returns a snapshot of the hit/miss/eviction counters.
    pub fn stats(&self) -> CacheStats {
        self.entries.lock().stats
    }

    /// Returns the current number of entries, live or expired.
    pub fn len(&self) -> usize {
        self.entries.lock().map.len()
    }

    /// Returns true if the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
