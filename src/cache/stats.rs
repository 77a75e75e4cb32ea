//! Cache Statistics Module
//!
//! Tracks performance metrics for the keyed result cache.

use serde::Serialize;

// == Cache Stats ==
/// Hit/miss/eviction counters for diagnostics.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CacheStats {
    /// Number of reads served from a live entry
    pub hits: u64,
    /// Number of reads that found no live entry
    pub misses: u64,
    /// Number of entries removed because their TTL elapsed
    pub evictions: u64,
}

impl CacheStats {
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no reads have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub(crate) fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub(crate) fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub(crate) fn record_evictions(&mut self, count: u64) {
        self.evictions += count;
    }
}
