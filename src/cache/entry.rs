//! Cache Entry Module
//!
//! Defines the structure for individual keyed cache entries with TTL support.

// == Result Entry ==
/// A single memoized result with its expiry bookkeeping.
///
/// Timestamps are Unix milliseconds supplied by the owning cache's [`Clock`],
/// never read from the wall clock here, so expiry is fully deterministic in
/// tests.
///
/// [`Clock`]: crate::clock::Clock
#[derive(Debug, Clone)]
pub struct ResultEntry<T> {
    /// The memoized value
    pub value: T,
    /// Creation timestamp (Unix milliseconds)
    pub cached_at: i64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: i64,
}

impl<T> ResultEntry<T> {
    // == Constructor ==
    /// Creates a new entry expiring `ttl_ms` after `now_ms`.
    pub fn new(value: T, now_ms: i64, ttl_ms: i64) -> Self {
        Self {
            value,
            cached_at: now_ms,
            expires_at: now_ms + ttl_ms,
        }
    }

    /// Creates a new entry with an explicit expiry timestamp.
    ///
    /// Used by the rate limiter, whose window is anchored at the moment the
    /// underlying call was first admitted rather than at memoization time.
    pub fn until(value: T, now_ms: i64, expires_at: i64) -> Self {
        Self {
            value,
            cached_at: now_ms,
            expires_at,
        }
    }

    // == Is Expired ==
    /// An entry is expired once the current time reaches its expiry.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at
    }

    /// Remaining lifetime in milliseconds; zero once expired.
    pub fn ttl_remaining_ms(&self, now_ms: i64) -> i64 {
        (self.expires_at - now_ms).max(0)
    }
}
