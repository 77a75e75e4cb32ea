//! Rate Limiter Module
//!
//! Wraps arbitrary asynchronous producers with a key so that at most one
//! underlying call executes per key within a time window. Concurrent callers
//! on the same key share the first caller's in-flight result rather than
//! issuing independent calls; repeated callers within the window are served
//! the memoized result.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;
use tracing::trace;

use crate::cache::{CacheStats, KeyedResultCache, DEFAULT_WINDOW_MS};
use crate::clock::SharedClock;
use crate::error::Result;

// == Flight ==
/// One admitted call per key. The shared `OnceCell` is what makes the first
/// caller's in-flight future visible to concurrent callers on the same key.
struct Flight<T> {
    cell: Arc<OnceCell<T>>,
    /// End of the de-duplication window, anchored at admission time
    expires_at: i64,
}

// == Rate Limiter ==
/// Keyed single-execution guard with windowed memoization.
///
/// Completed results are memoized in a [`KeyedResultCache`] until the window
/// that admitted them ends. Producer failures are never memoized: the key is
/// evicted so the next caller retries.
pub struct RateLimiter<T> {
    flights: Mutex<HashMap<String, Flight<T>>>,
    results: KeyedResultCache<T>,
    clock: SharedClock,
    window_ms: i64,
}

impl<T: Clone> RateLimiter<T> {
    // == Constructors ==
    /// Creates a limiter with the default 60s window.
    pub fn new(clock: SharedClock) -> Self {
        Self::with_window(clock, DEFAULT_WINDOW_MS)
    }

    /// Creates a limiter with an explicit default window.
    pub fn with_window(clock: SharedClock, window_ms: i64) -> Self {
        Self {
            flights: Mutex::new(HashMap::new()),
            results: KeyedResultCache::new(clock.clone()),
            clock,
            window_ms,
        }
    }

    // == Run ==
    /// Executes `producer` at most once for `key` within the default window.
    pub async fn run<F, Fut>(&self, key: &str, producer: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.run_within(key, self.window_ms, producer).await
    }

    /// Executes `producer` at most once for `key` within `window_ms`.
    ///
    /// If a memoized result for `key` is live, it is returned without
    /// invoking `producer`. If a call for `key` is already in flight, this
    /// caller awaits that call's result. Otherwise `producer` runs, its
    /// result is memoized until the window ends, and the result is returned.
    pub async fn run_within<F, Fut>(&self, key: &str, window_ms: i64, producer: F) -> Result<T>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        if let Some(value) = self.results.get(key) {
            trace!(key, "rate limiter served memoized result");
            return Ok(value);
        }

        // Admit or join the flight for this key under the lock, then await
        // outside it. `OnceCell::get_or_try_init` runs the producer for the
        // first caller only; everyone else waits on the same cell.
        let (cell, expires_at) = {
            let now = self.clock.now_ms();
            let mut flights = self.flights.lock();
            let flight = flights.entry(key.to_string()).or_insert_with(|| Flight {
                cell: Arc::new(OnceCell::new()),
                expires_at: now + window_ms,
            });
            if flight.expires_at <= now {
                *flight = Flight {
                    cell: Arc::new(OnceCell::new()),
                    expires_at: now + window_ms,
                };
            }
            (Arc::clone(&flight.cell), flight.expires_at)
        };

        match cell.get_or_try_init(producer).await {
            Ok(value) => {
                let value = value.clone();
                self.results.put_until(key, value.clone(), expires_at);
                Ok(value)
            }
            Err(err) => {
                // Failures are not memoized. Evict the flight (only if it is
                // still ours) so the next caller re-executes.
                let mut flights = self.flights.lock();
                if let Some(flight) = flights.get(key) {
                    if Arc::ptr_eq(&flight.cell, &cell) {
                        flights.remove(key);
                    }
                }
                Err(err)
            }
        }
    }

    // == Clear ==
    /// Forces immediate eviction of `key`; the next call re-executes.
    pub fn clear(&self, key: &str) {
        self.flights.lock().remove(key);
        self.results.clear(key);
    }

    // == Purge Expired ==
    /// Drops expired flights and memoized results; returns the number removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let removed_flights = {
            let mut flights = self.flights.lock();
            let before = flights.len();
            flights.retain(|_, flight| flight.expires_at > now);
            before - flights.len()
        };
        removed_flights + self.results.purge_expired()
    }

    // == Stats ==
    /// Hit/miss counters of the memoized-result cache.
    pub fn stats(&self) -> CacheStats {
        self.results.stats()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::error::CacheError;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn limiter_with_clock(window_ms: i64) -> (RateLimiter<u32>, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(0));
        let limiter = RateLimiter::with_window(clock.clone(), window_ms);
        (limiter, clock)
    }

    #[tokio::test]
    async fn test_single_call_executes_producer() {
        let (limiter, _clock) = limiter_with_clock(60_000);
        let calls = AtomicUsize::new(0);

        let value = limiter
            .run("k", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(7)
            })
            .await
            .unwrap();

        assert_eq!(value, 7);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_repeat_calls_within_window_are_memoized() {
        let (limiter, _clock) = limiter_with_clock(60_000);
        let calls = AtomicUsize::new(0);

        for _ in 0..5 {
            let value = limiter
                .run("k", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(7)
                })
                .await
                .unwrap();
            assert_eq!(value, 7);
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_invocation() {
        let (limiter, _clock) = limiter_with_clock(60_000);
        let limiter = Arc::new(limiter);
        let counter = Arc::new(AtomicUsize::new(0));

        let futures: Vec<_> = (0..5)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                let counter = Arc::clone(&counter);
                async move {
                    limiter
                        .run("k", || async move {
                            counter.fetch_add(1, Ordering::SeqCst);
                            // Yield so the other callers pile onto the flight
                            tokio::task::yield_now().await;
                            Ok(counter.load(Ordering::SeqCst) as u32)
                        })
                        .await
                }
            })
            .collect();

        let results = futures::future::join_all(futures).await;

        // Exactly one underlying invocation; all callers see its result
        assert_eq!(counter.load(Ordering::SeqCst), 1);
        for result in results {
            assert_eq!(result.unwrap(), 1);
        }
    }

    #[tokio::test]
    async fn test_window_expiry_allows_reexecution() {
        let (limiter, clock) = limiter_with_clock(1_000);
        let calls = AtomicUsize::new(0);

        let produce = || {
            calls.fetch_add(1, Ordering::SeqCst);
        };

        limiter
            .run("k", || async {
                produce();
                Ok(1)
            })
            .await
            .unwrap();

        clock.advance(1_000);

        limiter
            .run("k", || async {
                produce();
                Ok(2)
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_different_keys_do_not_collapse() {
        let (limiter, _clock) = limiter_with_clock(60_000);
        let calls = AtomicUsize::new(0);

        for key in ["a", "b", "c"] {
            limiter
                .run(key, || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(0)
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_failure_is_not_memoized() {
        let (limiter, _clock) = limiter_with_clock(60_000);
        let calls = AtomicUsize::new(0);

        let err = limiter
            .run("k", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(CacheError::Api("boom".to_string()))
            })
            .await;
        assert!(err.is_err());

        // Next caller gets through and succeeds
        let value = limiter
            .run("k", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(9)
            })
            .await
            .unwrap();

        assert_eq!(value, 9);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_clear_allows_reexecution() {
        let (limiter, _clock) = limiter_with_clock(60_000);
        let calls = AtomicUsize::new(0);

        limiter
            .run("k", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(1)
            })
            .await
            .unwrap();

        limiter.clear("k");

        limiter
            .run("k", || async {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(2)
            })
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_purge_expired_drops_stale_flights() {
        let (limiter, clock) = limiter_with_clock(1_000);

        limiter.run("k", || async { Ok(1) }).await.unwrap();
        clock.advance(1_000);

        let removed = limiter.purge_expired();
        assert!(removed >= 1);
    }
}
