//! Clock Abstraction
//!
//! All freshness and window checks go through an injectable clock so tests
//! can advance virtual time deterministically instead of sleeping.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

// == Clock Trait ==
/// Source of the current time in Unix milliseconds.
pub trait Clock: Send + Sync {
    /// Returns the current Unix timestamp in milliseconds.
    fn now_ms(&self) -> i64;
}

/// Shared clock handle used throughout the core.
pub type SharedClock = Arc<dyn Clock>;

// == System Clock ==
/// Wall-clock implementation backed by chrono.
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Returns a shared wall-clock instance.
pub fn system_clock() -> SharedClock {
    Arc::new(SystemClock)
}

// == Manual Clock ==
/// Test clock whose time only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now_ms: AtomicI64,
}

impl ManualClock {
    /// Creates a manual clock starting at the given timestamp.
    pub fn new(start_ms: i64) -> Self {
        Self {
            now_ms: AtomicI64::new(start_ms),
        }
    }

    /// Advances the clock by the given number of milliseconds.
    pub fn advance(&self, delta_ms: i64) {
        self.now_ms.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now_ms.load(Ordering::SeqCst)
    }
}
