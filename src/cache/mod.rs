//! In-Memory Cache Module
//!
//! Provides the generic TTL-keyed result cache and the request
//! de-duplicating rate limiter built on top of it.

mod entry;
mod keyed;
mod limiter;
mod stats;


// Re-export public types
pub use entry::ResultEntry;
pub use keyed::KeyedResultCache;
pub use limiter::RateLimiter;
pub use stats::CacheStats;

// == Public Constants ==
/// Default de-duplication window in milliseconds.
pub const DEFAULT_WINDOW_MS: i64 = 60_000;
