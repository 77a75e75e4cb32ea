//! Error types for the caching core
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the caching and request-governance core.
///
/// Propagation policy: `NotFound` and `Api` failures from the external API
/// degrade to empty results at the cache boundaries so callers can show a
/// retry affordance. `Storage` errors always propagate; converting them to
/// empty results would mask data loss.
#[derive(Error, Debug)]
pub enum CacheError {
    /// External lookup yielded no data for the given id/name/category
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transient external API failure (network, 5xx, decode)
    #[error("API error: {0}")]
    Api(String),

    /// Persistent store operation failed; fatal for the enclosing call
    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Record or payload could not be (de)serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filter category has no known endpoint mapping
    #[error("Unknown filter category: {0}")]
    UnknownCategory(String),
}

impl CacheError {
    /// True when the error means "no data exists", as opposed to a failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CacheError::NotFound(_))
    }
}

// == Result Type Alias ==
/// Convenience Result type for the caching core.
pub type Result<T> = std::result::Result<T, CacheError>;
