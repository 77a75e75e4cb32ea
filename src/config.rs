//! Configuration Module
//!
//! Handles loading and managing cache configuration from environment variables.

use std::env;

/// Default number of entries in the full catalog.
///
/// Used to decide whether the local store already knows every Pokémon or a
/// bulk list fetch is needed.
pub const DEFAULT_CATALOG_SIZE: usize = 1302;

/// Cache configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Path of the SQLite database backing the entity store
    pub db_path: String,
    /// Base URL of the Pokémon REST API
    pub api_base_url: String,
    /// Number of entries in the full catalog
    pub catalog_size: usize,
    /// Freshness window for full entity records, in milliseconds
    pub entity_ttl_ms: i64,
    /// Freshness window for filter records, in milliseconds
    pub filter_ttl_ms: i64,
    /// TTL for cached document-database results, in milliseconds
    pub gateway_cache_ttl_ms: i64,
    /// De-duplication window of the rate limiter, in milliseconds
    pub rate_limit_window_ms: i64,
    /// Number of entities fetched concurrently per preload batch
    pub preload_batch_size: usize,
    /// Interval of the background expiry sweep, in seconds
    pub sweep_interval_secs: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `DEXCACHE_DB_PATH` - SQLite database path (default: "dexcache.db")
    /// - `DEXCACHE_API_BASE_URL` - API base URL (default: "https://pokeapi.co/api/v2")
    /// - `DEXCACHE_CATALOG_SIZE` - Full catalog size (default: 1302)
    /// - `DEXCACHE_ENTITY_TTL_MS` - Entity freshness window (default: 24h)
    /// - `DEXCACHE_FILTER_TTL_MS` - Filter freshness window (default: 24h)
    /// - `DEXCACHE_GATEWAY_CACHE_TTL_MS` - Gateway result cache TTL (default: 60s)
    /// - `DEXCACHE_RATE_LIMIT_WINDOW_MS` - Rate limit window (default: 60s)
    /// - `DEXCACHE_PRELOAD_BATCH_SIZE` - Preload batch size (default: 20)
    /// - `DEXCACHE_SWEEP_INTERVAL` - Expiry sweep interval in seconds (default: 30)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            db_path: env::var("DEXCACHE_DB_PATH").unwrap_or(defaults.db_path),
            api_base_url: env::var("DEXCACHE_API_BASE_URL").unwrap_or(defaults.api_base_url),
            catalog_size: env_parse("DEXCACHE_CATALOG_SIZE", defaults.catalog_size),
            entity_ttl_ms: env_parse("DEXCACHE_ENTITY_TTL_MS", defaults.entity_ttl_ms),
            filter_ttl_ms: env_parse("DEXCACHE_FILTER_TTL_MS", defaults.filter_ttl_ms),
            gateway_cache_ttl_ms: env_parse(
                "DEXCACHE_GATEWAY_CACHE_TTL_MS",
                defaults.gateway_cache_ttl_ms,
            ),
            rate_limit_window_ms: env_parse(
                "DEXCACHE_RATE_LIMIT_WINDOW_MS",
                defaults.rate_limit_window_ms,
            ),
            preload_batch_size: env_parse("DEXCACHE_PRELOAD_BATCH_SIZE", defaults.preload_batch_size),
            sweep_interval_secs: env_parse("DEXCACHE_SWEEP_INTERVAL", defaults.sweep_interval_secs),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: "dexcache.db".to_string(),
            api_base_url: "https://pokeapi.co/api/v2".to_string(),
            catalog_size: DEFAULT_CATALOG_SIZE,
            entity_ttl_ms: 24 * 60 * 60 * 1000,
            filter_ttl_ms: 24 * 60 * 60 * 1000,
            gateway_cache_ttl_ms: 60 * 1000,
            rate_limit_window_ms: 60 * 1000,
            preload_batch_size: 20,
            sweep_interval_secs: 30,
        }
    }
}

/// Parses an environment variable, falling back to the default on absence
/// or parse failure.
fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
