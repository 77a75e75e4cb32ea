//! Firestore Gateway Module
//!
//! Every document-database read and write passes through
//! [`FirestoreGateway::execute`]; callers cannot reach the database without
//! picking up logging, de-duplication, and (for reads that opt in) the
//! short-lived result cache. The cache is layered: an in-memory
//! [`KeyedResultCache`] in front of the store's `result_cache` partition, so
//! cached reads survive a process restart within their TTL.
//!
//! The gateway does not infer data dependencies. A write that changes data
//! behind a cached read must be followed by an explicit
//! [`FirestoreGateway::clear`] of the affected keys.

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, error};

use crate::cache::{KeyedResultCache, RateLimiter};
use crate::clock::SharedClock;
use crate::config::Config;
use crate::error::Result;
use crate::gateway::ExecuteOptions;
use crate::store::EntityStore;

// == Firestore Op ==
/// The operation kinds the gateway mediates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FirestoreOp {
    /// Single-document read
    Get,
    /// Query returning a result set
    QueryGet,
    /// Document create/replace
    Set,
    /// Merge-update of named fields
    Update,
    /// Document removal
    Delete,
    /// Auto-id document insert
    Add,
    /// Atomic numeric increment
    Increment,
}

impl FirestoreOp {
    /// Only reads are eligible for the result cache.
    pub fn is_read(self) -> bool {
        matches!(self, Self::Get | Self::QueryGet)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::QueryGet => "query-get",
            Self::Set => "set",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Add => "add",
            Self::Increment => "increment",
        }
    }
}

// == Call Context ==
/// Who is calling and with what, for the log line that precedes every call.
#[derive(Debug, Clone)]
pub struct CallContext {
    /// The service or component issuing the call
    pub caller: &'static str,
    /// Human-readable rendering of the call's arguments
    pub args: String,
}

impl CallContext {
    pub fn new(caller: &'static str, args: impl Into<String>) -> Self {
        Self {
            caller,
            args: args.into(),
        }
    }
}

// == Firestore Gateway ==
/// Logging + rate limiting + optional result caching around a document
/// database, in that order.
pub struct FirestoreGateway {
    limiter: RateLimiter<Value>,
    results: KeyedResultCache<Value>,
    store: Arc<EntityStore>,
    clock: SharedClock,
    cache_ttl_ms: i64,
}

impl FirestoreGateway {
    // == Constructor ==
    pub fn new(store: Arc<EntityStore>, clock: SharedClock, config: &Config) -> Self {
        Self {
            limiter: RateLimiter::with_window(clock.clone(), config.rate_limit_window_ms),
            results: KeyedResultCache::new(clock.clone()),
            store,
            clock,
            cache_ttl_ms: config.gateway_cache_ttl_ms,
        }
    }

    // == Execute ==
    /// Runs one database call under the gateway's policies.
    ///
    /// 1. A cacheable read (`is_read` and `use_cache`) is served from the
    ///    result cache on a live hit, memory first, then the persistent
    ///    partition.
    /// 2. Otherwise the call goes through the rate limiter keyed by `key`,
    ///    so identical calls within the window collapse to one execution.
    /// 3. The raw response passes through `options.transform` (or plain
    ///    serialization) before anything is cached or returned.
    /// 4. A cacheable read's transformed result is stored under `key`.
    ///
    /// Failures are logged with the call's context and rethrown unchanged.
    pub async fn execute<Raw, F, Fut>(
        &self,
        op: FirestoreOp,
        key: &str,
        context: CallContext,
        options: ExecuteOptions<Raw>,
        call: F,
    ) -> Result<Value>
    where
        Raw: Serialize,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Raw>>,
    {
        debug!(
            operation = op.name(),
            caller = context.caller,
            args = %context.args,
            key,
            "firestore call"
        );

        let cacheable = op.is_read() && options.use_cache;
        if cacheable {
            if let Some(hit) = self.cached_result(key)? {
                debug!(key, "firestore result served from cache");
                return Ok(hit);
            }
        }

        let transform = options.transform;
        let caller = context.caller;
        let value = self
            .limiter
            .run(key, || async move {
                let raw = call().await.map_err(|err| {
                    error!(
                        operation = op.name(),
                        caller,
                        key,
                        error = %err,
                        "firestore call failed"
                    );
                    err
                })?;
                match transform {
                    Some(transform) => transform(raw),
                    None => serde_json::to_value(raw).map_err(Into::into),
                }
            })
            .await?;

        if cacheable {
            self.results.put(key, value.clone(), self.cache_ttl_ms);
            self.store.put_result(key, &value, self.clock.now_ms())?;
        }

        Ok(value)
    }

    // == Clear ==
    /// Invalidates one key across the result cache (memory and persistent)
    /// and the rate limiter. Writers call this for every read key their
    /// write has made stale.
    pub fn clear(&self, key: &str) -> Result<()> {
        self.results.clear(key);
        self.limiter.clear(key);
        self.store.delete_result(key)
    }

    // == Purge Expired ==
    /// Drops expired in-memory entries; returns the number removed. Called
    /// by the background sweep task.
    pub fn purge_expired(&self) -> usize {
        self.results.purge_expired() + self.limiter.purge_expired()
    }

    /// Result-cache hit with TTL check, memory first, then the store. A
    /// persistent hit reseeds the memory layer.
    fn cached_result(&self, key: &str) -> Result<Option<Value>> {
        if let Some(value) = self.results.get(key) {
            return Ok(Some(value));
        }

        let now = self.clock.now_ms();
        if let Some((value, cached_at)) = self.store.get_result(key)? {
            if now - cached_at < self.cache_ttl_ms {
                self.results
                    .put_until(key, value.clone(), cached_at + self.cache_ttl_ms);
                return Ok(Some(value));
            }
        }
        Ok(None)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_classification() {
        assert!(FirestoreOp::Get.is_read());
        assert!(FirestoreOp::QueryGet.is_read());
        assert!(!FirestoreOp::Set.is_read());
        assert!(!FirestoreOp::Update.is_read());
        assert!(!FirestoreOp::Delete.is_read());
        assert!(!FirestoreOp::Add.is_read());
        assert!(!FirestoreOp::Increment.is_read());
    }

    #[test]
    fn test_op_names() {
        assert_eq!(FirestoreOp::QueryGet.name(), "query-get");
        assert_eq!(FirestoreOp::Increment.name(), "increment");
    }
}
