//! Filter Cache Module
//!
//! Caches taxonomy collections under composite `category[/subcategory]`
//! keys, normalizing the API's heterogeneous response shapes into a flat
//! array of `{name, url}`.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, warn};

use crate::api::{NamedResource, PokeApi};
use crate::clock::SharedClock;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::filter::FilterCategory;
use crate::store::{EntityStore, Partition};

/// Separator between category and subcategory in a filter key.
const KEY_SEPARATOR: char = '/';

// == Filter Cache ==
/// TTL-cached taxonomy lookups over the persistent filter partition.
pub struct FilterCache {
    store: Arc<EntityStore>,
    api: Arc<dyn PokeApi>,
    clock: SharedClock,
    base_url: String,
    ttl_ms: i64,
}

impl FilterCache {
    // == Constructor ==
    pub fn new(
        store: Arc<EntityStore>,
        api: Arc<dyn PokeApi>,
        clock: SharedClock,
        config: &Config,
    ) -> Self {
        Self {
            store,
            api,
            clock,
            base_url: config.api_base_url.clone(),
            ttl_ms: config.filter_ttl_ms,
        }
    }

    // == Get ==
    /// Resolves a filter key, serving a fresh cached entry when one exists
    /// and otherwise fetching, normalizing, and persisting under the exact
    /// composite key.
    ///
    /// An unknown category is fatal. API failures degrade to an empty list
    /// so partial data availability degrades gracefully; storage failures
    /// propagate.
    pub async fn get(&self, filter_key: &str) -> Result<Vec<NamedResource>> {
        let (category_segment, subcategory) = match filter_key.split_once(KEY_SEPARATOR) {
            Some((category, sub)) => (category, Some(sub)),
            None => (filter_key, None),
        };
        let category = FilterCategory::parse(category_segment)?;

        let now = self.clock.now_ms();
        if let Some((entries, cached_at)) = self.store.get_filter(filter_key)? {
            if now - cached_at < self.ttl_ms {
                debug!(key = filter_key, count = entries.len(), "filter cache hit");
                return Ok(entries);
            }
        }

        let url = category.url(&self.base_url, subcategory);
        let payload = match self.api.get_json(&url).await {
            Ok(payload) => payload,
            Err(err @ (CacheError::NotFound(_) | CacheError::Api(_))) => {
                warn!(key = filter_key, error = %err, "filter fetch failed");
                return Ok(Vec::new());
            }
            Err(err) => return Err(err),
        };

        let entries = normalize(category, subcategory, &payload, &url);
        self.store.put_filter(filter_key, &entries, now)?;
        debug!(key = filter_key, count = entries.len(), "filter cached");
        Ok(entries)
    }

    // == Invalidate ==
    /// Evicts one filter key.
    pub fn invalidate(&self, filter_key: &str) -> Result<()> {
        self.store.delete_filter(filter_key)
    }

    /// Evicts every filter record.
    pub fn invalidate_all(&self) -> Result<()> {
        self.store.clear(Partition::Filters)
    }
}

// == Normalization ==
/// Flattens the category-specific response shapes to `Vec<NamedResource>`:
///
/// - unqualified category: the `results` array is already `{name, url}`
/// - type/ability subcategory: entities are nested as `pokemon[].pokemon`
/// - region subcategory: the payload is one region object; its `name` plus
///   the fetched URL become a single-element list, consistent with the
///   other categories (the upstream data has no per-entity list to offer)
fn normalize(
    category: FilterCategory,
    subcategory: Option<&str>,
    payload: &Value,
    url: &str,
) -> Vec<NamedResource> {
    match (category, subcategory) {
        (_, None) => collect_resources(payload.get("results")),
        (FilterCategory::Type | FilterCategory::Ability, Some(_)) => payload
            .get("pokemon")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|entry| {
                        let inner = entry.get("pokemon")?;
                        Some(NamedResource::new(
                            inner.get("name")?.as_str()?,
                            inner.get("url")?.as_str()?,
                        ))
                    })
                    .collect()
            })
            .unwrap_or_default(),
        (FilterCategory::Region, Some(sub)) => {
            let name = payload
                .get("name")
                .and_then(Value::as_str)
                .unwrap_or(sub);
            vec![NamedResource::new(name, url)]
        }
    }
}

fn collect_resources(results: Option<&Value>) -> Vec<NamedResource> {
    results
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| {
                    Some(NamedResource::new(
                        entry.get("name")?.as_str()?,
                        entry.get("url")?.as_str()?,
                    ))
                })
                .collect()
        })
        .unwrap_or_default()
}
