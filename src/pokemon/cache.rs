//! Pokemon Cache Module
//!
//! Arbitrates between the persistent store and the external API: serves
//! valid (full and fresh) records locally, fetches and overwrites on miss,
//! and drives the background full-catalog preload.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::api::PokeApi;
use crate::clock::SharedClock;
use crate::config::Config;
use crate::error::{CacheError, Result};
use crate::pokemon::record::flatten_evolution_chain;
use crate::pokemon::{BaseFormRetry, PokemonRecord};
use crate::store::{EntityStore, Partition};
use crate::tasks;

/// Meta key of the persisted "preload already completed" flag.
const PRELOAD_FLAG: &str = "preload_complete";

// == Pokemon Cache ==
/// The authoritative client-side view of the entity catalog.
///
/// Per-entity lifecycle: Unknown → Partial → Full → stale → Full again.
/// "Stale" is not a stored state; it is derived from the record's age at
/// read time.
pub struct PokemonCache {
    store: Arc<EntityStore>,
    api: Arc<dyn PokeApi>,
    clock: SharedClock,
    catalog_size: usize,
    entity_ttl_ms: i64,
    batch_size: usize,
    retry: BaseFormRetry,
    /// Loaded from the store at construction, set on preload completion,
    /// reset by `clear()`
    preload_done: AtomicBool,
    /// Set by the caller that wins the race to schedule the preload task,
    /// so overlapping preloads are never spawned. Reset by `clear()` and on
    /// preload failure so a later call can retry.
    preload_scheduled: AtomicBool,
}

impl PokemonCache {
    // == Constructor ==
    /// Creates a cache over the given store and API client, restoring the
    /// preload flag from persisted state.
    pub fn new(
        store: Arc<EntityStore>,
        api: Arc<dyn PokeApi>,
        clock: SharedClock,
        config: &Config,
    ) -> Result<Self> {
        let preload_done = store.get_meta(PRELOAD_FLAG)?.as_deref() == Some("true");
        Ok(Self {
            store,
            api,
            clock,
            catalog_size: config.catalog_size,
            entity_ttl_ms: config.entity_ttl_ms,
            batch_size: config.preload_batch_size,
            retry: BaseFormRetry::default(),
            preload_done: AtomicBool::new(preload_done),
            preload_scheduled: AtomicBool::new(false),
        })
    }

    // == Get All Known ==
    /// Returns every known record, partial or full.
    ///
    /// When the store holds fewer records than the catalog size, one bulk
    /// list fetch seeds the missing entries as partial records, with each id
    /// parsed from the entry's URL (list position is meaningless). A list
    /// fetch failure degrades to whatever is already stored.
    ///
    /// Unless `skip_preload` is set or a preload already completed, a
    /// one-time, non-blocking full-catalog preload is scheduled. At most one
    /// preload task is ever in flight: the first caller wins the scheduling
    /// race and later callers fall through.
    pub async fn get_all_known(self: &Arc<Self>, skip_preload: bool) -> Result<Vec<PokemonRecord>> {
        if self.store.entity_count()? < self.catalog_size {
            match self.api.list_pokemon(self.catalog_size as u32, 0).await {
                Ok(resources) => {
                    let now = self.clock.now_ms();
                    let partials: Vec<PokemonRecord> = resources
                        .iter()
                        .filter_map(|res| match res.id() {
                            Some(id) => {
                                Some(PokemonRecord::partial(id, &res.name, &res.url, now))
                            }
                            None => {
                                warn!(name = %res.name, url = %res.url, "catalog entry without numeric id, skipping");
                                None
                            }
                        })
                        .collect();
                    self.store.put_entities(&partials)?;
                    debug!(count = partials.len(), "seeded partial catalog");
                }
                Err(err) => {
                    warn!(error = %err, "catalog list fetch failed, serving stored records");
                }
            }
        }

        if !skip_preload
            && !self.preload_done.load(Ordering::SeqCst)
            && self
                .preload_scheduled
                .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
                .is_ok()
        {
            tasks::spawn_preload_task(Arc::clone(self));
        }

        self.store.all_entities()
    }

    // == Get Valid Cached ==
    /// Looks up by numeric id or case-insensitive name, returning the
    /// record only when it is both full and fresh. Absent, partial, and
    /// stale records all come back as `None`; callers refetch either way.
    pub async fn get_valid_cached(&self, id_or_name: &str) -> Result<Option<PokemonRecord>> {
        let record = self.lookup(id_or_name)?;
        let now = self.clock.now_ms();
        Ok(record.filter(|r| r.is_valid(now, self.entity_ttl_ms)))
    }

    // == Fetch And Cache ==
    /// Returns a valid cached record if present, otherwise fetches full
    /// data, overwrites any partial/stale record for that id, and returns
    /// the fresh record.
    ///
    /// NotFound on a hyphenated name retries the base form once (see
    /// [`BaseFormRetry`]). Terminal NotFound and transient API failures
    /// degrade to `Ok(None)`; storage failures propagate.
    pub async fn fetch_and_cache(&self, id_or_name: &str) -> Result<Option<PokemonRecord>> {
        if let Some(record) = self.get_valid_cached(id_or_name).await? {
            return Ok(Some(record));
        }

        let mut attempt = id_or_name.to_lowercase();
        let mut depth = 0;

        loop {
            match self.api.get_pokemon(&attempt).await {
                Ok(payload) => {
                    let record = match PokemonRecord::from_api_payload(&payload, self.clock.now_ms()) {
                        Ok(record) => record,
                        Err(err) => {
                            warn!(query = %attempt, error = %err, "malformed entity payload");
                            return Ok(None);
                        }
                    };
                    self.store.put_entity(&record)?;
                    debug!(id = record.id, name = %record.name, "cached full record");
                    return Ok(Some(record));
                }
                Err(CacheError::NotFound(_)) => match self.retry.next_attempt(&attempt, depth) {
                    Some(base) => {
                        debug!(query = %attempt, fallback = %base, "entity not found, retrying base form");
                        attempt = base;
                        depth += 1;
                    }
                    None => {
                        debug!(query = %attempt, "entity not found");
                        return Ok(None);
                    }
                },
                Err(CacheError::Api(err)) => {
                    warn!(query = %attempt, error = %err, "entity fetch failed");
                    return Ok(None);
                }
                Err(err) => return Err(err),
            }
        }
    }

    // == Fetch Details ==
    /// Fetches a record and enriches it with species flavor text and the
    /// flattened evolution chain. Enrichment failures degrade to the
    /// un-enriched record.
    pub async fn fetch_details(&self, id_or_name: &str) -> Result<Option<PokemonRecord>> {
        let Some(mut record) = self.fetch_and_cache(id_or_name).await? else {
            return Ok(None);
        };

        let Some(species_url) = record.species_url.clone() else {
            return Ok(Some(record));
        };

        match self.api.get_json(&species_url).await {
            Ok(species) => {
                record.description = english_flavor_text(&species);

                if let Some(chain_url) = species.pointer("/evolution_chain/url").and_then(Value::as_str) {
                    match self.api.get_json(chain_url).await {
                        Ok(chain) => record.evolution_chain = flatten_evolution_chain(&chain),
                        Err(err) => warn!(id = record.id, error = %err, "evolution chain fetch failed"),
                    }
                }

                record.cached_at = self.clock.now_ms();
                self.store.put_entity(&record)?;
            }
            Err(err) => {
                warn!(id = record.id, error = %err, "species fetch failed, returning base record");
            }
        }

        Ok(Some(record))
    }

    // == Preload All Known ==
    /// Walks the known catalog in fixed-size batches, fetching every entry
    /// that is not already fully cached. Each batch completes before the
    /// next starts, bounding peak concurrent calls to the batch size.
    /// Per-entry API failures are skipped; completion persists the flag.
    pub async fn preload_all_known(&self) -> Result<()> {
        let result = self.preload_catalog().await;
        if result.is_err() {
            // Release the scheduling guard so a later call can retry
            self.preload_scheduled.store(false, Ordering::SeqCst);
        }
        result
    }

    async fn preload_catalog(&self) -> Result<()> {
        let known = self.store.all_entities()?;
        let now = self.clock.now_ms();
        let pending: Vec<&PokemonRecord> = known
            .iter()
            .filter(|r| !r.is_valid(now, self.entity_ttl_ms))
            .collect();

        info!(total = known.len(), pending = pending.len(), "starting catalog preload");

        let mut fetched = 0usize;
        let mut skipped = 0usize;

        for batch in pending.chunks(self.batch_size) {
            let results =
                futures::future::join_all(batch.iter().map(|r| self.fetch_and_cache(&r.name))).await;

            for result in results {
                match result? {
                    Some(_) => fetched += 1,
                    None => skipped += 1,
                }
            }
        }

        self.store.set_meta(PRELOAD_FLAG, "true")?;
        self.preload_done.store(true, Ordering::SeqCst);
        info!(fetched, skipped, "catalog preload complete");
        Ok(())
    }

    /// Whether a full-catalog preload has completed for this store.
    pub fn preload_complete(&self) -> bool {
        self.preload_done.load(Ordering::SeqCst)
    }

    // == Save ==
    /// Explicit upsert with a fresh timestamp, for callers that already hold
    /// full data and want to seed the cache without a round trip. The name
    /// is lowercased to keep the record consistent with the name index.
    pub fn save(&self, mut record: PokemonRecord) -> Result<PokemonRecord> {
        record.name = record.name.to_lowercase();
        record.cached_at = self.clock.now_ms();
        self.store.put_entity(&record)?;
        Ok(record)
    }

    // == Clear ==
    /// Empties the entity partition and resets the preload flag and the
    /// scheduling guard. Idempotent.
    pub fn clear(&self) -> Result<()> {
        self.store.clear(Partition::Entities)?;
        self.store.delete_meta(PRELOAD_FLAG)?;
        self.preload_done.store(false, Ordering::SeqCst);
        self.preload_scheduled.store(false, Ordering::SeqCst);
        Ok(())
    }

    /// Store lookup by numeric id or lowercase name.
    fn lookup(&self, id_or_name: &str) -> Result<Option<PokemonRecord>> {
        match id_or_name.parse::<u32>() {
            Ok(id) => self.store.get_entity(id),
            Err(_) => self.store.get_entity_by_name(id_or_name),
        }
    }
}

/// First English flavor text of a species payload, whitespace-normalized.
fn english_flavor_text(species: &Value) -> Option<String> {
    species
        .get("flavor_text_entries")
        .and_then(Value::as_array)?
        .iter()
        .find(|entry| {
            entry.pointer("/language/name").and_then(Value::as_str) == Some("en")
        })
        .and_then(|entry| entry.get("flavor_text"))
        .and_then(Value::as_str)
        .map(|text| text.split_whitespace().collect::<Vec<_>>().join(" "))
}
