//! Pokémon Record Module
//!
//! The cached entity record, its partial/full distinction, and parsing from
//! the external API payload.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::api::id_from_url;
use crate::error::{CacheError, Result};

// == Sprite Set ==
/// Image URLs for an entity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpriteSet {
    pub front_default: Option<String>,
    pub back_default: Option<String>,
    pub front_shiny: Option<String>,
    /// High-resolution artwork from `sprites.other."official-artwork"`
    pub official_artwork: Option<String>,
}

// == Stat Value ==
/// One named base stat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatValue {
    pub name: String,
    pub base: u32,
}

// == Pokemon Record ==
/// A cached catalog entity.
///
/// A record is **partial** when it carries only identity fields (`id`,
/// `name`, `source_url`). It is **full** once sprites, types, and stats are
/// present. A full record is only valid while fresh; a partial record never
/// goes stale (names, ids, and URLs do not change) but is no substitute for
/// a full one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PokemonRecord {
    /// Positive numeric id
    pub id: u32,
    /// Unique lowercase name (alternate key)
    pub name: String,
    /// Detail URL the record was or will be fetched from
    pub source_url: String,
    /// Image URLs; present only on full records
    pub sprites: Option<SpriteSet>,
    /// Ordered type names; empty on partial records
    pub types: Vec<String>,
    /// Named base stats; empty on partial records
    pub stats: Vec<StatValue>,
    /// Ability names
    pub abilities: Vec<String>,
    /// Species endpoint, source for the enrichment fields below
    pub species_url: Option<String>,
    /// Flavor-text description from the species payload
    pub description: Option<String>,
    /// Species names along the evolution chain, in order
    pub evolution_chain: Vec<String>,
    /// Unix milliseconds of the last successful write
    pub cached_at: i64,
}

impl PokemonRecord {
    // == Partial Constructor ==
    /// Creates a partial record from a catalog list entry.
    pub fn partial(id: u32, name: impl Into<String>, source_url: impl Into<String>, now_ms: i64) -> Self {
        Self {
            id,
            name: name.into(),
            source_url: source_url.into(),
            sprites: None,
            types: Vec::new(),
            stats: Vec::new(),
            abilities: Vec::new(),
            species_url: None,
            description: None,
            evolution_chain: Vec::new(),
            cached_at: now_ms,
        }
    }

    // == From API Payload ==
    /// Builds a full record from a `GET /pokemon/{id_or_name}` payload.
    ///
    /// A payload without an id or name is malformed and surfaces as a
    /// transient API error, not as a stored record.
    pub fn from_api_payload(payload: &Value, now_ms: i64) -> Result<Self> {
        let id = payload
            .get("id")
            .and_then(Value::as_u64)
            .ok_or_else(|| CacheError::Api("entity payload missing 'id'".to_string()))?
            as u32;
        let name = payload
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| CacheError::Api("entity payload missing 'name'".to_string()))?
            .to_lowercase();

        let sprites = payload.get("sprites").map(parse_sprites);

        let types = payload
            .get("types")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|t| t.pointer("/type/name")?.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        let stats = payload
            .get("stats")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|s| {
                        Some(StatValue {
                            name: s.pointer("/stat/name")?.as_str()?.to_string(),
                            base: s.get("base_stat")?.as_u64()? as u32,
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        let abilities = payload
            .get("abilities")
            .and_then(Value::as_array)
            .map(|entries| {
                entries
                    .iter()
                    .filter_map(|a| a.pointer("/ability/name")?.as_str().map(str::to_string))
                    .collect()
            })
            .unwrap_or_default();

        let species_url = payload
            .pointer("/species/url")
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Self {
            source_url: format!("https://pokeapi.co/api/v2/pokemon/{}/", id),
            id,
            name,
            sprites,
            types,
            stats,
            abilities,
            species_url,
            description: None,
            evolution_chain: Vec::new(),
            cached_at: now_ms,
        })
    }

    // == Completeness ==
    /// True once the record carries the full display/gameplay fields.
    pub fn is_full(&self) -> bool {
        self.sprites.is_some() && !self.types.is_empty() && !self.stats.is_empty()
    }

    // == Freshness ==
    /// True while the record's age is strictly below `ttl_ms`.
    pub fn is_fresh(&self, now_ms: i64, ttl_ms: i64) -> bool {
        now_ms - self.cached_at < ttl_ms
    }

    /// A record satisfies a cache hit only when both full and fresh.
    /// Absent, partial, and stale all look identical to callers.
    pub fn is_valid(&self, now_ms: i64, ttl_ms: i64) -> bool {
        self.is_full() && self.is_fresh(now_ms, ttl_ms)
    }
}

fn parse_sprites(sprites: &Value) -> SpriteSet {
    let text = |v: &Value, pointer: &str| v.pointer(pointer)?.as_str().map(str::to_string);
    SpriteSet {
        front_default: text(sprites, "/front_default"),
        back_default: text(sprites, "/back_default"),
        front_shiny: text(sprites, "/front_shiny"),
        official_artwork: text(sprites, "/other/official-artwork/front_default"),
    }
}

/// Flattens an evolution-chain payload's nested
/// `chain.species.name` / `evolves_to[]` tree into an ordered name list.
pub fn flatten_evolution_chain(payload: &Value) -> Vec<String> {
    let mut names = Vec::new();
    if let Some(chain) = payload.get("chain") {
        collect_chain(chain, &mut names);
    }
    names
}

fn collect_chain(node: &Value, names: &mut Vec<String>) {
    if let Some(name) = node.pointer("/species/name").and_then(Value::as_str) {
        names.push(name.to_string());
    }
    if let Some(children) = node.get("evolves_to").and_then(Value::as_array) {
        for child in children {
            collect_chain(child, names);
        }
    }
}
