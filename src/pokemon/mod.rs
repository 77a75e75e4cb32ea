//! Pokémon Cache Module
//!
//! The authoritative client-side view of the entity catalog: partial/full
//! record promotion, freshness checks, API fetches, and the background
//! full-catalog preload.

mod cache;
mod record;
mod retry;

pub use cache::PokemonCache;
pub use record::{flatten_evolution_chain, PokemonRecord, SpriteSet, StatValue};
pub use retry::BaseFormRetry;
