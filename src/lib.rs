//! dexcache - Client-side caching and request-governance core
//!
//! Sits between application services and two external data sources: the
//! public Pokémon REST API and a document database. Provides a durable
//! entity cache with partial/full record promotion, taxonomy filter
//! caching, windowed request de-duplication, and a governed gateway for
//! all document-database calls.

pub mod api;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod filter;
pub mod gateway;
pub mod pokemon;
pub mod store;
pub mod tasks;

pub use api::{HttpPokeApi, NamedResource, PokeApi};
pub use cache::{KeyedResultCache, RateLimiter};
pub use clock::{system_clock, Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{CacheError, Result};
pub use filter::FilterCache;
pub use gateway::{CallContext, ExecuteOptions, FirestoreGateway, FirestoreOp};
pub use pokemon::{PokemonCache, PokemonRecord};
pub use store::{EntityStore, Partition};
