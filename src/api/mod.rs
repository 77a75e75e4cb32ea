//! External API Module
//!
//! Trait seam and HTTP client for the Pokémon REST API.

mod client;
mod resource;

pub use client::{HttpPokeApi, PokeApi};
pub use resource::{id_from_url, NamedResource};
