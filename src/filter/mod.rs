//! Filter Cache Module
//!
//! Taxonomy lookups (types, abilities, regions) with shape normalization
//! and a 24h freshness window.

mod cache;
mod category;

pub use cache::FilterCache;
pub use category::FilterCategory;
