//! Filter Category Module
//!
//! Maps filter-key categories onto their API endpoints.

use crate::error::{CacheError, Result};

// == Filter Category ==
/// The taxonomy dimensions the filter cache knows how to resolve.
///
/// A category without a subcategory enumerates all values ("every type");
/// with a subcategory it lists the entities associated with one value
/// ("every Pokémon of type fire").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterCategory {
    Type,
    Ability,
    Region,
}

impl FilterCategory {
    /// Resolves the category segment of a filter key. An unknown category
    /// has no endpoint mapping and is a fatal error for the call.
    pub fn parse(segment: &str) -> Result<Self> {
        match segment {
            "type" => Ok(Self::Type),
            "ability" => Ok(Self::Ability),
            "region" => Ok(Self::Region),
            other => Err(CacheError::UnknownCategory(other.to_string())),
        }
    }

    /// Path segment of the category's base endpoint.
    pub fn path(self) -> &'static str {
        match self {
            Self::Type => "type",
            Self::Ability => "ability",
            Self::Region => "region",
        }
    }

    /// Query string for the unqualified enumeration endpoint. Dropped when
    /// a subcategory path segment is appended; it only applies to the base
    /// listing.
    pub fn list_query(self) -> &'static str {
        "?limit=1000&offset=0"
    }

    /// Builds the URL for this category, with or without a subcategory.
    pub fn url(self, base_url: &str, subcategory: Option<&str>) -> String {
        match subcategory {
            Some(sub) => format!("{}/{}/{}", base_url, self.path(), sub),
            None => format!("{}/{}{}", base_url, self.path(), self.list_query()),
        }
    }
}
