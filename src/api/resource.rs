//! Named Resource Module
//!
//! The `{name, url}` pair the API uses for every list entry, and the shape
//! all filter lookups are normalized to.

use serde::{Deserialize, Serialize};

// == Named Resource ==
/// A named entity plus the URL of its detail payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    /// Lowercase entity name
    pub name: String,
    /// Detail endpoint for the entity
    pub url: String,
}

impl NamedResource {
    /// Creates a new NamedResource.
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }

    /// The numeric id encoded in this resource's URL, if any.
    pub fn id(&self) -> Option<u32> {
        id_from_url(&self.url)
    }
}

// == Id From Url ==
/// Parses the numeric id out of a detail URL's trailing path segment.
///
/// List ordering from the API is not guaranteed to be contiguous or to start
/// at 1, so ids must come from here and never from list position.
///
/// `https://pokeapi.co/api/v2/pokemon/25/` → `Some(25)`
pub fn id_from_url(url: &str) -> Option<u32> {
    url.trim_end_matches('/')
        .rsplit('/')
        .next()
        .and_then(|segment| segment.parse().ok())
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_from_url_trailing_slash() {
        assert_eq!(id_from_url("https://pokeapi.co/api/v2/pokemon/25/"), Some(25));
    }

    #[test]
    fn test_id_from_url_no_trailing_slash() {
        assert_eq!(id_from_url("https://pokeapi.co/api/v2/pokemon/1302"), Some(1302));
    }

    #[test]
    fn test_id_from_url_non_numeric() {
        assert_eq!(id_from_url("https://pokeapi.co/api/v2/pokemon/pikachu/"), None);
        assert_eq!(id_from_url(""), None);
    }

    #[test]
    fn test_resource_id() {
        let res = NamedResource::new("pikachu", "https://pokeapi.co/api/v2/pokemon/25/");
        assert_eq!(res.id(), Some(25));
    }

    #[test]
    fn test_resource_serde_roundtrip() {
        let res = NamedResource::new("fire", "https://pokeapi.co/api/v2/type/10/");
        let json = serde_json::to_string(&res).unwrap();
        let back: NamedResource = serde_json::from_str(&json).unwrap();
        assert_eq!(back, res);
    }
}
