//! API Client Module
//!
//! `PokeApi` is the seam the caches talk through; `HttpPokeApi` is the
//! reqwest-backed production implementation. A 404 from the API maps to
//! `CacheError::NotFound`; every other failure is a transient
//! `CacheError::Api`.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::api::NamedResource;
use crate::error::{CacheError, Result};

// == PokeApi Trait ==
/// Asynchronous client for the Pokémon REST API.
#[async_trait]
pub trait PokeApi: Send + Sync {
    /// Fetches the canonical name/URL list of the catalog.
    ///
    /// `GET /pokemon?limit={limit}&offset={offset}` → `results` array.
    async fn list_pokemon(&self, limit: u32, offset: u32) -> Result<Vec<NamedResource>>;

    /// Fetches the full entity payload by numeric id or lowercase name.
    ///
    /// `GET /pokemon/{id_or_name}`
    async fn get_pokemon(&self, id_or_name: &str) -> Result<Value>;

    /// Fetches an arbitrary API URL as JSON.
    ///
    /// Used for species, evolution-chain, and filter endpoints, whose URLs
    /// arrive embedded in other payloads.
    async fn get_json(&self, url: &str) -> Result<Value>;
}

// == HTTP Client ==
/// Production implementation on a shared `reqwest::Client`.
pub struct HttpPokeApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPokeApi {
    /// Creates a client rooted at the given API base URL (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    /// Performs one GET, classifying the outcome per the error taxonomy.
    async fn fetch(&self, url: &str) -> Result<Value> {
        debug!(url, "api request");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| CacheError::Api(e.to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(CacheError::NotFound(url.to_string()));
        }

        let response = response
            .error_for_status()
            .map_err(|e| CacheError::Api(e.to_string()))?;

        response
            .json::<Value>()
            .await
            .map_err(|e| CacheError::Api(e.to_string()))
    }
}

#[async_trait]
impl PokeApi for HttpPokeApi {
    async fn list_pokemon(&self, limit: u32, offset: u32) -> Result<Vec<NamedResource>> {
        let url = format!("{}/pokemon?limit={}&offset={}", self.base_url, limit, offset);
        let payload = self.fetch(&url).await?;

        let results = payload
            .get("results")
            .and_then(Value::as_array)
            .ok_or_else(|| CacheError::Api("list payload missing 'results'".to_string()))?;

        Ok(results
            .iter()
            .filter_map(|entry| {
                let name = entry.get("name")?.as_str()?;
                let url = entry.get("url")?.as_str()?;
                Some(NamedResource::new(name, url))
            })
            .collect())
    }

    async fn get_pokemon(&self, id_or_name: &str) -> Result<Value> {
        let url = format!("{}/pokemon/{}", self.base_url, id_or_name);
        self.fetch(&url).await
    }

    async fn get_json(&self, url: &str) -> Result<Value> {
        self.fetch(url).await
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Trait-object construction must work for the cache layers.
    #[test]
    fn test_client_is_object_safe() {
        let api = HttpPokeApi::new("https://pokeapi.co/api/v2");
        let _boxed: Box<dyn PokeApi> = Box::new(api);
    }

    #[test]
    fn test_results_extraction_shape() {
        // Mirrors the filter_map in list_pokemon: malformed rows are skipped
        let payload = json!({
            "results": [
                {"name": "bulbasaur", "url": "https://pokeapi.co/api/v2/pokemon/1/"},
                {"name": "missing-url"},
                {"name": "pikachu", "url": "https://pokeapi.co/api/v2/pokemon/25/"},
            ]
        });

        let results: Vec<NamedResource> = payload["results"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|entry| {
                let name = entry.get("name")?.as_str()?;
                let url = entry.get("url")?.as_str()?;
                Some(NamedResource::new(name, url))
            })
            .collect();

        assert_eq!(results.len(), 2);
        assert_eq!(results[1].id(), Some(25));
    }
}
