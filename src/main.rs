//! dexcache - Client-side caching and request-governance core
//!
//! Demo binary: opens the shared store, builds the caches, and looks up
//! the Pokémon named on the command line.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use dexcache::{Config, EntityStore, HttpPokeApi, PokemonCache};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber with env filter
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dexcache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();
    info!(
        db_path = %config.db_path,
        api = %config.api_base_url,
        catalog_size = config.catalog_size,
        "configuration loaded"
    );

    let store = EntityStore::open_shared(&config.db_path)
        .await
        .context("opening entity store")?;
    let api = Arc::new(HttpPokeApi::new(config.api_base_url.clone()));
    let cache = Arc::new(PokemonCache::new(
        store,
        api,
        dexcache::system_clock(),
        &config,
    )?);

    let query = std::env::args().nth(1).unwrap_or_else(|| "pikachu".to_string());

    match cache.fetch_details(&query).await? {
        Some(record) => {
            println!("#{} {}", record.id, record.name);
            println!("  types: {}", record.types.join(", "));
            for stat in &record.stats {
                println!("  {}: {}", stat.name, stat.base);
            }
            if let Some(description) = &record.description {
                println!("  {}", description);
            }
            if !record.evolution_chain.is_empty() {
                println!("  evolution: {}", record.evolution_chain.join(" -> "));
            }
        }
        None => println!("no data for '{}'", query),
    }

    Ok(())
}
