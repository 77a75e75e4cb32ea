//! Catalog Preload Task
//!
//! One-shot background task that populates full records for the entire
//! known catalog without blocking the caller that scheduled it.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::pokemon::PokemonCache;

/// Spawns the full-catalog preload in the background.
///
/// The preload itself runs in fixed-size batches (see
/// [`PokemonCache::preload_all_known`]); this wrapper only detaches it from
/// the scheduling caller and logs its outcome. There is no cancellation:
/// teardown simply abandons the task.
pub fn spawn_preload_task(cache: Arc<PokemonCache>) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("starting background catalog preload");
        match cache.preload_all_known().await {
            Ok(()) => info!("background catalog preload finished"),
            Err(err) => error!(error = %err, "background catalog preload aborted"),
        }
    })
}
