//! Expiry Sweep Task
//!
//! Background task that periodically drops expired in-memory cache and
//! rate-limiter entries, replacing the per-entry eviction timers of a
//! looser runtime with one deterministic sweep.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::gateway::FirestoreGateway;

/// Spawns a task that sweeps the gateway's expired entries at a fixed
/// interval.
///
/// # Arguments
/// * `gateway` - shared gateway whose caches are swept
/// * `interval_secs` - seconds between sweep runs
///
/// # Returns
/// A JoinHandle that can be used to abort the task during shutdown.
pub fn spawn_sweep_task(gateway: Arc<FirestoreGateway>, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs);

    tokio::spawn(async move {
        info!(interval_secs, "starting expiry sweep task");

        loop {
            tokio::time::sleep(interval).await;

            let removed = gateway.purge_expired();
            if removed > 0 {
                info!(removed, "expiry sweep removed entries");
            } else {
                debug!("expiry sweep found nothing to remove");
            }
        }
    })
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::system_clock;
    use crate::config::Config;
    use crate::store::EntityStore;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_sweep_task_can_be_aborted() {
        let file = NamedTempFile::new().unwrap();
        let store = Arc::new(EntityStore::open(file.path()).unwrap());
        let gateway = Arc::new(FirestoreGateway::new(store, system_clock(), &Config::default()));

        let handle = spawn_sweep_task(gateway, 1);
        handle.abort();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(handle.is_finished());
    }
}
