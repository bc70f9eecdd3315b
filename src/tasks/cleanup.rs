//! Expiry Sweep Task
//!
//! Background task that periodically removes expired entries from every tier.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::cache::SharedTier;

/// Spawns a background task that periodically purges expired entries.
///
/// The task loops forever, sleeping for the given interval between sweeps.
/// Each tier is purged on the blocking pool since the disk tier deletes
/// files and rewrites its index.
///
/// # Arguments
/// * `tiers` - Handles of the tiers to sweep
/// * `cleanup_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let handle = spawn_cleanup_task(state.tiers(), 60);
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_cleanup_task(tiers: Vec<SharedTier>, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs);

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep with interval of {} seconds",
            cleanup_interval_secs
        );

        loop {
            tokio::time::sleep(interval).await;

            for tier in &tiers {
                let store = tier.clone();
                let removed = match tokio::task::spawn_blocking(move || {
                    let removed = store.purge_expired();
                    (store.stats().tier, removed)
                })
                .await
                {
                    Ok(result) => result,
                    Err(e) => {
                        warn!("Expiry sweep task failed: {}", e);
                        continue;
                    }
                };

                match removed {
                    (tier, n) if n > 0 => info!(%tier, "Expiry sweep: removed {} entries", n),
                    (tier, _) => debug!(%tier, "Expiry sweep: no expired entries found"),
                }
            }
        }
    })
}
