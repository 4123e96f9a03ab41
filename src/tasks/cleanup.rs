//! Expiry Sweep Task
//!
//! Background task that periodically drops expired entries from the
//! in-process store. Reads already treat expired entries as absent; the
//! sweep only reclaims their memory.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::MemoryStore;

/// Spawns a background task that periodically sweeps expired entries.
///
/// # Arguments
/// * `store` - Shared in-process store
/// * `cleanup_interval_secs` - Interval in seconds between sweeps
///
/// # Returns
/// A JoinHandle for the spawned task, aborted during graceful shutdown.
pub fn spawn_cleanup_task(store: Arc<MemoryStore>, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expiry sweep with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.cleanup_expired().await;

            if removed > 0 {
                info!("Expiry sweep: removed {} expired entries", removed);
            } else {
                debug!("Expiry sweep: no expired entries found");
            }
        }
    })
}
