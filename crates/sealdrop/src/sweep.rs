//! Background expiry sweep.
//!
//! Reclaims Pending transfers that outlived their deadline. Only
//! meaningful when the coordinator is configured with a `pending_ttl`;
//! without one, no record ever carries an expiry time and the sweep
//! finds nothing.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use sealdrop_store::{KeyRegistry, TransferStore};

use crate::coordinator::TransferCoordinator;

/// Spawn a task that expires stale transfers every `interval`.
///
/// The task runs until its handle is aborted or the runtime shuts down.
/// Sweep errors are logged and the loop continues; a transient database
/// failure does not kill expiry.
pub fn spawn_expiry_sweep<S>(
    coordinator: Arc<TransferCoordinator<S>>,
    interval: Duration,
) -> JoinHandle<()>
where
    S: KeyRegistry + TransferStore + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; skip it so a fresh start
        // does not race application setup.
        ticker.tick().await;

        loop {
            ticker.tick().await;
            match coordinator.expire_stale().await {
                Ok(expired) if !expired.is_empty() => {
                    info!(count = expired.len(), "expired stale transfers");
                }
                Ok(_) => {}
                Err(err) => {
                    warn!(%err, "expiry sweep failed");
                }
            }
        }
    })
}
