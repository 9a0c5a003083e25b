//! Expired-Session Sweep
//!
//! Background task that periodically removes sessions older than the max
//! session lifetime. Idle sessions need no sweep; the backend expires them.

use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::session::StoreFactory;

/// Spawns a background task that removes expired sessions every interval.
///
/// Each run opens its own store and closes it afterwards.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
///
/// # Example
/// ```ignore
/// let factory = StoreFactory::from_config(config.session.clone());
/// let sweep_handle = spawn_sweep_task(factory, 60);
/// // Later, during shutdown:
/// sweep_handle.abort();
/// ```
pub fn spawn_sweep_task(factory: StoreFactory, interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting expired-session sweep with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let mut store = factory.open();
            let result = store.remove_expired().await;
            factory.finish(store).await;

            match result {
                Ok(0) => debug!("Session sweep: no expired sessions found"),
                Ok(removed) => info!("Session sweep: removed {} expired sessions", removed),
                Err(e) => warn!(error = %e, "Session sweep failed"),
            }
        }
    })
}
