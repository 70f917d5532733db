//! Expiry Sweep Task
//!
//! Expired entries are already invisible to readers; this task only
//! reclaims their memory between writes.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::SharedCache;

/// Spawns a background task that periodically removes expired entries.
///
/// Returns the task handle so the caller can abort it on shutdown.
///
/// # Example
/// ```ignore
/// let cache = Arc::new(SharedCache::<String>::new(1000, Duration::from_secs(300))?);
/// let handle = spawn_cleanup_task(Arc::clone(&cache), Duration::from_secs(60));
/// // Later, during shutdown:
/// handle.abort();
/// ```
pub fn spawn_cleanup_task<V>(cache: Arc<SharedCache<V>>, interval: Duration) -> JoinHandle<()>
where
    V: Clone + Send + 'static,
{
    tokio::spawn(async move {
        info!(interval_secs = interval.as_secs(), "Starting cache expiry sweep");

        loop {
            tokio::time::sleep(interval).await;

            let removed = cache.cleanup_expired();
            if removed > 0 {
                info!(removed, "Expiry sweep removed entries");
            } else {
                debug!("Expiry sweep: nothing to remove");
            }
        }
    })
}
