//! Background sweep of expired in-memory sessions.
//!
//! Redis drops expired sessions on its own via key TTLs. The memory backend
//! stops resolving expired sessions immediately but only frees them when
//! this job runs.

use crate::storage::MemorySessionStore;
use std::sync::Arc;
use std::time::Duration;

/// Run the sweep loop.
///
/// Removes expired sessions from `store` every `interval`. Never returns;
/// spawn it as a task.
pub async fn run_session_sweep(store: Arc<MemorySessionStore>, interval: Duration) {
    let mut ticker = tokio::time::interval(interval);
    // The first tick completes immediately
    ticker.tick().await;

    loop {
        ticker.tick().await;
        sweep_once(&store);
    }
}

/// Purge expired sessions once and log how many were removed.
fn sweep_once(store: &MemorySessionStore) -> usize {
    let removed = store.purge_expired();
    if removed > 0 {
        tracing::info!(
            action = "sessions_swept",
            removed = removed,
            remaining = store.len(),
            "Session sweep completed"
        );
    }
    removed
}
