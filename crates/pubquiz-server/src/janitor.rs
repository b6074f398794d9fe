//! Periodic sweep removing ended sessions.

use std::time::Duration;

use crate::server::SharedState;

/// Spawn the background sweep. Runs on a fixed cadence for the life of
/// the process, decoupled from the request path.
pub fn spawn(state: SharedState, period: Duration) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // An interval's first tick fires immediately; skip it.
        interval.tick().await;
        loop {
            interval.tick().await;
            let evicted = state.registry.evict_ended().await;
            if evicted > 0 {
                tracing::info!(evicted, "removed ended sessions");
            }
        }
    })
}
