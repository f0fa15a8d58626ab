//! Fixed-rate background task scheduling.
//!
//! All periodic work in the node (TTL sweep, heartbeat send, peer timeout
//! sweep) runs through `FixedRateTask` so every background loop has the same
//! lifecycle: spawn with an initial delay and period, cancel on shutdown.

use std::time::Duration;

use tokio::task::JoinHandle;

/// A periodic task running on the tokio runtime.
///
/// The tick callback is synchronous; work that needs to suspend (e.g. peer
/// HTTP calls) is expected to `tokio::spawn` from inside the tick.
/// The task is aborted on `cancel()` or when the handle is dropped.
pub struct FixedRateTask {
    handle: JoinHandle<()>,
}

impl FixedRateTask {
    /// Spawns `tick` to run every `period`, first firing after `initial_delay`.
    pub fn spawn<F>(initial_delay: Duration, period: Duration, mut tick: F) -> Self
    where
        F: FnMut() + Send + 'static,
    {
        let start = tokio::time::Instant::now() + initial_delay;
        let handle = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(start, period);
            loop {
                interval.tick().await;
                tick();
            }
        });
        Self { handle }
    }

    pub fn cancel(&self) {
        self.handle.abort();
    }
}

impl Drop for FixedRateTask {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
