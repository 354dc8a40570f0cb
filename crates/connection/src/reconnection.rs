//! Retry timer for the reconnect policy.
//!
//! A [`RetryTimer`] is a one-shot task that sleeps for the policy delay and
//! then asks the manager to connect again. Dropping or cancelling the timer
//! guarantees the callback never runs.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::manager::Shared;

/// Handle to a pending reconnect.
pub(crate) struct RetryTimer {
    /// Distinguishes this timer from any earlier, already cancelled one.
    pub(crate) id: u64,
    pub(crate) attempt: u32,
    cancel: CancellationToken,
}

impl RetryTimer {
    /// Spawns the timer task. Must be called from within a Tokio runtime.
    pub(crate) fn schedule(shared: &Arc<Shared>, id: u64, attempt: u32, delay: Duration) -> Self {
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let shared = shared.clone();
        tokio::spawn(async move {
            tokio::select! {
                biased;
                _ = token.cancelled() => {
                    debug!(timer = id, "retry timer cancelled");
                }
                _ = tokio::time::sleep(delay) => {
                    shared.retry_fired(id);
                }
            }
        });
        Self { id, attempt, cancel }
    }

    pub(crate) fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Drop for RetryTimer {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
