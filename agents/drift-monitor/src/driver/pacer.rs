//! Cancellable pause between batches

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

/// Cooperative cancellation token shared between the driver and its owner
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    inner: Arc<TokenState>,
}

#[derive(Debug, Default)]
struct TokenState {
    cancelled: AtomicBool,
    notify: Notify,
}

impl CancellationToken {
    /// Create a new token (not cancelled)
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation and wake every waiter
    pub fn cancel(&self) {
        self.inner.cancelled.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Resolve once cancellation has been requested
    pub async fn cancelled(&self) {
        loop {
            // register before checking the flag so a concurrent cancel is not lost
            let notified = self.inner.notify.notified();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// How a pause ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PauseOutcome {
    Elapsed,
    Cancelled,
}

/// Fixed delay between batches
#[derive(Debug, Clone, Copy)]
pub struct BatchPacer {
    interval: Duration,
}

impl BatchPacer {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleep for the interval unless `token` is cancelled first
    pub async fn pause(&self, token: &CancellationToken) -> PauseOutcome {
        if token.is_cancelled() {
            return PauseOutcome::Cancelled;
        }
        tokio::select! {
            _ = tokio::time::sleep(self.interval) => PauseOutcome::Elapsed,
            _ = token.cancelled() => PauseOutcome::Cancelled,
        }
    }
}
