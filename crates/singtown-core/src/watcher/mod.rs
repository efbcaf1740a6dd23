use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, trace};

use crate::error::ClientError;

/// One upload cycle run by the [`Watcher`].
#[async_trait]
pub trait Flush: Send + Sync + 'static {
    async fn flush(&self) -> Result<(), ClientError>;
}

/// Shared slot holding the error that ended a background schedule.
pub type ErrorSlot = Arc<Mutex<Option<Arc<ClientError>>>>;

/// Background schedule that flushes every `interval`.
///
/// The period is the interval plus the time a cycle takes: the next sleep
/// starts only after the previous cycle returned. Dropping the watcher
/// cancels the schedule without waiting for it.
pub struct Watcher {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
    last_error: ErrorSlot,
}

impl Watcher {
    /// Run one cycle now, then keep flushing in the background.
    ///
    /// An error from the first cycle is returned and nothing is spawned.
    pub async fn start<F: Flush>(
        target: Arc<F>,
        interval: Duration,
        last_error: ErrorSlot,
    ) -> Result<Self, ClientError> {
        target.flush().await?;

        let token = CancellationToken::new();
        let handle = tokio::spawn(run(target, interval, token.clone(), last_error.clone()));
        debug!(target: "singtown.core.watcher", interval_ms = interval.as_millis() as u64, "watcher started");

        Ok(Self {
            token,
            handle: Some(handle),
            last_error,
        })
    }

    /// Prevent further cycles. A cycle already running completes.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Wait for the background task to end.
    pub async fn stopped(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        if let Err(e) = handle.await {
            if e.is_panic() {
                error!(target: "singtown.core.watcher", "watcher task panicked");
            }
        }
    }

    /// Cancel and wait until no cycle is in flight.
    pub async fn stop(mut self) {
        self.cancel();
        self.stopped().await;
        debug!(target: "singtown.core.watcher", "watcher stopped");
    }

    /// Error that ended the background schedule, if any.
    pub fn last_error(&self) -> Option<Arc<ClientError>> {
        self.last_error.lock().clone()
    }
}

impl Drop for Watcher {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

async fn run<F: Flush>(
    target: Arc<F>,
    interval: Duration,
    token: CancellationToken,
    slot: ErrorSlot,
) {
    loop {
        tokio::select! {
            biased;
            _ = token.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
        if token.is_cancelled() {
            break;
        }

        trace!(target: "singtown.core.watcher", "tick");
        if let Err(e) = target.flush().await {
            error!(target: "singtown.core.watcher", error = %e, "background flush failed, watcher stopped");
            *slot.lock() = Some(Arc::new(e));
            break;
        }
    }
}
