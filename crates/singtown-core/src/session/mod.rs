use std::{any::Any, fmt::Display};

use tracing::{debug, error, warn};

use singtown_model::TaskStatus;

use crate::{client::Client, error::ClientError, watcher::Watcher};

/// A running task: RUNNING was reported and background uploads are active.
///
/// Close it with [`Session::finish`] or [`Session::close`]. A session dropped
/// without being closed stops its uploads but reports no final status.
pub struct Session {
    client: Client,
    watcher: Option<Watcher>,
    finished: bool,
}

impl Session {
    pub(crate) async fn begin(client: Client) -> Result<Self, ClientError> {
        let shared = client.shared.clone();
        shared.state.set_status(TaskStatus::Running).await?;
        *shared.watcher_error.lock() = None;

        let interval = client.config().upload_interval;
        let slot = shared.watcher_error.clone();
        let watcher = match Watcher::start(shared.clone(), interval, slot).await {
            Ok(watcher) => watcher,
            Err(e) => {
                error!(target: "singtown.core.session", error = %e, "first upload failed");
                if let Err(status_err) = shared.state.set_status(TaskStatus::Failed).await {
                    warn!(target: "singtown.core.session", error = %status_err, "failed to report FAILED");
                }
                return Err(e);
            }
        };

        debug!(target: "singtown.core.session", task_id = %client.task_id(), "session started");
        Ok(Self {
            client,
            watcher: Some(watcher),
            finished: false,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Close according to `outcome`: SUCCESS for `Ok`, FAILED with the error logged otherwise.
    pub async fn finish<T, E: Display>(self, outcome: &Result<T, E>) -> Result<(), ClientError> {
        let failure = outcome.as_ref().err().map(ToString::to_string);
        self.close(failure).await
    }

    /// Stop uploads, write `failure` to the log, flush once more and report the final status.
    ///
    /// Every step runs even if an earlier one failed; the first error is returned.
    pub async fn close(mut self, failure: Option<String>) -> Result<(), ClientError> {
        self.finished = true;
        if let Some(watcher) = self.watcher.take() {
            watcher.stop().await;
        }

        if let Some(message) = &failure {
            self.client.log(&format!("Exception: {message}"));
        }

        let mut first = None;
        if let Err(e) = self.client.flush().await {
            warn!(target: "singtown.core.session", error = %e, "final upload failed");
            first = Some(e);
        }

        let status = match failure {
            Some(_) => TaskStatus::Failed,
            None => TaskStatus::Success,
        };
        if let Err(e) = self.client.shared.state.set_status(status).await {
            error!(target: "singtown.core.session", error = %e, %status, "failed to report final status");
            first.get_or_insert(e);
        }

        first.map_or(Ok(()), Err)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.finished {
            warn!(target: "singtown.core.session", task_id = %self.client.task_id(), "session dropped without finish");
        }
    }
}

/// Text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
