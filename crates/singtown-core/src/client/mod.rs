mod artifacts;

use std::{fmt::Display, future::Future, panic::AssertUnwindSafe, sync::Arc};

use async_trait::async_trait;
use futures::FutureExt;
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use singtown_model::{Annotation, LogEntry, Metric, Task, TaskStatus};
use singtown_transport::{HttpTransport, Transport};

use crate::{
    buffer::{LogBuffer, LogWriter},
    config::ClientConfig,
    error::ClientError,
    metrics::MetricsSource,
    session::{Session, panic_message},
    state::TaskState,
    watcher::{ErrorSlot, Flush},
};

/// Handle to one remote task.
///
/// Cheap to clone; clones share the task mirror, the log buffer and the
/// request lock.
#[derive(Clone)]
pub struct Client {
    pub(crate) shared: Arc<Shared>,
}

pub(crate) struct Shared {
    config: ClientConfig,
    pub(crate) state: TaskState,
    buffer: LogBuffer,
    /// Held for a whole flush cycle.
    cycle: tokio::sync::Mutex<Option<MetricsSource>>,
    pub(crate) watcher_error: ErrorSlot,
}

impl Client {
    /// Connect to the service described by `config` and fetch the task.
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        let transport = HttpTransport::new(config.host.clone(), config.token.clone());
        info!(target: "singtown.core.client", host = %transport.host(), task_id = %config.task_id, "connecting");
        Self::with_transport(config, Arc::new(transport)).await
    }

    /// Use an explicit transport, e.g. a [`LocalTransport`](singtown_transport::LocalTransport).
    pub async fn with_transport(
        config: ClientConfig,
        transport: Arc<dyn Transport>,
    ) -> Result<Self, ClientError> {
        let state = TaskState::load(transport, config.task_id.clone()).await?;
        let metrics = config.metrics_file.clone().and_then(MetricsSource::new);

        Ok(Self {
            shared: Arc::new(Shared {
                config,
                state,
                buffer: LogBuffer::new(),
                cycle: tokio::sync::Mutex::new(metrics),
                watcher_error: Arc::new(Mutex::new(None)),
            }),
        })
    }

    pub fn task_id(&self) -> &str {
        self.shared.state.task_id()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.shared.config
    }

    /// Snapshot of the task as last accepted by the service.
    pub fn task(&self) -> Task {
        self.shared.state.task()
    }

    pub fn status(&self) -> TaskStatus {
        self.shared.state.status()
    }

    /// Log entries uploaded so far.
    pub fn logs(&self) -> Vec<LogEntry> {
        self.shared.state.logs()
    }

    /// Queue `message` and a newline for the next upload.
    pub fn log(&self, message: &str) {
        self.shared.buffer.write_line(message);
    }

    pub fn log_with_end(&self, message: &str, end: &str) {
        self.shared.buffer.write(message, end);
    }

    pub fn log_buffer(&self) -> &LogBuffer {
        &self.shared.buffer
    }

    /// `io::Write` handle feeding the log buffer.
    pub fn log_writer(&self) -> LogWriter {
        self.shared.buffer.writer()
    }

    /// Run one upload cycle now.
    pub async fn flush(&self) -> Result<(), ClientError> {
        self.shared.flush().await
    }

    /// Replace the task metrics.
    pub async fn upload_metrics(&self, metrics: Vec<Metric>) -> Result<(), ClientError> {
        self.shared.state.set_metrics(metrics).await
    }

    pub async fn get_dataset(&self) -> Result<Vec<Annotation>, ClientError> {
        self.shared.state.get_dataset().await
    }

    /// Error that stopped the background uploads of the current session.
    pub fn last_watcher_error(&self) -> Option<Arc<ClientError>> {
        self.shared.watcher_error.lock().clone()
    }

    /// Mark the task RUNNING and start background uploads.
    pub async fn begin(&self) -> Result<Session, ClientError> {
        Session::begin(self.clone()).await
    }

    /// Run `body` inside a session.
    ///
    /// The task ends SUCCESS when `body` returns `Ok` and FAILED otherwise.
    /// The body's own error is returned unchanged; errors while closing the
    /// session are logged in that case. A panic marks the task FAILED and
    /// is resumed afterwards.
    pub async fn run<F, Fut, T, E>(&self, body: F) -> Result<T, E>
    where
        F: FnOnce(Client) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<ClientError> + Display,
    {
        let session = self.begin().await?;

        let result = match AssertUnwindSafe(body(self.clone())).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                if let Err(e) = session.close(Some(message)).await {
                    error!(target: "singtown.core.client", error = %e, "failed to close session after panic");
                }
                std::panic::resume_unwind(payload);
            }
        };

        let exit = session.finish(&result).await;
        match (result, exit) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(e)) => Err(e.into()),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(exit)) => {
                warn!(target: "singtown.core.client", error = %exit, "session close failed after task error");
                Err(e)
            }
        }
    }
}

impl Shared {
    /// A file that can't be read or parsed is skipped with a warning; the
    /// trainer may still be writing it.
    async fn flush_metrics(&self, source: &mut MetricsSource) -> Result<(), ClientError> {
        let pending = match source.poll().await {
            Ok(Some(pending)) => pending,
            Ok(None) => return Ok(()),
            Err(e) => {
                warn!(target: "singtown.core.client", path = %source.path().display(), error = %e, "metrics file skipped");
                return Ok(());
            }
        };
        self.state.set_metrics(pending.rows.clone()).await?;
        source.commit(pending);
        Ok(())
    }

    async fn flush_logs(&self) -> Result<(), ClientError> {
        let Some(content) = self.buffer.drain() else {
            return Ok(());
        };
        if let Err(e) = self.state.append_log(content.clone()).await {
            self.buffer.restore(content);
            return Err(e);
        }
        Ok(())
    }
}

#[async_trait]
impl Flush for Shared {
    /// Metrics first, then logs; both are attempted and the first error wins.
    async fn flush(&self) -> Result<(), ClientError> {
        let mut metrics = self.cycle.lock().await;

        let mut first = None;
        if let Some(source) = metrics.as_mut() {
            if let Err(e) = self.flush_metrics(source).await {
                debug!(target: "singtown.core.client", error = %e, "metrics upload failed");
                first = Some(e);
            }
        }
        if let Err(e) = self.flush_logs().await {
            debug!(target: "singtown.core.client", error = %e, "log upload failed");
            first.get_or_insert(e);
        }
        first.map_or(Ok(()), Err)
    }
}
