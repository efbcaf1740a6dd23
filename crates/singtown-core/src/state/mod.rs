use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::Mutex;
use tracing::{debug, info};

use singtown_model::{Annotation, LogEntry, Metric, Task, TaskStatus, TaskUpdate};
use singtown_transport::Transport;

use crate::error::ClientError;

/// Client-side mirror of one remote task plus the channel it is reached through.
///
/// Every outbound call goes through the request lock, so background uploads and
/// foreground calls never overlap on the wire. The mirror is replaced only after
/// the service accepted the update it reflects.
pub struct TaskState {
    task_id: String,
    transport: Arc<dyn Transport>,
    requests: Mutex<()>,
    task: RwLock<Task>,
    logs: RwLock<Vec<LogEntry>>,
}

impl TaskState {
    /// Fetch the task once and start mirroring it.
    pub async fn load(
        transport: Arc<dyn Transport>,
        task_id: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let task_id = task_id.into();
        let task = transport.get_task(&task_id).await?;
        debug!(target: "singtown.core.state", %task_id, status = %task.status, "task loaded");

        Ok(Self {
            task_id,
            transport,
            requests: Mutex::new(()),
            task: RwLock::new(task),
            logs: RwLock::new(Vec::new()),
        })
    }

    pub fn task_id(&self) -> &str {
        &self.task_id
    }

    /// Snapshot of the mirrored task.
    pub fn task(&self) -> Task {
        self.task.read().clone()
    }

    pub fn status(&self) -> TaskStatus {
        self.task.read().status
    }

    /// Log entries uploaded through this state, oldest first.
    pub fn logs(&self) -> Vec<LogEntry> {
        self.logs.read().clone()
    }

    /// Send `update` and fold it into the mirror once the service accepted it.
    ///
    /// A status change the lifecycle does not allow is rejected before any
    /// request is made.
    pub async fn apply(&self, update: TaskUpdate) -> Result<(), ClientError> {
        let _guard = self.requests.lock().await;

        if let Some(next) = update.status {
            let from = self.status();
            if !from.can_transition_to(next) {
                return Err(ClientError::InvalidTransition { from, to: next });
            }
        }

        self.transport.update_task(&self.task_id, &update).await?;

        let mut task = self.task.write();
        let next = update.apply_to(&task);
        *task = next;
        Ok(())
    }

    pub async fn set_status(&self, status: TaskStatus) -> Result<(), ClientError> {
        self.apply(TaskUpdate::status(status)).await?;
        info!(target: "singtown.core.state", task_id = %self.task_id, %status, "status updated");
        Ok(())
    }

    /// Replace the remote metrics list.
    pub async fn set_metrics(&self, metrics: Vec<Metric>) -> Result<(), ClientError> {
        let rows = metrics.len();
        self.apply(TaskUpdate::metrics(metrics)).await?;
        debug!(target: "singtown.core.state", task_id = %self.task_id, rows, "metrics uploaded");
        Ok(())
    }

    /// Upload `content` as one log entry stamped now.
    pub async fn append_log(&self, content: String) -> Result<LogEntry, ClientError> {
        let entry = LogEntry::now(content);
        {
            let _guard = self.requests.lock().await;
            self.transport.post_log(&self.task_id, &entry).await?;
        }
        self.logs.write().push(entry.clone());
        Ok(entry)
    }

    pub async fn get_dataset(&self) -> Result<Vec<Annotation>, ClientError> {
        let _guard = self.requests.lock().await;
        Ok(self.transport.get_dataset(&self.task_id).await?)
    }

    pub async fn upload_result(
        &self,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<(), ClientError> {
        let _guard = self.requests.lock().await;
        self.transport
            .upload_result(&self.task_id, file_name, content)
            .await?;
        Ok(())
    }

    /// Fetch an artifact or image by URL.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, ClientError> {
        let _guard = self.requests.lock().await;
        Ok(self.transport.fetch(url).await?)
    }
}
