use async_trait::async_trait;
use singtown_model::{Annotation, LogEntry, Task, TaskUpdate};

use crate::errors::TransportError;

/// Request surface of the task service consumed by the client.
///
/// Implementations perform one remote call per method and report every
/// non-success answer as an error; they do not retry and keep no client state.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    /// Fetch the task resource.
    async fn get_task(&self, task_id: &str) -> Result<Task, TransportError>;

    /// Apply a partial update (status and/or metrics) to the task.
    async fn update_task(&self, task_id: &str, update: &TaskUpdate) -> Result<(), TransportError>;

    /// List the annotations of the task's dataset.
    async fn get_dataset(&self, task_id: &str) -> Result<Vec<Annotation>, TransportError>;

    /// Append one log entry to the task.
    async fn post_log(&self, task_id: &str, entry: &LogEntry) -> Result<(), TransportError>;

    /// Upload a result archive.
    async fn upload_result(
        &self,
        task_id: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<(), TransportError>;

    /// Download an arbitrary resource (trained model, dataset image).
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError>;
}
