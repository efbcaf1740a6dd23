use std::path::{Path, PathBuf};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tracing::debug;

use singtown_model::{Annotation, LogEntry, Task, TaskUpdate};

use crate::{errors::TransportError, transport::Transport, util::read_local};

/// Result archive received by a [`LocalTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedResult {
    pub file_name: String,
    pub size: usize,
}

/// Offline [`Transport`]: the task and dataset come from JSON files (or memory),
/// mutations are recorded instead of sent.
///
/// Used for dry runs against exported task definitions.
pub struct LocalTransport {
    task_path: Option<PathBuf>,
    dataset_source: DatasetSource,
    inner: Mutex<LocalState>,
}

enum DatasetSource {
    File(PathBuf),
    Memory(Vec<Annotation>),
}

#[derive(Default)]
struct LocalState {
    task: Option<Task>,
    updates: Vec<TaskUpdate>,
    logs: Vec<LogEntry>,
    results: Vec<UploadedResult>,
    fetched: Vec<String>,
}

impl LocalTransport {
    /// Serve `task` from memory with an empty dataset.
    pub fn new(task: Task) -> Self {
        Self {
            task_path: None,
            dataset_source: DatasetSource::Memory(Vec::new()),
            inner: Mutex::new(LocalState {
                task: Some(task),
                ..Default::default()
            }),
        }
    }

    /// Read the task (and optionally the dataset listing) from JSON files.
    ///
    /// Files are read lazily on the first request.
    pub fn from_files(task_path: impl Into<PathBuf>, dataset_path: Option<PathBuf>) -> Self {
        let dataset_source = match dataset_path {
            Some(path) => DatasetSource::File(path),
            None => DatasetSource::Memory(Vec::new()),
        };
        Self {
            task_path: Some(task_path.into()),
            dataset_source,
            inner: Mutex::new(LocalState::default()),
        }
    }

    pub fn with_dataset(mut self, dataset: Vec<Annotation>) -> Self {
        self.dataset_source = DatasetSource::Memory(dataset);
        self
    }

    /// Task updates received so far, in arrival order.
    pub fn updates(&self) -> Vec<TaskUpdate> {
        self.inner.lock().updates.clone()
    }

    /// Log entries received so far, in arrival order.
    pub fn logs(&self) -> Vec<LogEntry> {
        self.inner.lock().logs.clone()
    }

    pub fn results(&self) -> Vec<UploadedResult> {
        self.inner.lock().results.clone()
    }

    /// URLs passed to [`Transport::fetch`], in call order.
    pub fn fetched(&self) -> Vec<String> {
        self.inner.lock().fetched.clone()
    }

    /// Current state of the served task with all received updates applied.
    pub fn task(&self) -> Option<Task> {
        self.inner.lock().task.clone()
    }

    async fn load_task(&self) -> Result<Task, TransportError> {
        let cached = self.inner.lock().task.clone();
        if let Some(task) = cached {
            return Ok(task);
        }
        let Some(path) = &self.task_path else {
            return Err(TransportError::Decode {
                url: "memory".into(),
                reason: "no task loaded".into(),
            });
        };
        let task: Task = read_json(path).await?;
        debug!(target: "singtown.transport.local", path = %path.display(), "task loaded");

        let mut inner = self.inner.lock();
        Ok(inner.task.get_or_insert(task).clone())
    }
}

#[async_trait]
impl Transport for LocalTransport {
    async fn get_task(&self, _task_id: &str) -> Result<Task, TransportError> {
        self.load_task().await
    }

    async fn update_task(&self, _task_id: &str, update: &TaskUpdate) -> Result<(), TransportError> {
        let task = self.load_task().await?;

        let mut inner = self.inner.lock();
        inner.task = Some(update.apply_to(&task));
        inner.updates.push(update.clone());
        Ok(())
    }

    async fn get_dataset(&self, _task_id: &str) -> Result<Vec<Annotation>, TransportError> {
        match &self.dataset_source {
            DatasetSource::File(path) => read_json(path).await,
            DatasetSource::Memory(dataset) => Ok(dataset.clone()),
        }
    }

    async fn post_log(&self, _task_id: &str, entry: &LogEntry) -> Result<(), TransportError> {
        self.inner.lock().logs.push(entry.clone());
        Ok(())
    }

    async fn upload_result(
        &self,
        _task_id: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<(), TransportError> {
        self.inner.lock().results.push(UploadedResult {
            file_name: file_name.to_string(),
            size: content.len(),
        });
        Ok(())
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        self.inner.lock().fetched.push(url.to_string());
        read_local(url).await
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, TransportError> {
    let body = tokio::fs::read(path)
        .await
        .map_err(|source| TransportError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    serde_json::from_slice(&body).map_err(|e| TransportError::Decode {
        url: path.display().to_string(),
        reason: e.to_string(),
    })
}
