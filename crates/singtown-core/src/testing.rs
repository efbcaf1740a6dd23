use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;

use singtown_model::{Annotation, LogEntry, Project, ProjectType, Task, TaskStatus, TaskUpdate};
use singtown_transport::{LocalTransport, Transport, TransportError};

pub(crate) fn sample_task() -> Task {
    serde_json::from_value(serde_json::json!({
        "id": "1",
        "status": TaskStatus::Pending,
        "type": "TRAIN",
        "project": Project {
            labels: vec!["cat".into(), "dog".into()],
            kind: ProjectType::Classification,
        },
        "model_name": "mobilenet_v2_0.35_128",
        "epochs": 1,
    }))
    .unwrap()
}

/// [`LocalTransport`] with switches that make selected calls fail with HTTP 500.
pub(crate) struct FlakyTransport {
    inner: LocalTransport,
    fail_updates: AtomicBool,
    fail_logs: AtomicBool,
}

impl FlakyTransport {
    pub(crate) fn new(task: Task) -> Self {
        Self {
            inner: LocalTransport::new(task),
            fail_updates: AtomicBool::new(false),
            fail_logs: AtomicBool::new(false),
        }
    }

    pub(crate) fn fail_updates(&self, fail: bool) {
        self.fail_updates.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn fail_logs(&self, fail: bool) {
        self.fail_logs.store(fail, Ordering::SeqCst);
    }

    pub(crate) fn logs(&self) -> Vec<LogEntry> {
        self.inner.logs()
    }

    pub(crate) fn task(&self) -> Option<Task> {
        self.inner.task()
    }
}

fn rejected(path: &str) -> TransportError {
    TransportError::Status {
        url: format!("http://test/api/v1/task/tasks/1{path}"),
        status: 500,
    }
}

#[async_trait]
impl Transport for FlakyTransport {
    async fn get_task(&self, task_id: &str) -> Result<Task, TransportError> {
        self.inner.get_task(task_id).await
    }

    async fn update_task(&self, task_id: &str, update: &TaskUpdate) -> Result<(), TransportError> {
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(rejected(""));
        }
        self.inner.update_task(task_id, update).await
    }

    async fn get_dataset(&self, task_id: &str) -> Result<Vec<Annotation>, TransportError> {
        self.inner.get_dataset(task_id).await
    }

    async fn post_log(&self, task_id: &str, entry: &LogEntry) -> Result<(), TransportError> {
        if self.fail_logs.load(Ordering::SeqCst) {
            return Err(rejected("/logs"));
        }
        self.inner.post_log(task_id, entry).await
    }

    async fn upload_result(
        &self,
        task_id: &str,
        file_name: &str,
        content: Vec<u8>,
    ) -> Result<(), TransportError> {
        self.inner.upload_result(task_id, file_name, content).await
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        self.inner.fetch(url).await
    }
}
