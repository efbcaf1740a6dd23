use serde::{Deserialize, Serialize};

use crate::{Metric, Task, TaskStatus};

/// Partial task update sent to the service.
///
/// Absent fields are left untouched on both sides.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Vec<Metric>>,
}

impl TaskUpdate {
    pub fn status(status: TaskStatus) -> Self {
        Self {
            status: Some(status),
            metrics: None,
        }
    }

    pub fn metrics(metrics: Vec<Metric>) -> Self {
        Self {
            status: None,
            metrics: Some(metrics),
        }
    }

    /// Merge the update into a copy of `task`.
    ///
    /// The caller replaces its mirror with the returned value as a whole.
    pub fn apply_to(&self, task: &Task) -> Task {
        let mut next = task.clone();
        if let Some(status) = self.status {
            next.status = status;
        }
        if let Some(metrics) = &self.metrics {
            next.metrics = metrics.clone();
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Project, ProjectType};

    fn task() -> Task {
        Task {
            id: None,
            status: TaskStatus::Pending,
            task_type: None,
            project: Project {
                labels: vec!["cat".into()],
                kind: ProjectType::Classification,
            },
            trained_file: String::new(),
            metrics: Vec::new(),
            logs: Vec::new(),
            params: Default::default(),
        }
    }

    #[test]
    fn empty_fields_are_not_serialized() {
        let json = serde_json::to_string(&TaskUpdate::status(TaskStatus::Running)).unwrap();
        assert_eq!(json, r#"{"status":"RUNNING"}"#);
    }

    #[test]
    fn apply_replaces_only_present_fields() {
        let mut row = Metric::new();
        row.insert("epoch".into(), serde_json::json!(0));

        let base = TaskUpdate::status(TaskStatus::Running).apply_to(&task());
        let next = TaskUpdate::metrics(vec![row]).apply_to(&base);

        assert_eq!(next.status, TaskStatus::Running);
        assert_eq!(next.metrics.len(), 1);
        assert_eq!(base.metrics.len(), 0);
    }
}
