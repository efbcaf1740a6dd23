use serde::{Deserialize, Serialize};

use crate::{LogEntry, Metric, Project, TaskStatus};

/// What the runner is expected to do with the task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskType {
    Train,
    Deploy,
}

/// Client-side mirror of the remote task resource.
///
/// Fields the client does not interpret (model name, epochs, image size, ...)
/// are collected in [`Task::params`] and written back unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Current lifecycle state; absent on freshly created tasks.
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<TaskType>,
    pub project: Project,
    /// URL of the trained model archive; empty when nothing was trained yet.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub trained_file: String,
    #[serde(default)]
    pub metrics: Vec<Metric>,
    #[serde(default)]
    pub logs: Vec<LogEntry>,
    /// Free-form training parameters.
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

impl Task {
    /// Look up a free-form parameter.
    pub fn param(&self, key: &str) -> Option<&serde_json::Value> {
        self.params.get(key)
    }

    /// Whether the task references a trained model archive.
    pub fn has_trained_file(&self) -> bool {
        !self.trained_file.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ProjectType;

    #[test]
    fn minimal_task_uses_defaults() {
        let json = r#"{
            "project": {"labels": ["cat", "dog"], "type": "CLASSIFICATION"},
            "model_name": "mobilenet_v2_0.35_128",
            "epochs": 1,
            "metrics": [],
            "logs": []
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();

        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.project.kind, ProjectType::Classification);
        assert!(!task.has_trained_file());
        assert_eq!(task.param("epochs"), Some(&serde_json::json!(1)));
        assert_eq!(
            task.param("model_name").and_then(|v| v.as_str()),
            Some("mobilenet_v2_0.35_128")
        );
    }

    #[test]
    fn full_task_keeps_known_fields_out_of_params() {
        let json = r#"{
            "project": {"labels": ["cat"], "type": "OBJECT_DETECTION"},
            "type": "DEPLOY",
            "status": "RUNNING",
            "params": {"device": "openmv"},
            "trained_file": "https://example.com/model.zip"
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();

        assert_eq!(task.task_type, Some(TaskType::Deploy));
        assert_eq!(task.status, TaskStatus::Running);
        assert!(task.has_trained_file());
        assert!(task.params.contains_key("params"));
        assert!(!task.params.contains_key("status"));
    }
}
