use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of annotation a project collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProjectType {
    /// One label per image.
    Classification,
    /// Any number of labelled bounding boxes per image.
    ObjectDetection,
}

impl ProjectType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProjectType::Classification => "CLASSIFICATION",
            ProjectType::ObjectDetection => "OBJECT_DETECTION",
        }
    }
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Project descriptor attached to every task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    /// Ordered label set; the position of a label is its class index.
    pub labels: Vec<String>,
    #[serde(rename = "type")]
    pub kind: ProjectType,
}

impl Project {
    /// Zero-based class index of `label`, if it belongs to the project.
    pub fn label_index(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }
}
