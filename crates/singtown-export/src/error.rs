use std::path::PathBuf;

use singtown_core::{ClientError, model::ProjectType};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("export requires a {expected} project, task is {actual}")]
    WrongProjectType {
        expected: ProjectType,
        actual: ProjectType,
    },

    #[error("label {0:?} is not part of the project")]
    UnknownLabel(String),

    #[error("(cx, cy, w, h) must be between 0 and 1: cx: {cx}, cy: {cy}, w: {w}, h: {h}")]
    BoxOutOfRange { cx: f64, cy: f64, w: f64, h: f64 },

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("data.yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ExportError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExportError::Io {
            path: path.into(),
            source,
        }
    }

    /// The dataset does not fit the export layout.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ExportError::WrongProjectType { .. }
                | ExportError::UnknownLabel(_)
                | ExportError::BoxOutOfRange { .. }
        )
    }
}
