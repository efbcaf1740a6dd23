use std::path::PathBuf;

use singtown_model::TaskStatus;
use singtown_transport::TransportError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("file not found: {0}")]
    MissingFile(PathBuf),

    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid metrics file {path}: {source}")]
    Metrics {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("invalid model archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("url has no file name: {0}")]
    InvalidUrl(String),

    #[error("invalid status transition {from} -> {to}")]
    InvalidTransition { from: TaskStatus, to: TaskStatus },
}

impl ClientError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ClientError::Io {
            path: path.into(),
            source,
        }
    }

    /// The service rejected a request or could not be reached.
    pub fn is_transport(&self) -> bool {
        matches!(self, ClientError::Transport(_))
    }
}
