use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("request {url} failed with status {status}")]
    Status { url: String, status: u16 },

    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("not an http(s) url: {0}")]
    UnsupportedUrl(String),

    #[error("invalid response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TransportError {
    /// The service answered with a non-success status code.
    pub fn is_status(&self) -> bool {
        matches!(self, TransportError::Status { .. })
    }

    /// Status code of a rejected request.
    pub fn status(&self) -> Option<u16> {
        match self {
            TransportError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}
