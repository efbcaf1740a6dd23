use std::path::PathBuf;

use crate::errors::TransportError;

/// `true` for `http://` and `https://` URLs.
pub fn is_remote_url(url: &str) -> bool {
    let lower = url.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// Filesystem path of a `file://` URL or a plain path.
pub fn local_path(url: &str) -> PathBuf {
    PathBuf::from(url.strip_prefix("file://").unwrap_or(url))
}

pub(crate) async fn read_local(url: &str) -> Result<Vec<u8>, TransportError> {
    let path = local_path(url);
    tokio::fs::read(&path)
        .await
        .map_err(|source| TransportError::Io { path, source })
}
