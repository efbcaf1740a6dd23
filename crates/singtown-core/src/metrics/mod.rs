use std::{
    io,
    path::{Path, PathBuf},
};

use tracing::{trace, warn};

use singtown_model::Metric;

use crate::error::ClientError;

/// Training metrics CSV polled by the flush cycle.
///
/// The file is re-read on every poll; rows are uploaded only when the content
/// differs from the last upload that succeeded.
#[derive(Debug)]
pub struct MetricsSource {
    path: PathBuf,
    last: Option<String>,
}

/// Metrics read by [`MetricsSource::poll`] and not yet committed.
#[derive(Debug)]
pub struct PendingMetrics {
    content: String,
    pub rows: Vec<Metric>,
}

impl MetricsSource {
    /// `None` (with a warning) when `path` does not name a `.csv` file.
    pub fn new(path: impl Into<PathBuf>) -> Option<Self> {
        let path = path.into();
        let is_csv = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if !is_csv {
            warn!(target: "singtown.core.metrics", path = %path.display(), "metrics file is not a .csv file, ignored");
            return None;
        }
        Some(Self { path, last: None })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the file and return its rows when there is something new to upload.
    ///
    /// A missing file, a directory, an empty file or a header without rows all
    /// mean "no metrics yet". Only newline-terminated lines are read; a row the
    /// trainer is still writing waits for the next poll.
    pub async fn poll(&self) -> Result<Option<PendingMetrics>, ClientError> {
        let mut content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::IsADirectory) => {
                trace!(target: "singtown.core.metrics", path = %self.path.display(), "no metrics yet");
                return Ok(None);
            }
            Err(e) => return Err(ClientError::io(&self.path, e)),
        };
        content.truncate(complete_len(&content));

        if content.trim().is_empty() || self.last.as_deref() == Some(content.as_str()) {
            return Ok(None);
        }

        let rows = parse_rows(&self.path, &content)?;
        if rows.is_empty() {
            return Ok(None);
        }
        Ok(Some(PendingMetrics { content, rows }))
    }

    /// Remember `pending` as uploaded.
    pub fn commit(&mut self, pending: PendingMetrics) {
        self.last = Some(pending.content);
    }
}

/// Length of `content` up to and including its last newline.
fn complete_len(content: &str) -> usize {
    content.rfind('\n').map_or(0, |i| i + 1)
}

/// Header row gives the keys; every value is kept as a string.
///
/// Short rows only carry the columns they have; extra fields are dropped.
fn parse_rows(path: &Path, content: &str) -> Result<Vec<Metric>, ClientError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(content.as_bytes());
    let metrics_err = |source| ClientError::Metrics {
        path: path.to_path_buf(),
        source,
    };

    let headers = reader.headers().map_err(metrics_err)?.clone();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(metrics_err)?;
        let row: Metric = headers
            .iter()
            .zip(record.iter())
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}
