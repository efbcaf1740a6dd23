use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

/// One uploaded chunk of log text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    /// Seconds since the UNIX epoch.
    pub timestamp: f64,
    pub content: String,
}

impl LogEntry {
    /// Stamp `content` with the current time.
    pub fn now(content: impl Into<String>) -> Self {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs_f64())
            .unwrap_or_default();
        Self {
            timestamp,
            content: content.into(),
        }
    }
}
