use std::{fmt, path::PathBuf, time::Duration};

pub const HOST_ENV: &str = "SINGTOWN_AI_HOST";
pub const TOKEN_ENV: &str = "SINGTOWN_AI_TOKEN";
pub const TASK_ID_ENV: &str = "SINGTOWN_AI_TASK_ID";

pub const DEFAULT_HOST: &str = "https://ai.singtown.com";
pub const DEFAULT_UPLOAD_INTERVAL: Duration = Duration::from_secs(3);

/// Connection and upload settings of a [`Client`](crate::Client).
#[derive(Clone)]
pub struct ClientConfig {
    pub host: String,
    /// Static bearer credential sent with every request.
    pub token: String,
    pub task_id: String,
    /// Pause between two background flush cycles.
    pub upload_interval: Duration,
    /// CSV file the training process appends metric rows to.
    pub metrics_file: Option<PathBuf>,
}

impl ClientConfig {
    /// Defaults overridden by `SINGTOWN_AI_HOST`, `SINGTOWN_AI_TOKEN` and `SINGTOWN_AI_TASK_ID`.
    pub fn from_env() -> Self {
        let mut cfg = Self::default();
        if let Some(host) = env_non_empty(HOST_ENV) {
            cfg.host = host;
        }
        if let Some(token) = env_non_empty(TOKEN_ENV) {
            cfg.token = token;
        }
        if let Some(task_id) = env_non_empty(TASK_ID_ENV) {
            cfg.task_id = task_id;
        }
        cfg
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = token.into();
        self
    }

    pub fn with_task_id(mut self, task_id: impl Into<String>) -> Self {
        self.task_id = task_id.into();
        self
    }

    pub fn with_upload_interval(mut self, interval: Duration) -> Self {
        self.upload_interval = interval;
        self
    }

    pub fn with_metrics_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.metrics_file = Some(path.into());
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            token: String::new(),
            task_id: String::new(),
            upload_interval: DEFAULT_UPLOAD_INTERVAL,
            metrics_file: None,
        }
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("host", &self.host)
            .field("token", &"<redacted>")
            .field("task_id", &self.task_id)
            .field("upload_interval", &self.upload_interval)
            .field("metrics_file", &self.metrics_file)
            .finish()
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}
