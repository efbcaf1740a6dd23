use std::io::IsTerminal;

use crate::logger::format::LoggerFormat;

/// Variable read by [`LoggerConfig::from_env`].
pub const LOG_ENV: &str = "SINGTOWN_AI_LOG";

/// How process diagnostics are written. Output always goes to stderr.
#[derive(Debug, Clone)]
pub struct LoggerConfig {
    pub format: LoggerFormat,
    /// `EnvFilter` directives, e.g. `info` or `singtown.core=debug,info`.
    pub filter: String,
    pub show_targets: bool,
    /// ANSI colors for the text format.
    pub ansi: bool,
}

impl LoggerConfig {
    /// Defaults, with the filter from `SINGTOWN_AI_LOG` when it is set and not blank.
    pub fn from_env() -> Self {
        let filter = std::env::var(LOG_ENV)
            .ok()
            .filter(|f| !f.trim().is_empty());
        Self {
            filter: filter.unwrap_or_else(|| "info".to_string()),
            ..Self::default()
        }
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            format: LoggerFormat::Text,
            filter: "info".to_string(),
            show_targets: true,
            ansi: std::io::stderr().is_terminal(),
        }
    }
}
