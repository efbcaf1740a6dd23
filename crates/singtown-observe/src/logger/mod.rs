mod config;
mod error;
mod format;
mod output;

pub use config::{LOG_ENV, LoggerConfig};
pub use error::LoggerError;
pub use format::LoggerFormat;

/// Install the global `tracing` subscriber described by `cfg`.
///
/// Fails with [`LoggerError::AlreadySet`] when the process already has one.
pub fn logger_init(cfg: &LoggerConfig) -> Result<(), LoggerError> {
    output::install(cfg)
}
