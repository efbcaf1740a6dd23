use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("unknown log format `{0}`, use text, json or journald")]
    UnknownFormat(String),

    #[error("journald output needs a linux build with the `journald` feature")]
    JournaldUnavailable,

    #[error("cannot connect to journald: {0}")]
    Journald(String),

    #[error("log filter `{filter}` rejected: {reason}")]
    BadFilter { filter: String, reason: String },

    #[error("a tracing subscriber is already installed in this process")]
    AlreadySet,

    #[error("cannot install tracing subscriber: {0}")]
    Install(String),
}
