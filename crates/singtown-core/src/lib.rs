pub mod error;
pub use error::ClientError;

pub mod config;
pub use config::ClientConfig;

pub mod buffer;
pub use buffer::{LogBuffer, LogWriter};

pub mod state;
pub use state::TaskState;

pub mod metrics;
pub use metrics::MetricsSource;

pub mod watcher;
pub use watcher::{Flush, Watcher};

mod client;
pub use client::Client;

mod session;
pub use session::Session;

#[cfg(test)]
mod testing;

pub use singtown_model as model;
pub use singtown_transport as transport;
