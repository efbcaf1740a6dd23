use std::{path::PathBuf, time::Duration};

use clap::Parser;

use singtown_core::{
    ClientConfig,
    config::{DEFAULT_HOST, HOST_ENV, TASK_ID_ENV, TOKEN_ENV},
};
use singtown_observe::{LoggerConfig, LoggerFormat};

/// Simulated training run against a SingTown AI task.
#[derive(Debug, Parser)]
#[command(name = "singtown-dryrun", version)]
pub struct Args {
    #[arg(long, env = HOST_ENV, default_value = DEFAULT_HOST)]
    pub host: String,

    #[arg(long, env = TOKEN_ENV, default_value = "", hide_env_values = true)]
    pub token: String,

    #[arg(long, env = TASK_ID_ENV, default_value = "")]
    pub task_id: String,

    #[arg(long, default_value_t = 10)]
    pub epochs: u32,

    /// Seconds spent per simulated epoch.
    #[arg(long, default_value_t = 3.0)]
    pub train_interval: f64,

    /// Serve the task from this JSON file instead of the service.
    #[arg(long)]
    pub task_file: Option<PathBuf>,

    /// Dataset listing served with `--task-file`.
    #[arg(long, requires = "task_file")]
    pub dataset_file: Option<PathBuf>,

    /// Where the trained archive of the task is unpacked.
    #[arg(long, default_value = "model_path")]
    pub model_dir: PathBuf,

    /// Log filter, e.g. `info` or `singtown=debug`.
    #[arg(long)]
    pub log_level: Option<String>,

    #[arg(long, default_value = "text")]
    pub log_format: LoggerFormat,
}

impl Args {
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_host(&self.host)
            .with_token(&self.token)
            .with_task_id(&self.task_id)
    }

    pub fn logger_config(&self) -> LoggerConfig {
        let mut cfg = LoggerConfig::from_env();
        cfg.format = self.log_format;
        if let Some(level) = &self.log_level {
            cfg.filter = level.clone();
        }
        cfg
    }

    /// Negative or non-finite values count as zero.
    pub fn epoch_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.train_interval).unwrap_or(Duration::ZERO)
    }
}
