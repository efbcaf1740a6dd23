mod args;
mod train;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use singtown_core::{Client, transport::LocalTransport};
use singtown_observe::logger_init;

use crate::{args::Args, train::Plan};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 1) Logger
    logger_init(&args.logger_config())?;

    // 2) Client
    let config = args.client_config();
    let client = match &args.task_file {
        Some(task_file) => {
            info!(task_file = %task_file.display(), "offline run");
            let transport = LocalTransport::from_files(task_file, args.dataset_file.clone());
            Client::with_transport(config, Arc::new(transport)).await
        }
        None => Client::connect(config).await,
    }
    .context("load task")?;
    info!(task_id = %client.task_id(), status = %client.status(), "task loaded");

    // 3) Result archive
    let archive = train::result_archive()?;

    // 4) Run
    let plan = Plan {
        epochs: args.epochs,
        epoch_duration: args.epoch_duration(),
    };
    client
        .run(|c| async move { train::simulate(&c, &plan, &args.model_dir, archive.path()).await })
        .await?;

    info!(status = %client.status(), logs = client.logs().len(), "dry run finished");
    Ok(())
}
