use std::{io::Write, path::Path, time::Duration};

use anyhow::Context;
use tempfile::NamedTempFile;
use tracing::info;

use singtown_core::{Client, model::Metric};

/// Shape of a simulated training run.
#[derive(Debug, Clone)]
pub struct Plan {
    pub epochs: u32,
    pub epoch_duration: Duration,
}

/// Zip archive holding a placeholder `best.tflite`, deleted on drop.
pub fn result_archive() -> anyhow::Result<NamedTempFile> {
    let file = tempfile::Builder::new()
        .suffix(".zip")
        .tempfile()
        .context("create result archive")?;

    let mut zip = zip::ZipWriter::new(file.reopen().context("open result archive")?);
    zip.start_file("best.tflite", zip::write::SimpleFileOptions::default())?;
    zip.write_all(b"content")?;
    zip.finish()?;
    Ok(file)
}

/// Pretend to train: unpack the previous model, report one metric row and one
/// log line per epoch, then upload `result`.
pub async fn simulate(
    client: &Client,
    plan: &Plan,
    model_dir: &Path,
    result: &Path,
) -> anyhow::Result<()> {
    if client.download_trained_file(model_dir).await? {
        info!(dir = %model_dir.display(), "previous model unpacked");
    }

    let mut metrics = Vec::with_capacity(plan.epochs as usize);
    for epoch in 0..plan.epochs {
        client.log(&format!("train epoch: {epoch}"));
        metrics.push(epoch_metric(epoch));
        client.upload_metrics(metrics.clone()).await?;
        tokio::time::sleep(plan.epoch_duration).await;
    }

    client.upload_results_zip(result).await?;
    Ok(())
}

fn epoch_metric(epoch: u32) -> Metric {
    let mut row = Metric::new();
    row.insert("epoch".into(), epoch.into());
    row.insert("accuracy".into(), (epoch * 10).into());
    row
}
