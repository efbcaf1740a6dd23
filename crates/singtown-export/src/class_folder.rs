use std::path::Path;

use tracing::info;

use singtown_core::{
    Client,
    model::{Project, ProjectType},
};

use crate::error::ExportError;

/// Write a classification dataset as `{folder}/{subset}/{label}/{image}`.
///
/// Images already present are kept. Returns the number of annotations exported.
pub async fn export_class_folder(
    client: &Client,
    folder: impl AsRef<Path>,
) -> Result<usize, ExportError> {
    let folder = folder.as_ref();
    let project = client.task().project;
    require(&project, ProjectType::Classification)?;

    let dataset = client.get_dataset().await?;
    for annotation in &dataset {
        let dir = folder
            .join(annotation.subset.as_str())
            .join(&annotation.classification);
        client.download_image(&annotation.url, &dir).await?;
    }

    info!(target: "singtown.export", folder = %folder.display(), count = dataset.len(), "classification dataset exported");
    Ok(dataset.len())
}

pub(crate) fn require(project: &Project, expected: ProjectType) -> Result<(), ExportError> {
    if project.kind != expected {
        return Err(ExportError::WrongProjectType {
            expected,
            actual: project.kind,
        });
    }
    Ok(())
}
