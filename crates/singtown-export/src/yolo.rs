use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use singtown_core::{
    Client,
    model::{BoundingBox, Project, ProjectType, Subset},
};

use crate::{class_folder::require, error::ExportError};

/// `data.yaml` of a YOLO dataset. Field order is the order written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataYaml {
    pub path: String,
    pub train: String,
    pub val: String,
    pub test: String,
    pub nc: usize,
    pub names: Vec<String>,
}

impl DataYaml {
    pub fn new(root: &Path, project: &Project) -> Self {
        Self {
            path: root.display().to_string(),
            train: images_dir(Subset::Train),
            val: images_dir(Subset::Valid),
            test: images_dir(Subset::Test),
            nc: project.labels.len(),
            names: project.labels.clone(),
        }
    }
}

fn images_dir(subset: Subset) -> String {
    format!("images/{subset}")
}

/// Write an object detection dataset in YOLO layout:
///
/// ```text
/// {folder}/data.yaml
/// {folder}/images/{subset}/{image}
/// {folder}/labels/{subset}/{image stem}.txt
/// ```
///
/// Stops at the first invalid box; files written before it stay on disk.
/// Returns the number of annotations exported.
pub async fn export_yolo(client: &Client, folder: impl AsRef<Path>) -> Result<usize, ExportError> {
    let project = client.task().project;
    require(&project, ProjectType::ObjectDetection)?;

    let root = absolute(folder.as_ref())?;
    tokio::fs::create_dir_all(&root)
        .await
        .map_err(|e| ExportError::io(&root, e))?;

    let yaml = serde_yaml::to_string(&DataYaml::new(&root, &project))?;
    let yaml_path = root.join("data.yaml");
    tokio::fs::write(&yaml_path, yaml)
        .await
        .map_err(|e| ExportError::io(&yaml_path, e))?;

    let dataset = client.get_dataset().await?;
    for annotation in &dataset {
        let subset = annotation.subset.as_str();
        let image = client
            .download_image(&annotation.url, root.join("images").join(subset))
            .await?;

        let mut content = String::new();
        for bbox in &annotation.object_detection {
            content.push_str(&label_line(&project, bbox)?);
            content.push('\n');
        }

        let labels_dir = root.join("labels").join(subset);
        tokio::fs::create_dir_all(&labels_dir)
            .await
            .map_err(|e| ExportError::io(&labels_dir, e))?;
        let label_path = labels_dir.join(label_file_name(&image));
        tokio::fs::write(&label_path, content)
            .await
            .map_err(|e| ExportError::io(&label_path, e))?;
        debug!(target: "singtown.export", path = %label_path.display(), boxes = annotation.object_detection.len(), "labels written");
    }

    info!(target: "singtown.export", folder = %root.display(), count = dataset.len(), "yolo dataset exported");
    Ok(dataset.len())
}

/// `"{class} {cx} {cy} {w} {h}"` with six decimals.
pub fn label_line(project: &Project, bbox: &BoundingBox) -> Result<String, ExportError> {
    let c = bbox.to_center();
    if !c.is_normalized() {
        return Err(ExportError::BoxOutOfRange {
            cx: c.cx,
            cy: c.cy,
            w: c.w,
            h: c.h,
        });
    }
    let class = project
        .label_index(&bbox.label)
        .ok_or_else(|| ExportError::UnknownLabel(bbox.label.clone()))?;
    Ok(format!("{class} {:.6} {:.6} {:.6} {:.6}", c.cx, c.cy, c.w, c.h))
}

fn label_file_name(image: &Path) -> String {
    let stem = image
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    format!("{stem}.txt")
}

fn absolute(path: &Path) -> Result<PathBuf, ExportError> {
    std::path::absolute(path).map_err(|e| ExportError::io(path, e))
}
