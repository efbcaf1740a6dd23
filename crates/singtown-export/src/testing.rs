use std::{path::Path, sync::Arc};

use singtown_core::{
    Client, ClientConfig,
    model::{Annotation, BoundingBox, Subset, Task},
    transport::LocalTransport,
};

const SPLIT: [(Subset, usize); 3] = [(Subset::Train, 7), (Subset::Valid, 2), (Subset::Test, 1)];

fn task(kind: &str) -> Task {
    serde_json::from_value(serde_json::json!({
        "project": {"labels": ["cat", "dog"], "type": kind},
        "epochs": 1,
    }))
    .unwrap()
}

pub(crate) fn classification_task() -> Task {
    task("CLASSIFICATION")
}

pub(crate) fn detection_task() -> Task {
    task("OBJECT_DETECTION")
}

/// Annotation pointing at a freshly written image under `dir/images`.
pub(crate) fn image_annotation(dir: &Path, name: &str, subset: Subset) -> Annotation {
    let images = dir.join("images");
    std::fs::create_dir_all(&images).unwrap();
    let path = images.join(name);
    std::fs::write(&path, b"fake image content").unwrap();

    Annotation {
        url: path.display().to_string(),
        subset,
        classification: String::new(),
        object_detection: Vec::new(),
    }
}

/// 20 images: 7/2/1 cats and 7/2/1 dogs over TRAIN/VALID/TEST.
fn fixture(dir: &Path, mut annotate: impl FnMut(&mut Annotation, &str)) -> Vec<Annotation> {
    let mut dataset = Vec::new();
    let mut n = 0;
    for label in ["cat", "dog"] {
        for (subset, count) in SPLIT {
            for _ in 0..count {
                let mut a = image_annotation(dir, &format!("{label}.{n}.jpg"), subset);
                annotate(&mut a, label);
                dataset.push(a);
                n += 1;
            }
        }
    }
    dataset
}

pub(crate) fn classification_fixture(dir: &Path) -> (Task, Vec<Annotation>) {
    let dataset = fixture(dir, |a, label| a.classification = label.to_string());
    (classification_task(), dataset)
}

pub(crate) fn detection_fixture(dir: &Path) -> (Task, Vec<Annotation>) {
    let dataset = fixture(dir, |a, label| {
        a.object_detection.push(BoundingBox {
            label: label.to_string(),
            xmin: 0.1,
            ymin: 0.2,
            xmax: 0.5,
            ymax: 0.6,
        })
    });
    (detection_task(), dataset)
}

pub(crate) async fn fixture_client(task: Task, dataset: Vec<Annotation>) -> Client {
    fixture_transport(task, dataset).await.1
}

/// Like [`fixture_client`], keeping the transport for inspection.
pub(crate) async fn fixture_transport(
    task: Task,
    dataset: Vec<Annotation>,
) -> (Arc<LocalTransport>, Client) {
    let transport = Arc::new(LocalTransport::new(task).with_dataset(dataset));
    let client = Client::with_transport(ClientConfig::default(), transport.clone())
        .await
        .unwrap();
    (transport, client)
}
