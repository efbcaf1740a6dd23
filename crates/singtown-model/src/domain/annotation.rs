use std::fmt;

use serde::{Deserialize, Serialize};

/// Dataset partition an annotation belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Subset {
    Train,
    Valid,
    Test,
}

impl Subset {
    /// Directory name used by the on-disk export layouts.
    pub fn as_str(&self) -> &'static str {
        match self {
            Subset::Train => "TRAIN",
            Subset::Valid => "VALID",
            Subset::Test => "TEST",
        }
    }
}

impl fmt::Display for Subset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One labelled box, corners normalised to the image size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub label: String,
    pub xmin: f64,
    pub ymin: f64,
    pub xmax: f64,
    pub ymax: f64,
}

/// Center/size form of a [`BoundingBox`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterBox {
    pub cx: f64,
    pub cy: f64,
    pub w: f64,
    pub h: f64,
}

impl BoundingBox {
    pub fn to_center(&self) -> CenterBox {
        CenterBox {
            cx: (self.xmin + self.xmax) / 2.0,
            cy: (self.ymin + self.ymax) / 2.0,
            w: self.xmax - self.xmin,
            h: self.ymax - self.ymin,
        }
    }
}

impl CenterBox {
    /// All four values lie in `[0, 1]`.
    pub fn is_normalized(&self) -> bool {
        [self.cx, self.cy, self.w, self.h]
            .iter()
            .all(|v| (0.0..=1.0).contains(v))
    }
}

/// One dataset item as listed by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    /// Image location: HTTP(S) URL, `file://` URL or local path.
    pub url: String,
    pub subset: Subset,
    /// Class label for classification projects.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub classification: String,
    /// Boxes for object detection projects.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub object_detection: Vec<BoundingBox>,
}

impl Annotation {
    /// File name of the image (last path segment of the URL, query stripped).
    pub fn file_name(&self) -> &str {
        url_file_name(&self.url)
    }
}

/// Last path segment of a URL or path, without query string or fragment.
///
/// Empty when the URL ends with a separator.
pub fn url_file_name(url: &str) -> &str {
    let path = url.split(['?', '#']).next().unwrap_or_default();
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}
