mod task_status;
pub use task_status::TaskStatus;

mod project;
pub use project::{Project, ProjectType};

mod task;
pub use task::{Task, TaskType};

mod task_update;
pub use task_update::TaskUpdate;

mod annotation;
pub use annotation::{Annotation, BoundingBox, CenterBox, Subset, url_file_name};

mod log_entry;
pub use log_entry::LogEntry;

/// Opaque metric record (one row of a training metrics table).
///
/// The service stores metrics as a list of JSON objects without interpreting them.
pub type Metric = serde_json::Map<String, serde_json::Value>;
