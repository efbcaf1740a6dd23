mod error;
pub use error::ExportError;

mod class_folder;
pub use class_folder::export_class_folder;

mod yolo;
pub use yolo::{DataYaml, export_yolo, label_line};

#[cfg(test)]
mod testing;
