//! Zotero catalog reader
//!
//! Opens the reference-manager database read-only and derives the folders
//! and PDF files that should exist on the device.

mod connection;
pub mod paths;
pub mod queries;
mod reader;

pub use connection::{
    default_data_dir, Catalog, CatalogPaths, DATABASE_FILE_NAME, STORAGE_DIR_NAME,
};
pub use paths::CollectionPaths;
pub use queries::AttachmentRow;
pub use reader::{
    build_folder_set, build_local_snapshot, read_local_folder_set, read_local_snapshot,
    select_pdf, unique_file_name, CATALOG_DATE_FORMAT,
};
