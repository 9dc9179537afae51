//! Remote document store
//!
//! The device is reached through the small capability set below. Transport
//! details live behind implementations of [`RemoteStore`].

mod directory;
mod memory;
mod snapshot;

pub use directory::DirectoryStore;
pub use memory::MemoryStore;
pub use snapshot::read_remote_snapshot;

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::Result;

/// Kind of an entry in the device tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Document,
    Folder,
}

/// One entry of a recursive listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    /// Full path on the device, `/`-separated
    pub path: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
}

impl RemoteEntry {
    pub fn document(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            entry_type: EntryType::Document,
        }
    }

    pub fn folder(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            entry_type: EntryType::Folder,
        }
    }
}

/// Capabilities the sync engine needs from a device.
///
/// All calls block. Paths are full device paths (remote root included).
pub trait RemoteStore: Send + Sync {
    /// Full recursive listing
    fn list_all(&self) -> Result<Vec<RemoteEntry>>;

    /// Create a folder, including missing parents
    fn create_folder(&self, path: &str) -> Result<()>;

    /// Delete a folder and anything left inside it
    fn delete_folder(&self, path: &str) -> Result<()>;

    fn delete_document(&self, path: &str) -> Result<()>;

    /// Upload a local file to `remote_path`
    fn upload_file(&self, local_path: &Path, remote_path: &str) -> Result<()>;

    fn path_exists(&self, path: &str) -> Result<bool>;
}

/// Normalize separators and drop leading and trailing slashes
pub fn normalize_path(path: &str) -> String {
    let path = path.replace('\\', "/");
    path.trim_matches('/').to_string()
}

/// Path of `path` relative to `root`.
///
/// `None` when the entry lies outside the root; `Some("")` for the root itself.
/// Matching is per component, so `Document/ZoteroOld` is not inside
/// `Document/Zotero`.
pub fn relative_to_root(path: &str, root: &str) -> Option<String> {
    let path = normalize_path(path);
    let root = normalize_path(root);

    if root.is_empty() {
        return Some(path);
    }
    if path == root {
        return Some(String::new());
    }

    path.strip_prefix(&root)
        .and_then(|rest| rest.strip_prefix('/'))
        .map(|rest| rest.trim_start_matches('/').to_string())
}

/// Join the remote root and a relative path
pub fn join_remote(root: &str, relative: &str) -> String {
    let root = normalize_path(root);
    if root.is_empty() {
        relative.to_string()
    } else if relative.is_empty() {
        root
    } else {
        format!("{}/{}", root, relative)
    }
}
