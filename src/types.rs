//! Core types for Quaderno

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{QuadernoError, Result};

/// Primary key of a collection in the catalog
pub type CollectionId = i64;

/// Primary key of an item in the catalog
pub type ItemId = i64;

/// Default document root on the device
pub const DEFAULT_REMOTE_ROOT: &str = "Document/Zotero";

/// Folder used for attachments that belong to no resolvable collection
pub const UNCATEGORIZED_FOLDER: &str = "Uncategorized";

/// A collection row as read from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionNode {
    pub id: CollectionId,
    pub name: String,
    pub parent_id: Option<CollectionId>,
}

/// A local PDF that should exist on the device
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalFile {
    /// Absolute path of the PDF inside the storage directory
    pub source: PathBuf,
    /// Catalog modification time, or the file's mtime when unparseable.
    /// Carried for reporting only; never used to decide uploads.
    pub modified: DateTime<Utc>,
}

/// Point-in-time view of the local library, keyed by remote-relative path
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalSnapshot {
    pub folders: BTreeSet<String>,
    pub files: BTreeMap<String, LocalFile>,
}

/// Point-in-time view of the device tree below the remote root
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSnapshot {
    pub folders: BTreeSet<String>,
    pub files: BTreeSet<String>,
}

/// A single step of a sync plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum SyncOperation {
    CreateFolder { path: String },
    DeleteFolder { path: String },
    DeleteFile { path: String },
    UploadFile { path: String, source: PathBuf },
}

impl SyncOperation {
    /// Remote-relative path the operation targets
    pub fn path(&self) -> &str {
        match self {
            SyncOperation::CreateFolder { path }
            | SyncOperation::DeleteFolder { path }
            | SyncOperation::DeleteFile { path }
            | SyncOperation::UploadFile { path, .. } => path,
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            SyncOperation::CreateFolder { .. } => OperationKind::CreateFolder,
            SyncOperation::DeleteFolder { .. } => OperationKind::DeleteFolder,
            SyncOperation::DeleteFile { .. } => OperationKind::DeleteFile,
            SyncOperation::UploadFile { .. } => OperationKind::UploadFile,
        }
    }
}

impl fmt::Display for SyncOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SyncOperation::CreateFolder { path } => write!(f, "create folder {}", path),
            SyncOperation::DeleteFolder { path } => write!(f, "delete folder {}", path),
            SyncOperation::DeleteFile { path } => write!(f, "delete file {}", path),
            SyncOperation::UploadFile { path, source } => {
                write!(f, "upload {} -> {}", source.display(), path)
            }
        }
    }
}

/// Discriminant of [`SyncOperation`], used for counting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationKind {
    CreateFolder,
    DeleteFolder,
    DeleteFile,
    UploadFile,
}

/// Ordered list of operations that converges the device toward the library
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPlan {
    pub operations: Vec<SyncOperation>,
}

impl SyncPlan {
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SyncOperation> {
        self.operations.iter()
    }

    /// Number of operations of each kind
    pub fn summary(&self) -> PlanSummary {
        let mut summary = PlanSummary::default();
        for op in &self.operations {
            match op.kind() {
                OperationKind::CreateFolder => summary.create_folders += 1,
                OperationKind::DeleteFolder => summary.delete_folders += 1,
                OperationKind::DeleteFile => summary.delete_files += 1,
                OperationKind::UploadFile => summary.uploads += 1,
            }
        }
        summary
    }
}

impl<'a> IntoIterator for &'a SyncPlan {
    type Item = &'a SyncOperation;
    type IntoIter = std::slice::Iter<'a, SyncOperation>;

    fn into_iter(self) -> Self::IntoIter {
        self.operations.iter()
    }
}

/// Per-kind operation counts of a plan
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub create_folders: usize,
    pub delete_folders: usize,
    pub delete_files: usize,
    pub uploads: usize,
}

impl fmt::Display for PlanSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} folder(s) to create, {} file(s) to delete, {} folder(s) to delete, {} file(s) to upload",
            self.create_folders, self.delete_files, self.delete_folders, self.uploads
        )
    }
}

/// Configuration for a sync invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Document root on the device that mirrors the library
    #[serde(default = "default_remote_root")]
    pub remote_root: String,
    /// Zotero storage directory (defaults to ~/Zotero/storage)
    #[serde(default)]
    pub storage_root: Option<PathBuf>,
    /// Zotero database file (defaults to ~/Zotero/zotero.sqlite)
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,
    /// Log intended operations without touching the device
    #[serde(default)]
    pub simulate: bool,
    /// Check that deleted files are really gone
    #[serde(default = "default_true")]
    pub verify_deletes: bool,
}

fn default_remote_root() -> String {
    DEFAULT_REMOTE_ROOT.to_string()
}

fn default_true() -> bool {
    true
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            remote_root: default_remote_root(),
            storage_root: None,
            catalog_path: None,
            simulate: false,
            verify_deletes: true,
        }
    }
}

impl SyncConfig {
    /// Load configuration from a TOML file
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| QuadernoError::Config(format!("{}: {}", path.display(), e)))
    }
}
