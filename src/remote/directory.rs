//! Device tree backed by a local directory
//!
//! Used when the device is mounted as a file system, or to stage a copy of
//! the library for later transfer.

use std::path::{Component, Path, PathBuf};

use super::{normalize_path, RemoteEntry, RemoteStore};
use crate::error::{QuadernoError, Result};

/// A [`RemoteStore`] whose device paths map onto a directory
pub struct DirectoryStore {
    root: PathBuf,
}

impl DirectoryStore {
    /// Create a store rooted at `root`, creating the directory if needed
    pub fn new(root: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a device path onto the file system
    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let path = normalize_path(path);
        let relative = Path::new(path.trim_start_matches('/'));

        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(QuadernoError::Remote(format!("invalid device path: {}", path)));
        }

        Ok(self.root.join(relative))
    }

    fn device_path(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.root).ok()?;
        let parts: Option<Vec<&str>> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect();
        Some(parts?.join("/"))
    }
}

impl RemoteStore for DirectoryStore {
    fn list_all(&self) -> Result<Vec<RemoteEntry>> {
        let mut entries = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            for entry in std::fs::read_dir(&dir)? {
                let entry = entry?;
                let path = entry.path();
                let Some(device_path) = self.device_path(&path) else {
                    tracing::debug!("Skipping non-UTF-8 path {}", path.display());
                    continue;
                };

                let file_type = entry.file_type()?;
                if file_type.is_dir() {
                    entries.push(RemoteEntry::folder(device_path));
                    pending.push(path);
                } else if file_type.is_file() {
                    entries.push(RemoteEntry::document(device_path));
                }
            }
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(entries)
    }

    fn create_folder(&self, path: &str) -> Result<()> {
        std::fs::create_dir_all(self.resolve(path)?)?;
        Ok(())
    }

    fn delete_folder(&self, path: &str) -> Result<()> {
        let target = self.resolve(path)?;
        if target == self.root {
            return Err(QuadernoError::Remote("refusing to delete store root".to_string()));
        }
        std::fs::remove_dir_all(target)?;
        Ok(())
    }

    fn delete_document(&self, path: &str) -> Result<()> {
        std::fs::remove_file(self.resolve(path)?)?;
        Ok(())
    }

    fn upload_file(&self, local_path: &Path, remote_path: &str) -> Result<()> {
        let target = self.resolve(remote_path)?;
        std::fs::copy(local_path, target)?;
        Ok(())
    }

    fn path_exists(&self, path: &str) -> Result<bool> {
        Ok(self.resolve(path)?.exists())
    }
}
