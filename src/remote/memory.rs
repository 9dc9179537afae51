//! In-memory device tree
//!
//! Behaves like a device for simulations and tests: it keeps folders and
//! documents in sorted sets, counts mutating calls, and can be told to fail.

use parking_lot::{Mutex, MutexGuard};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};

use super::{normalize_path, EntryType, RemoteEntry, RemoteStore};
use crate::error::{QuadernoError, Result};

#[derive(Default)]
struct MemoryState {
    folders: BTreeSet<String>,
    documents: BTreeMap<String, PathBuf>,
    mutations: usize,
    failing: HashSet<String>,
    sticky: HashSet<String>,
    fail_listing: bool,
}

/// A [`RemoteStore`] held entirely in memory
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the tree with existing entries
    pub fn with_entries(entries: impl IntoIterator<Item = RemoteEntry>) -> Self {
        let store = Self::new();
        {
            let mut state = store.state.lock();
            for entry in entries {
                let path = normalize_path(&entry.path);
                match entry.entry_type {
                    EntryType::Folder => {
                        state.folders.insert(path);
                    }
                    EntryType::Document => {
                        state.documents.insert(path, PathBuf::new());
                    }
                }
            }
        }
        store
    }

    /// Make every mutating call on `path` fail
    pub fn fail_on(&self, path: &str) {
        self.state.lock().failing.insert(normalize_path(path));
    }

    /// Make `list_all` fail
    pub fn fail_listing(&self, fail: bool) {
        self.state.lock().fail_listing = fail;
    }

    /// Deleting `path` reports success but leaves the document in place
    pub fn keep_after_delete(&self, path: &str) {
        self.state.lock().sticky.insert(normalize_path(path));
    }

    /// Number of mutating calls received, successful or not
    pub fn mutation_count(&self) -> usize {
        self.state.lock().mutations
    }

    pub fn folders(&self) -> BTreeSet<String> {
        self.state.lock().folders.clone()
    }

    pub fn documents(&self) -> BTreeSet<String> {
        self.state.lock().documents.keys().cloned().collect()
    }

    /// Local source a document was uploaded from
    pub fn source_of(&self, path: &str) -> Option<PathBuf> {
        self.state.lock().documents.get(&normalize_path(path)).cloned()
    }

    fn begin_mutation(&self, path: &str) -> Result<(String, MutexGuard<'_, MemoryState>)> {
        let path = normalize_path(path);
        let mut state = self.state.lock();
        state.mutations += 1;
        if state.failing.contains(&path) {
            return Err(QuadernoError::Remote(format!("simulated failure on {}", path)));
        }
        Ok((path, state))
    }
}

impl RemoteStore for MemoryStore {
    fn list_all(&self) -> Result<Vec<RemoteEntry>> {
        let state = self.state.lock();
        if state.fail_listing {
            return Err(QuadernoError::Remote("device not responding".to_string()));
        }

        let folders = state.folders.iter().map(RemoteEntry::folder);
        let documents = state.documents.keys().map(RemoteEntry::document);
        Ok(folders.chain(documents).collect())
    }

    fn create_folder(&self, path: &str) -> Result<()> {
        let (path, mut state) = self.begin_mutation(path)?;
        for (idx, _) in path.match_indices('/') {
            state.folders.insert(path[..idx].to_string());
        }
        state.folders.insert(path);
        Ok(())
    }

    fn delete_folder(&self, path: &str) -> Result<()> {
        let (path, mut state) = self.begin_mutation(path)?;
        if !state.folders.remove(&path) {
            return Err(QuadernoError::Remote(format!("no such folder: {}", path)));
        }

        let prefix = format!("{}/", path);
        state.folders.retain(|p| !p.starts_with(&prefix));
        state.documents.retain(|p, _| !p.starts_with(&prefix));
        Ok(())
    }

    fn delete_document(&self, path: &str) -> Result<()> {
        let (path, mut state) = self.begin_mutation(path)?;
        if !state.documents.contains_key(&path) {
            return Err(QuadernoError::Remote(format!("no such document: {}", path)));
        }
        if !state.sticky.contains(&path) {
            state.documents.remove(&path);
        }
        Ok(())
    }

    fn upload_file(&self, local_path: &Path, remote_path: &str) -> Result<()> {
        let (path, mut state) = self.begin_mutation(remote_path)?;
        state.documents.insert(path, local_path.to_path_buf());
        Ok(())
    }

    fn path_exists(&self, path: &str) -> Result<bool> {
        let path = normalize_path(path);
        let state = self.state.lock();
        Ok(state.folders.contains(&path) || state.documents.contains_key(&path))
    }
}
