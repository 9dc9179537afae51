//! Reconciliation planner
//!
//! Pure function from two snapshots to an ordered plan. Phases run in this
//! order, each sorted:
//!
//! 1. create folders, ascending (parents before children)
//! 2. delete files, ascending
//! 3. delete folders, descending (children before parents, after their files)
//! 4. upload files, ascending
//!
//! Files present on both sides by path are left alone.

use crate::types::{LocalSnapshot, RemoteSnapshot, SyncOperation, SyncPlan};

/// Compute the operations that converge `remote` toward `local`
pub fn plan(local: &LocalSnapshot, remote: &RemoteSnapshot) -> SyncPlan {
    let mut operations = Vec::new();

    // Sets are BTree-backed, so differences come out in ascending order
    operations.extend(
        local
            .folders
            .difference(&remote.folders)
            .filter(|path| !path.is_empty())
            .map(|path| SyncOperation::CreateFolder { path: path.clone() }),
    );

    operations.extend(
        remote
            .files
            .iter()
            .filter(|path| !local.files.contains_key(*path))
            .map(|path| SyncOperation::DeleteFile { path: path.clone() }),
    );

    operations.extend(
        remote
            .folders
            .iter()
            .rev()
            .filter(|path| !path.is_empty() && !local.folders.contains(*path))
            .map(|path| SyncOperation::DeleteFolder { path: path.clone() }),
    );

    operations.extend(
        local
            .files
            .iter()
            .filter(|(path, _)| !remote.files.contains(*path))
            .map(|(path, file)| SyncOperation::UploadFile {
                path: path.clone(),
                source: file.source.clone(),
            }),
    );

    SyncPlan { operations }
}
