//! Remote tree snapshot

use super::{relative_to_root, EntryType, RemoteStore};
use crate::error::{QuadernoError, Result};
use crate::types::RemoteSnapshot;

/// List the device once and index everything below `remote_root`.
///
/// Entries outside the root, and the root itself, are discarded.
pub fn read_remote_snapshot(store: &dyn RemoteStore, remote_root: &str) -> Result<RemoteSnapshot> {
    let entries = store
        .list_all()
        .map_err(|e| QuadernoError::RemoteListingFailed(e.to_string()))?;

    let mut snapshot = RemoteSnapshot::default();
    for entry in entries {
        let Some(relative) = relative_to_root(&entry.path, remote_root) else {
            continue;
        };
        if relative.is_empty() {
            continue;
        }

        match entry.entry_type {
            EntryType::Document => {
                snapshot.files.insert(relative);
            }
            EntryType::Folder => {
                snapshot.folders.insert(relative);
            }
        }
    }

    tracing::info!(
        "Remote snapshot: {} folders, {} files under {}",
        snapshot.folders.len(),
        snapshot.files.len(),
        remote_root
    );
    Ok(snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::{MemoryStore, RemoteEntry};

    #[test]
    fn test_classifies_and_strips_root() {
        let store = MemoryStore::with_entries([
            RemoteEntry::folder("Document"),
            RemoteEntry::folder("Document/Zotero"),
            RemoteEntry::folder("Document/Zotero/Papers"),
            RemoteEntry::document("Document/Zotero/Papers/a (itemID 1).pdf"),
            RemoteEntry::document("Document/Zotero/loose.pdf"),
            RemoteEntry::document("Document/notes.pdf"),
            RemoteEntry::folder("Document/ZoteroOld"),
        ]);

        let snapshot = read_remote_snapshot(&store, "Document/Zotero").unwrap();
        let folders: Vec<_> = snapshot.folders.into_iter().collect();
        let files: Vec<_> = snapshot.files.into_iter().collect();
        assert_eq!(folders, vec!["Papers".to_string()]);
        assert_eq!(
            files,
            vec![
                "Papers/a (itemID 1).pdf".to_string(),
                "loose.pdf".to_string()
            ]
        );
    }

    #[test]
    fn test_listing_failure_is_fatal() {
        let store = MemoryStore::new();
        store.fail_listing(true);

        let result = read_remote_snapshot(&store, "Document/Zotero");
        assert!(matches!(result, Err(QuadernoError::RemoteListingFailed(_))));
    }
}
