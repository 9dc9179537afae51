//! Local snapshot construction
//!
//! Combines the collection walk with the attachment query and the storage
//! directory to produce the set of folders and PDFs the device should hold.

use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::Connection;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use super::connection::{Catalog, CatalogPaths};
use super::paths::{ancestor_folders, CollectionPaths};
use super::queries::{deleted_collection_ids, load_collections, load_pdf_attachments};
use crate::error::Result;
use crate::types::{ItemId, LocalFile, LocalSnapshot, UNCATEGORIZED_FOLDER};

/// Format of `items.dateModified`
pub const CATALOG_DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Read the full local snapshot. The catalog is closed before returning.
pub fn read_local_snapshot(paths: &CatalogPaths) -> Result<LocalSnapshot> {
    let catalog = Catalog::open(&paths.database)?;
    let snapshot =
        catalog.with_connection(|conn| build_local_snapshot(conn, &paths.storage_root))?;
    catalog.close()?;

    tracing::info!(
        "Local snapshot: {} folders, {} files",
        snapshot.folders.len(),
        snapshot.files.len()
    );
    Ok(snapshot)
}

/// Read only the collection folder set
pub fn read_local_folder_set(paths: &CatalogPaths) -> Result<BTreeSet<String>> {
    let catalog = Catalog::open(&paths.database)?;
    let folders = catalog.with_connection(build_folder_set)?;
    catalog.close()?;
    Ok(folders)
}

/// Collection folder set from an open connection
pub fn build_folder_set(conn: &Connection) -> Result<BTreeSet<String>> {
    let excluded = deleted_collection_ids(conn)?;
    let collections = load_collections(conn, &excluded)?;
    Ok(CollectionPaths::new(&collections).folder_set())
}

/// Local snapshot from an open connection and a storage root
pub fn build_local_snapshot(conn: &Connection, storage_root: &Path) -> Result<LocalSnapshot> {
    let excluded = deleted_collection_ids(conn)?;
    let collections = load_collections(conn, &excluded)?;
    let mut paths = CollectionPaths::new(&collections);

    let mut folders = paths.folder_set();
    let mut files = BTreeMap::new();

    for row in load_pdf_attachments(conn)? {
        let folder = row
            .collection_id
            .and_then(|id| paths.resolve(id))
            .filter(|path| !path.is_empty())
            .unwrap_or_else(|| UNCATEGORIZED_FOLDER.to_string());

        let dir = storage_root.join(&row.key);
        let Some((file_name, source)) = select_pdf(&dir) else {
            tracing::debug!("No PDF for item {} in {}", row.item_id, dir.display());
            continue;
        };

        let Some(modified) = modification_time(row.date_modified.as_deref(), &source) else {
            tracing::warn!(
                "Skipping item {}: cannot read modification time of {}",
                row.item_id,
                source.display()
            );
            continue;
        };

        let remote_path = format!("{}/{}", folder, unique_file_name(&file_name, row.item_id));
        files.insert(remote_path, LocalFile { source, modified });
    }

    // Parent folders of every file must exist too (Uncategorized among them)
    for path in files.keys() {
        for ancestor in ancestor_folders(path) {
            if !folders.contains(ancestor) {
                folders.insert(ancestor.to_string());
            }
        }
    }

    Ok(LocalSnapshot { folders, files })
}

/// Pick the PDF inside an attachment directory.
///
/// The lexicographically smallest `*.pdf` name wins when there are several.
pub fn select_pdf(dir: &Path) -> Option<(String, PathBuf)> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return None,
    };

    entries
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().is_file())
        .filter_map(|entry| match entry.file_name().into_string() {
            Ok(name) => Some(name),
            Err(name) => {
                tracing::debug!("Skipping non-UTF-8 file name {:?} in {}", name, dir.display());
                None
            }
        })
        .filter(|name| name.to_lowercase().ends_with(".pdf"))
        .min()
        .map(|name| {
            let path = dir.join(&name);
            (name, path)
        })
}

/// `paper.pdf` + 42 -> `paper (itemID 42).pdf`
pub fn unique_file_name(file_name: &str, item_id: ItemId) -> String {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => {
            let (base, ext) = file_name.split_at(idx);
            format!("{} (itemID {}){}", base, item_id, ext)
        }
        _ => format!("{} (itemID {})", file_name, item_id),
    }
}

fn modification_time(date_modified: Option<&str>, file: &Path) -> Option<DateTime<Utc>> {
    if let Some(parsed) =
        date_modified.and_then(|s| NaiveDateTime::parse_from_str(s, CATALOG_DATE_FORMAT).ok())
    {
        return Some(parsed.and_utc());
    }

    std::fs::metadata(file)
        .and_then(|meta| meta.modified())
        .ok()
        .map(DateTime::<Utc>::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::queries::fixtures::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn write_pdf(storage: &Path, key: &str, name: &str) -> PathBuf {
        let dir = storage.join(key);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, b"%PDF-1.4\n").unwrap();
        path
    }

    #[test]
    fn test_unique_file_name() {
        assert_eq!(unique_file_name("paper.pdf", 7), "paper (itemID 7).pdf");
        assert_eq!(unique_file_name("a.b.PDF", 1), "a.b (itemID 1).PDF");
        assert_eq!(unique_file_name(".pdf", 2), ".pdf (itemID 2)");
    }

    #[test]
    fn test_select_pdf_is_deterministic() {
        let storage = tempdir().unwrap();
        write_pdf(storage.path(), "KEY", "zeta.pdf");
        write_pdf(storage.path(), "KEY", "Alpha.PDF");
        std::fs::write(storage.path().join("KEY/notes.txt"), b"x").unwrap();

        let (name, path) = select_pdf(&storage.path().join("KEY")).unwrap();
        assert_eq!(name, "Alpha.PDF");
        assert_eq!(path, storage.path().join("KEY/Alpha.PDF"));
    }

    #[cfg(unix)]
    #[test]
    fn test_select_pdf_follows_symlinks() {
        let storage = tempdir().unwrap();
        let target = write_pdf(storage.path(), "REAL", "linked.pdf");
        let dir = storage.path().join("KEY");
        std::fs::create_dir(&dir).unwrap();
        std::os::unix::fs::symlink(&target, dir.join("linked.pdf")).unwrap();
        std::os::unix::fs::symlink(storage.path().join("REAL"), dir.join("a_dir.pdf")).unwrap();

        let (name, path) = select_pdf(&dir).unwrap();
        assert_eq!(name, "linked.pdf");
        assert_eq!(path, dir.join("linked.pdf"));
    }

    #[test]
    fn test_select_pdf_missing_or_empty() {
        let storage = tempdir().unwrap();
        assert!(select_pdf(&storage.path().join("NOPE")).is_none());

        std::fs::create_dir(storage.path().join("EMPTY")).unwrap();
        assert!(select_pdf(&storage.path().join("EMPTY")).is_none());
    }

    #[test]
    fn test_snapshot_paths_and_fallbacks() {
        let storage = tempdir().unwrap();
        let conn = catalog();
        collection(&conn, 1, "Papers", None);
        collection(&conn, 2, "2023", Some(1));
        collection(&conn, 3, "Gone", None);
        conn.execute("INSERT INTO deletedCollections VALUES (3)", [])
            .unwrap();

        attachment(&conn, 7, "KEY00007", None, "application/pdf");
        link(&conn, 2, 7);
        write_pdf(storage.path(), "KEY00007", "foo.pdf");

        // Collection was trashed, so it falls back to Uncategorized
        attachment(&conn, 8, "KEY00008", None, "application/pdf");
        link(&conn, 3, 8);
        write_pdf(storage.path(), "KEY00008", "bar.pdf");

        // No file on disk
        attachment(&conn, 9, "KEY00009", None, "application/pdf");
        link(&conn, 1, 9);

        let snapshot = build_local_snapshot(&conn, storage.path()).unwrap();

        let files: Vec<_> = snapshot.files.keys().cloned().collect();
        assert_eq!(
            files,
            vec![
                "Papers/2023/foo (itemID 7).pdf".to_string(),
                "Uncategorized/bar (itemID 8).pdf".to_string(),
            ]
        );

        let folders: Vec<_> = snapshot.folders.iter().cloned().collect();
        assert_eq!(
            folders,
            vec![
                "Papers".to_string(),
                "Papers/2023".to_string(),
                "Uncategorized".to_string(),
            ]
        );

        let foo = &snapshot.files["Papers/2023/foo (itemID 7).pdf"];
        assert_eq!(foo.source, storage.path().join("KEY00007/foo.pdf"));
        assert_eq!(
            foo.modified,
            Utc.with_ymd_and_hms(2024, 3, 5, 10, 20, 30).unwrap()
        );
    }

    #[test]
    fn test_same_name_different_items_do_not_collide() {
        let storage = tempdir().unwrap();
        let conn = catalog();
        collection(&conn, 1, "Papers", None);
        for (id, key) in [(11, "KEY00011"), (12, "KEY00012")] {
            attachment(&conn, id, key, None, "application/pdf");
            link(&conn, 1, id);
            write_pdf(storage.path(), key, "paper.pdf");
        }

        let snapshot = build_local_snapshot(&conn, storage.path()).unwrap();
        assert_eq!(snapshot.files.len(), 2);
        assert!(snapshot
            .files
            .contains_key("Papers/paper (itemID 11).pdf"));
        assert!(snapshot
            .files
            .contains_key("Papers/paper (itemID 12).pdf"));
    }

    #[test]
    fn test_unparseable_date_uses_file_mtime() {
        let storage = tempdir().unwrap();
        let conn = catalog();
        attachment(&conn, 1, "KEY00001", None, "application/pdf");
        conn.execute("UPDATE items SET dateModified = 'yesterday' WHERE itemID = 1", [])
            .unwrap();
        let pdf = write_pdf(storage.path(), "KEY00001", "x.pdf");

        let snapshot = build_local_snapshot(&conn, storage.path()).unwrap();
        let file = &snapshot.files["Uncategorized/x (itemID 1).pdf"];
        let mtime: DateTime<Utc> = std::fs::metadata(&pdf).unwrap().modified().unwrap().into();
        assert_eq!(file.modified, mtime);
    }

    #[test]
    fn test_folder_set_projection() {
        let conn = catalog();
        collection(&conn, 1, "Papers", None);
        collection(&conn, 2, "Books", None);
        attachment(&conn, 5, "KEY00005", None, "application/pdf");

        let folders = build_folder_set(&conn).unwrap();
        let folders: Vec<_> = folders.into_iter().collect();
        assert_eq!(folders, vec!["Books".to_string(), "Papers".to_string()]);
    }
}
