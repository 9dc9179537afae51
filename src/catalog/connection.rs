//! Read-only access to the Zotero catalog
//!
//! Resolves where the storage directory and database live, then opens the
//! database without ever taking a write lock.

use rusqlite::{Connection, OpenFlags};
use std::path::{Path, PathBuf};

use crate::error::{QuadernoError, Result};

/// Name of the attachment storage directory inside a Zotero data directory
pub const STORAGE_DIR_NAME: &str = "storage";

/// Conventional database file name inside a Zotero data directory
pub const DATABASE_FILE_NAME: &str = "zotero.sqlite";

/// Default Zotero data directory, `~/Zotero`
pub fn default_data_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join("Zotero"))
}

/// Resolved locations of the storage root and database file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogPaths {
    pub storage_root: PathBuf,
    pub database: PathBuf,
}

impl CatalogPaths {
    /// Resolve user-supplied (or default) locations.
    ///
    /// A storage path that is not itself a storage root is probed for a nested
    /// `storage` directory; a catalog path that is a directory is probed for
    /// `zotero.sqlite`. Fails with `CatalogNotFound` when either cannot be found.
    pub fn resolve(storage: Option<&Path>, catalog: Option<&Path>) -> Result<Self> {
        let data_dir = default_data_dir();

        let storage = match storage {
            Some(path) => expand(path),
            None => data_dir
                .as_ref()
                .map(|dir| dir.join(STORAGE_DIR_NAME))
                .ok_or_else(|| {
                    QuadernoError::CatalogNotFound("cannot determine home directory".to_string())
                })?,
        };
        let catalog = match catalog {
            Some(path) => expand(path),
            None => data_dir
                .as_ref()
                .map(|dir| dir.join(DATABASE_FILE_NAME))
                .ok_or_else(|| {
                    QuadernoError::CatalogNotFound("cannot determine home directory".to_string())
                })?,
        };

        Ok(Self {
            storage_root: resolve_storage_root(&storage)?,
            database: resolve_database(&catalog)?,
        })
    }
}

fn expand(path: &Path) -> PathBuf {
    match path.to_str() {
        Some(s) => PathBuf::from(shellexpand::tilde(s).into_owned()),
        None => path.to_path_buf(),
    }
}

fn resolve_storage_root(path: &Path) -> Result<PathBuf> {
    if path.is_dir() && path.file_name().is_some_and(|name| name == STORAGE_DIR_NAME) {
        return Ok(path.to_path_buf());
    }

    let nested = path.join(STORAGE_DIR_NAME);
    if nested.is_dir() {
        return Ok(nested);
    }

    if path.is_dir() {
        return Ok(path.to_path_buf());
    }

    Err(QuadernoError::CatalogNotFound(format!(
        "storage folder not found at {}",
        path.display()
    )))
}

fn resolve_database(path: &Path) -> Result<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }

    if path.is_dir() {
        let nested = path.join(DATABASE_FILE_NAME);
        if nested.is_file() {
            return Ok(nested);
        }
    }

    Err(QuadernoError::CatalogNotFound(format!(
        "database file not found at {}",
        path.display()
    )))
}

/// Read-only handle on the catalog database
pub struct Catalog {
    conn: Connection,
}

impl Catalog {
    /// Open the database read-only
    pub fn open(path: &Path) -> Result<Self> {
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(path, flags)?;

        // Zotero keeps the database open while running
        conn.busy_timeout(std::time::Duration::from_secs(30))?;

        Ok(Self { conn })
    }

    /// Wrap an existing connection (in-memory catalogs in tests)
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    /// Execute a function with the connection
    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        f(&self.conn)
    }

    /// Close the connection, surfacing any error from SQLite
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| QuadernoError::Database(e))
    }
}
