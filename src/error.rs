//! Error types for Quaderno

use thiserror::Error;

/// Result type alias for Quaderno operations
pub type Result<T> = std::result::Result<T, QuadernoError>;

/// Main error type for Quaderno
#[derive(Error, Debug)]
pub enum QuadernoError {
    #[error("Catalog not found: {0}")]
    CatalogNotFound(String),

    #[error("Remote listing failed: {0}")]
    RemoteListingFailed(String),

    #[error("Remote store error: {0}")]
    Remote(String),

    #[error("{operation} failed: {message}")]
    OperationFailed { operation: String, message: String },

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Sync error: {0}")]
    Sync(String),
}

impl QuadernoError {
    /// Check if the error aborts a whole sync invocation.
    ///
    /// Per-operation failures (`Remote`, `OperationFailed`) are logged by the
    /// executor and never stop the remaining plan.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            QuadernoError::CatalogNotFound(_)
                | QuadernoError::RemoteListingFailed(_)
                | QuadernoError::Database(_)
                | QuadernoError::Config(_)
        )
    }

    /// Short machine-readable code used by the CLI exit status
    pub fn code(&self) -> i32 {
        match self {
            QuadernoError::CatalogNotFound(_) => 3,
            QuadernoError::RemoteListingFailed(_) => 4,
            QuadernoError::Config(_) => 2,
            _ => 1,
        }
    }
}
