//! Quaderno - Zotero to DigitalPaper sync
//!
//! Mirrors the collections and PDF attachments of a Zotero library onto the
//! document tree of a DigitalPaper device.

pub mod catalog;
pub mod error;
pub mod remote;
pub mod sync;
pub mod types;

pub use error::{QuadernoError, Result};
pub use remote::RemoteStore;
pub use types::*;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
