//! Catalog queries
//!
//! Only two questions are ever asked of the Zotero database: which collections
//! exist, and which PDF attachments are live. Soft-delete tables are optional
//! and checked before use.

use rusqlite::{params, Connection, Row};
use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::types::{CollectionId, CollectionNode, ItemId};

/// Item type id Zotero assigns to attachments
pub const ATTACHMENT_ITEM_TYPE_ID: i64 = 3;

/// Content type accepted for sync
pub const PDF_CONTENT_TYPE: &str = "application/pdf";

/// An attachment row eligible for sync
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentRow {
    pub item_id: ItemId,
    /// Storage key; names the attachment's directory under the storage root
    pub key: String,
    pub date_modified: Option<String>,
    pub content_type: String,
    /// Owning collection: the item's own, else its parent item's
    pub collection_id: Option<CollectionId>,
}

/// Check whether a table exists in the database
pub fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?",
        params![table],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// IDs of collections sitting in the trash. Empty when the table is absent.
pub fn deleted_collection_ids(conn: &Connection) -> Result<HashSet<CollectionId>> {
    if !table_exists(conn, "deletedCollections")? {
        return Ok(HashSet::new());
    }

    let mut stmt = conn.prepare("SELECT collectionID FROM deletedCollections")?;
    let ids = stmt
        .query_map([], |row| row.get::<_, CollectionId>(0))?
        .collect::<rusqlite::Result<HashSet<_>>>()?;
    Ok(ids)
}

fn collection_from_row(row: &Row) -> rusqlite::Result<CollectionNode> {
    Ok(CollectionNode {
        id: row.get(0)?,
        name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
        parent_id: row.get(2)?,
    })
}

/// Load every collection not in `excluded`, keyed by id
pub fn load_collections(
    conn: &Connection,
    excluded: &HashSet<CollectionId>,
) -> Result<HashMap<CollectionId, CollectionNode>> {
    let mut stmt =
        conn.prepare("SELECT collectionID, collectionName, parentCollectionID FROM collections")?;
    let rows = stmt.query_map([], collection_from_row)?;

    let mut collections = HashMap::new();
    for row in rows {
        let node = row?;
        if excluded.contains(&node.id) {
            continue;
        }
        collections.insert(node.id, node);
    }
    Ok(collections)
}

/// Load live PDF attachments with their owning collection resolved.
///
/// A standalone attachment uses its own lowest collection id; a child
/// attachment inherits the lowest collection id of its parent item.
pub fn load_pdf_attachments(conn: &Connection) -> Result<Vec<AttachmentRow>> {
    let deleted_filter = if table_exists(conn, "deletedItems")? {
        "AND NOT EXISTS (
             SELECT 1 FROM deletedItems di
             WHERE di.itemID = i.itemID OR di.itemID = ia.parentItemID
         )"
    } else {
        ""
    };

    let sql = format!(
        "SELECT
            COALESCE(
                (SELECT MIN(ci.collectionID) FROM collectionItems ci WHERE ci.itemID = i.itemID),
                (SELECT MIN(ci2.collectionID) FROM collectionItems ci2 WHERE ci2.itemID = ia.parentItemID)
            ) AS collectionID,
            i.itemID, i.key, i.dateModified, ia.contentType
         FROM items i
         JOIN itemAttachments ia ON i.itemID = ia.itemID
         WHERE i.itemTypeID = ?1
           AND ia.contentType LIKE ?2
           {}
         ORDER BY i.itemID",
        deleted_filter
    );

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![ATTACHMENT_ITEM_TYPE_ID, PDF_CONTENT_TYPE], |row| {
        Ok(AttachmentRow {
            collection_id: row.get(0)?,
            item_id: row.get(1)?,
            key: row.get(2)?,
            date_modified: row.get(3)?,
            content_type: row.get(4)?,
        })
    })?;

    let attachments = rows.collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(attachments)
}
