//! Collection folder paths
//!
//! Turns the collection forest into `/`-joined folder paths. The walk is
//! iterative and memoized; a parent chain that loops back on itself is cut at
//! the revisited node, which is then treated as a root.

use std::collections::{BTreeSet, HashMap, HashSet};

use crate::types::{CollectionId, CollectionNode};

/// Make a collection name safe to use as a single folder level
pub fn sanitize_component(name: &str) -> String {
    name.trim()
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect()
}

/// Resolves and caches folder paths for a set of collections
pub struct CollectionPaths<'a> {
    collections: &'a HashMap<CollectionId, CollectionNode>,
    resolved: HashMap<CollectionId, String>,
}

impl<'a> CollectionPaths<'a> {
    pub fn new(collections: &'a HashMap<CollectionId, CollectionNode>) -> Self {
        Self {
            collections,
            resolved: HashMap::new(),
        }
    }

    /// Folder path for a collection, or `None` for an unknown id.
    ///
    /// The result may be empty when every name on the chain is blank.
    pub fn resolve(&mut self, id: CollectionId) -> Option<String> {
        let collections = self.collections;
        if !collections.contains_key(&id) {
            return None;
        }
        if let Some(path) = self.resolved.get(&id) {
            return Some(path.clone());
        }

        // Walk up until a root, a missing parent, a memoized ancestor, or a cycle
        let mut chain = Vec::new();
        let mut visiting = HashSet::new();
        let mut base = String::new();
        let mut current = Some(id);

        while let Some(node_id) = current {
            if let Some(path) = self.resolved.get(&node_id) {
                base = path.clone();
                break;
            }
            let Some(node) = collections.get(&node_id) else {
                break;
            };
            if !visiting.insert(node_id) {
                tracing::warn!(
                    "Collection {} has a cyclic parent chain; treating it as a root",
                    node_id
                );
                break;
            }
            chain.push(node);
            current = node.parent_id;
        }

        // Build from the top of the chain down, memoizing each level
        let mut path = base;
        for node in chain.into_iter().rev() {
            let name = sanitize_component(&node.name);
            if !name.is_empty() {
                if path.is_empty() {
                    path = name;
                } else {
                    path = format!("{}/{}", path, name);
                }
            }
            self.resolved.insert(node.id, path.clone());
        }

        self.resolved.get(&id).cloned()
    }

    /// Every non-empty collection folder path
    pub fn folder_set(&mut self) -> BTreeSet<String> {
        let mut ids: Vec<CollectionId> = self.collections.keys().copied().collect();
        // Sorted so that cyclic chains break at the same node every run
        ids.sort_unstable();
        ids.into_iter()
            .filter_map(|id| self.resolve(id))
            .filter(|path| !path.is_empty())
            .collect()
    }
}

/// All proper ancestor folders of a relative path (`a/b/c.pdf` -> `a`, `a/b`)
pub fn ancestor_folders(path: &str) -> impl Iterator<Item = &str> {
    path.match_indices('/').map(move |(idx, _)| &path[..idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: i64, name: &str, parent: Option<i64>) -> (i64, CollectionNode) {
        (
            id,
            CollectionNode {
                id,
                name: name.to_string(),
                parent_id: parent,
            },
        )
    }

    #[test]
    fn test_nested_paths() {
        let collections: HashMap<_, _> = [
            node(1, "Papers", None),
            node(2, "2023", Some(1)),
            node(3, "Drafts", Some(2)),
        ]
        .into_iter()
        .collect();

        let mut paths = CollectionPaths::new(&collections);
        assert_eq!(paths.resolve(3).as_deref(), Some("Papers/2023/Drafts"));
        assert_eq!(paths.resolve(2).as_deref(), Some("Papers/2023"));
        assert_eq!(paths.resolve(1).as_deref(), Some("Papers"));
        assert_eq!(paths.resolve(42), None);
    }

    #[test]
    fn test_missing_parent_is_root() {
        let collections: HashMap<_, _> = [node(2, "Orphan", Some(99))].into_iter().collect();
        let mut paths = CollectionPaths::new(&collections);
        assert_eq!(paths.resolve(2).as_deref(), Some("Orphan"));
    }

    #[test]
    fn test_cycle_terminates() {
        let collections: HashMap<_, _> = [node(1, "A", Some(2)), node(2, "B", Some(1))]
            .into_iter()
            .collect();

        let mut paths = CollectionPaths::new(&collections);
        // Starting at 1: chain 1 -> 2 -> (1 revisited), so 2 is the root
        assert_eq!(paths.resolve(1).as_deref(), Some("B/A"));
        assert_eq!(paths.resolve(2).as_deref(), Some("B"));
    }

    #[test]
    fn test_self_parent() {
        let collections: HashMap<_, _> = [node(7, "Loop", Some(7))].into_iter().collect();
        let mut paths = CollectionPaths::new(&collections);
        assert_eq!(paths.resolve(7).as_deref(), Some("Loop"));
    }

    #[test]
    fn test_folder_set_skips_blank_and_sanitizes() {
        let collections: HashMap<_, _> = [
            node(1, "  ", None),
            node(2, "AC/DC", None),
            node(3, "Live", Some(1)),
        ]
        .into_iter()
        .collect();

        let mut paths = CollectionPaths::new(&collections);
        let folders: Vec<_> = paths.folder_set().into_iter().collect();
        assert_eq!(folders, vec!["AC_DC".to_string(), "Live".to_string()]);
    }

    #[test]
    fn test_ancestor_folders() {
        let ancestors: Vec<_> = ancestor_folders("a/b/c.pdf").collect();
        assert_eq!(ancestors, vec!["a", "a/b"]);
        assert_eq!(ancestor_folders("top.pdf").count(), 0);
    }
}
