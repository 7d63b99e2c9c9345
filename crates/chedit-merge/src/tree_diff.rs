//! Tree-level diff: compare two trees and produce a list of changes.
//!
//! Compares entries by path, detecting additions, deletions, modifications,
//! and mode changes. A deleted path and an added path with the same blob
//! are reported as a rename.

use std::collections::{BTreeMap, HashSet};

use chedit_store::{EntryMode, ObjectStore, Tree, TreeEntry};
use chedit_types::ObjectId;

use crate::error::MergeResult;

/// The result of comparing two trees.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TreeDiff {
    pub changes: Vec<TreeChange>,
}

impl TreeDiff {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Every path touched by the diff, sorted and deduplicated.
    pub fn paths(&self) -> Vec<&str> {
        let mut paths: Vec<&str> = self
            .changes
            .iter()
            .flat_map(|c| match c {
                TreeChange::Renamed {
                    old_path, new_path, ..
                } => vec![old_path.as_str(), new_path.as_str()],
                other => vec![other.path()],
            })
            .collect();
        paths.sort_unstable();
        paths.dedup();
        paths
    }
}

/// A single change between two trees.
#[derive(Clone, Debug, PartialEq)]
pub enum TreeChange {
    Added {
        path: String,
        new_id: ObjectId,
        mode: EntryMode,
    },
    Deleted {
        path: String,
        old_id: ObjectId,
        mode: EntryMode,
    },
    /// Same path, different blob.
    Modified {
        path: String,
        old_id: ObjectId,
        new_id: ObjectId,
        mode: EntryMode,
    },
    /// Same blob moved to a new path.
    Renamed {
        old_path: String,
        new_path: String,
        id: ObjectId,
    },
    ModeChanged {
        path: String,
        id: ObjectId,
        old_mode: EntryMode,
        new_mode: EntryMode,
    },
}

impl TreeChange {
    /// The path this change lands on (the new path for a rename).
    pub fn path(&self) -> &str {
        match self {
            Self::Added { path, .. }
            | Self::Deleted { path, .. }
            | Self::Modified { path, .. }
            | Self::ModeChanged { path, .. } => path,
            Self::Renamed { new_path, .. } => new_path,
        }
    }
}

/// Compare two stored trees. `old_tree = None` means the empty tree.
pub fn diff_trees(
    store: &dyn ObjectStore,
    old_tree: Option<&ObjectId>,
    new_tree: &ObjectId,
) -> MergeResult<TreeDiff> {
    let old = match old_tree {
        Some(id) => store.read_tree(id)?,
        None => Tree::empty(),
    };
    let new = store.read_tree(new_tree)?;
    Ok(diff_tree_objects(Some(&old), &new))
}

/// Compare two trees given directly as [`Tree`] values.
pub fn diff_tree_objects(old_tree: Option<&Tree>, new_tree: &Tree) -> TreeDiff {
    let old = old_tree.map(entries_to_map).unwrap_or_default();
    let new = entries_to_map(new_tree);
    diff_tree_entries(&old, &new)
}

fn entries_to_map(tree: &Tree) -> BTreeMap<&str, &TreeEntry> {
    tree.entries().iter().map(|e| (e.path.as_str(), e)).collect()
}

fn diff_tree_entries(
    old: &BTreeMap<&str, &TreeEntry>,
    new: &BTreeMap<&str, &TreeEntry>,
) -> TreeDiff {
    let mut changes = Vec::new();
    let mut deleted: Vec<&TreeEntry> = Vec::new();

    for (path, old_entry) in old {
        match new.get(path) {
            Some(new_entry) if old_entry.object_id != new_entry.object_id => {
                changes.push(TreeChange::Modified {
                    path: path.to_string(),
                    old_id: old_entry.object_id,
                    new_id: new_entry.object_id,
                    mode: new_entry.mode,
                });
            }
            Some(new_entry) if old_entry.mode != new_entry.mode => {
                changes.push(TreeChange::ModeChanged {
                    path: path.to_string(),
                    id: old_entry.object_id,
                    old_mode: old_entry.mode,
                    new_mode: new_entry.mode,
                });
            }
            Some(_) => {}
            None => deleted.push(*old_entry),
        }
    }

    let added: Vec<&TreeEntry> = new
        .iter()
        .filter(|(path, _)| !old.contains_key(*path))
        .map(|(_, e)| *e)
        .collect();

    // Rename detection: pair each deletion with the first unmatched
    // addition of the same blob.
    let mut matched_adds = HashSet::new();
    let mut unmatched_deletes = Vec::new();
    for del in deleted {
        let partner = added
            .iter()
            .enumerate()
            .find(|(i, add)| add.object_id == del.object_id && !matched_adds.contains(i));
        match partner {
            Some((i, add)) => {
                matched_adds.insert(i);
                changes.push(TreeChange::Renamed {
                    old_path: del.path.clone(),
                    new_path: add.path.clone(),
                    id: del.object_id,
                });
            }
            None => unmatched_deletes.push(del),
        }
    }

    for del in unmatched_deletes {
        changes.push(TreeChange::Deleted {
            path: del.path.clone(),
            old_id: del.object_id,
            mode: del.mode,
        });
    }
    for (i, add) in added.iter().enumerate() {
        if !matched_adds.contains(&i) {
            changes.push(TreeChange::Added {
                path: add.path.clone(),
                new_id: add.object_id,
                mode: add.mode,
            });
        }
    }

    TreeDiff { changes }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chedit_store::InMemoryObjectStore;

    fn oid(b: u8) -> ObjectId {
        ObjectId::from_hash([b; 32])
    }

    fn entry(path: &str, id: ObjectId, mode: EntryMode) -> TreeEntry {
        TreeEntry::new(path, mode, id)
    }

    #[test]
    fn empty_to_populated_all_additions() {
        let new_tree = Tree::new(vec![
            entry("a.txt", oid(1), EntryMode::Regular),
            entry("b.txt", oid(2), EntryMode::Regular),
        ]);
        let diff = diff_tree_objects(None, &new_tree);
        assert_eq!(diff.len(), 2);
        assert!(diff.changes.iter().all(|c| matches!(c, TreeChange::Added { .. })));
    }

    #[test]
    fn identical_trees_no_changes() {
        let tree = Tree::new(vec![entry("file.txt", oid(1), EntryMode::Regular)]);
        assert!(diff_tree_objects(Some(&tree), &tree).is_empty());
    }

    #[test]
    fn mode_change_detection() {
        let old_tree = Tree::new(vec![entry("run.sh", oid(1), EntryMode::Regular)]);
        let new_tree = Tree::new(vec![entry("run.sh", oid(1), EntryMode::Executable)]);
        let diff = diff_tree_objects(Some(&old_tree), &new_tree);
        assert!(matches!(
            &diff.changes[..],
            [TreeChange::ModeChanged {
                old_mode: EntryMode::Regular,
                new_mode: EntryMode::Executable,
                ..
            }]
        ));
    }

    #[test]
    fn rename_detection_exact_match() {
        let old_tree = Tree::new(vec![entry("src/old.rs", oid(1), EntryMode::Regular)]);
        let new_tree = Tree::new(vec![entry("src/new.rs", oid(1), EntryMode::Regular)]);
        let diff = diff_tree_objects(Some(&old_tree), &new_tree);
        match &diff.changes[..] {
            [TreeChange::Renamed {
                old_path, new_path, ..
            }] => {
                assert_eq!(old_path, "src/old.rs");
                assert_eq!(new_path, "src/new.rs");
            }
            other => panic!("expected a single rename, got {other:?}"),
        }
        assert_eq!(diff.paths(), vec!["src/new.rs", "src/old.rs"]);
    }

    #[test]
    fn mixed_changes_from_store() {
        let store = InMemoryObjectStore::new();
        let old_tree = Tree::new(vec![
            entry("keep.txt", oid(1), EntryMode::Regular),
            entry("modify.txt", oid(2), EntryMode::Regular),
            entry("delete.txt", oid(3), EntryMode::Regular),
        ]);
        let new_tree = Tree::new(vec![
            entry("keep.txt", oid(1), EntryMode::Regular),
            entry("modify.txt", oid(4), EntryMode::Regular),
            entry("added.txt", oid(5), EntryMode::Regular),
        ]);
        let old_id = store.write(&old_tree.to_stored_object().unwrap()).unwrap();
        let new_id = store.write(&new_tree.to_stored_object().unwrap()).unwrap();

        let diff = diff_trees(&store, Some(&old_id), &new_id).unwrap();
        assert_eq!(diff.len(), 3);
        assert_eq!(diff.paths(), vec!["added.txt", "delete.txt", "modify.txt"]);
    }

    #[test]
    fn missing_tree_is_an_error() {
        let store = InMemoryObjectStore::new();
        assert!(diff_trees(&store, None, &oid(9)).is_err());
    }
}
