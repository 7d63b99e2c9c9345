use serde::{Deserialize, Serialize};
use chedit_types::{ObjectId, PersonIdent};

use crate::error::{StoreError, StoreResult};
use crate::hasher::ContentHasher;

/// The kind of object stored.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ObjectKind {
    Blob,
    Tree,
    Commit,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Blob => write!(f, "blob"),
            Self::Tree => write!(f, "tree"),
            Self::Commit => write!(f, "commit"),
        }
    }
}

/// A stored object: kind tag + serialized data.
///
/// `StoredObject` is the unit of storage. The store never interprets the
/// bytes; typed views decode them on demand.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    pub kind: ObjectKind,
    pub data: Vec<u8>,
}

impl StoredObject {
    pub fn new(kind: ObjectKind, data: Vec<u8>) -> Self {
        Self { kind, data }
    }

    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// Compute the content-addressed ID for this object.
    pub fn compute_id(&self) -> ObjectId {
        let hasher = match self.kind {
            ObjectKind::Blob => &ContentHasher::BLOB,
            ObjectKind::Tree => &ContentHasher::TREE,
            ObjectKind::Commit => &ContentHasher::COMMIT,
        };
        hasher.hash(&self.data)
    }

    fn expect_kind(&self, kind: ObjectKind) -> StoreResult<()> {
        if self.kind != kind {
            return Err(StoreError::CorruptObject {
                id: self.compute_id(),
                reason: format!("expected {kind}, got {}", self.kind),
            });
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Blob
// ---------------------------------------------------------------------------

/// Raw file content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Blob {
    pub data: Vec<u8>,
}

impl Blob {
    pub fn new(data: Vec<u8>) -> Self {
        Self { data }
    }

    pub fn to_stored_object(&self) -> StoredObject {
        StoredObject::new(ObjectKind::Blob, self.data.clone())
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Blob)?;
        Ok(Self {
            data: obj.data.clone(),
        })
    }
}

// ---------------------------------------------------------------------------
// Tree
// ---------------------------------------------------------------------------

/// File mode for a tree entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryMode {
    /// Normal file (0o100644).
    Regular,
    /// Executable file (0o100755).
    Executable,
    /// Symbolic link (0o120000).
    Symlink,
}

impl EntryMode {
    pub fn mode_bits(&self) -> u32 {
        match self {
            Self::Regular => 0o100644,
            Self::Executable => 0o100755,
            Self::Symlink => 0o120000,
        }
    }

    pub fn from_mode_bits(bits: u32) -> Option<Self> {
        match bits {
            0o100644 => Some(Self::Regular),
            0o100755 => Some(Self::Executable),
            0o120000 => Some(Self::Symlink),
            _ => None,
        }
    }
}

impl std::fmt::Display for EntryMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06o}", self.mode_bits())
    }
}

/// One file in a tree: full slash-separated path, mode, and blob id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    pub mode: EntryMode,
    pub object_id: ObjectId,
}

impl TreeEntry {
    pub fn new(path: impl Into<String>, mode: EntryMode, object_id: ObjectId) -> Self {
        Self {
            path: path.into(),
            mode,
            object_id,
        }
    }
}

/// Flat snapshot of a project: every file path mapped to its content.
///
/// Entries are kept sorted by path with no duplicates, so equal file sets
/// always serialize (and hash) identically.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tree {
    entries: Vec<TreeEntry>,
}

impl Tree {
    /// Build a tree from entries. A later entry for the same path wins.
    pub fn new(entries: Vec<TreeEntry>) -> Self {
        let mut tree = Self::empty();
        for entry in entries {
            tree.upsert(entry);
        }
        tree
    }

    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        let data =
            serde_json::to_vec(self).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(StoredObject::new(ObjectKind::Tree, data))
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Tree)?;
        let tree: Self = serde_json::from_slice(&obj.data)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        if tree.entries.windows(2).any(|w| w[0].path >= w[1].path) {
            return Err(StoreError::CorruptObject {
                id: obj.compute_id(),
                reason: "tree entries are not strictly sorted".into(),
            });
        }
        Ok(tree)
    }

    pub fn entries(&self) -> &[TreeEntry] {
        &self.entries
    }

    pub fn get(&self, path: &str) -> Option<&TreeEntry> {
        self.position(path).ok().map(|i| &self.entries[i])
    }

    pub fn contains(&self, path: &str) -> bool {
        self.position(path).is_ok()
    }

    /// Insert or replace the entry at `entry.path`. Returns the replaced entry.
    pub fn upsert(&mut self, entry: TreeEntry) -> Option<TreeEntry> {
        match self.position(&entry.path) {
            Ok(i) => Some(std::mem::replace(&mut self.entries[i], entry)),
            Err(i) => {
                self.entries.insert(i, entry);
                None
            }
        }
    }

    pub fn remove(&mut self, path: &str) -> Option<TreeEntry> {
        self.position(path).ok().map(|i| self.entries.remove(i))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.path.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, path: &str) -> Result<usize, usize> {
        self.entries.binary_search_by(|e| e.path.as_str().cmp(path))
    }
}

// ---------------------------------------------------------------------------
// Commit
// ---------------------------------------------------------------------------

/// An immutable revision: a tree plus history and authorship.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    pub tree: ObjectId,
    /// Ordered parent ids; empty for a root commit.
    pub parents: Vec<ObjectId>,
    pub author: PersonIdent,
    pub committer: PersonIdent,
    /// Full message text, including footers.
    pub message: String,
}

impl Commit {
    pub fn to_stored_object(&self) -> StoreResult<StoredObject> {
        let data =
            serde_json::to_vec(self).map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(StoredObject::new(ObjectKind::Commit, data))
    }

    pub fn from_stored_object(obj: &StoredObject) -> StoreResult<Self> {
        obj.expect_kind(ObjectKind::Commit)?;
        serde_json::from_slice(&obj.data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    /// First line of the message.
    pub fn subject(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chedit_types::Timestamp;

    fn oid(b: u8) -> ObjectId {
        ObjectId::from_hash([b; 32])
    }

    fn commit(message: &str) -> Commit {
        let who = PersonIdent::new("A U Thor", "author@example.com", Timestamp::new(1_000, 0));
        Commit {
            tree: oid(1),
            parents: vec![oid(2)],
            author: who.clone(),
            committer: who,
            message: message.into(),
        }
    }

    #[test]
    fn blob_kind_mismatch_is_corrupt() {
        let stored = StoredObject::new(ObjectKind::Tree, b"not a blob".to_vec());
        let err = Blob::from_stored_object(&stored).unwrap_err();
        assert!(matches!(err, StoreError::CorruptObject { .. }));
    }

    #[test]
    fn tree_sorts_and_deduplicates_paths() {
        let tree = Tree::new(vec![
            TreeEntry::new("src/main.rs", EntryMode::Regular, oid(1)),
            TreeEntry::new("README", EntryMode::Regular, oid(2)),
            TreeEntry::new("src/main.rs", EntryMode::Executable, oid(3)),
        ]);
        let paths: Vec<&str> = tree.paths().collect();
        assert_eq!(paths, vec!["README", "src/main.rs"]);
        assert_eq!(tree.get("src/main.rs").unwrap().object_id, oid(3));
    }

    #[test]
    fn tree_upsert_and_remove() {
        let mut tree = Tree::empty();
        assert!(tree.upsert(TreeEntry::new("a", EntryMode::Regular, oid(1))).is_none());
        let replaced = tree.upsert(TreeEntry::new("a", EntryMode::Regular, oid(2)));
        assert_eq!(replaced.unwrap().object_id, oid(1));
        assert_eq!(tree.remove("a").unwrap().object_id, oid(2));
        assert!(tree.remove("a").is_none());
        assert!(tree.is_empty());
    }

    #[test]
    fn equal_file_sets_hash_equally() {
        let a = Tree::new(vec![
            TreeEntry::new("x", EntryMode::Regular, oid(1)),
            TreeEntry::new("y", EntryMode::Regular, oid(2)),
        ]);
        let b = Tree::new(vec![
            TreeEntry::new("y", EntryMode::Regular, oid(2)),
            TreeEntry::new("x", EntryMode::Regular, oid(1)),
        ]);
        assert_eq!(
            a.to_stored_object().unwrap().compute_id(),
            b.to_stored_object().unwrap().compute_id()
        );
    }

    #[test]
    fn unsorted_tree_bytes_are_rejected() {
        let json = serde_json::json!({
            "entries": [
                {"path": "b", "mode": "Regular", "object_id": oid(1)},
                {"path": "a", "mode": "Regular", "object_id": oid(2)},
            ]
        });
        let stored = StoredObject::new(ObjectKind::Tree, serde_json::to_vec(&json).unwrap());
        assert!(matches!(
            Tree::from_stored_object(&stored),
            Err(StoreError::CorruptObject { .. })
        ));
    }

    #[test]
    fn commit_id_depends_on_message() {
        let a = commit("Fix parser\n").to_stored_object().unwrap();
        let b = commit("Fix lexer\n").to_stored_object().unwrap();
        assert_ne!(a.compute_id(), b.compute_id());
        assert_eq!(Commit::from_stored_object(&a).unwrap().subject(), "Fix parser");
    }

    #[test]
    fn entry_mode_bits() {
        assert_eq!(EntryMode::Executable.to_string(), "100755");
        assert_eq!(EntryMode::from_mode_bits(0o120000), Some(EntryMode::Symlink));
        assert!(EntryMode::from_mode_bits(0o040000).is_none());
    }
}
