//! Three-way merge of flat trees.

use std::collections::BTreeSet;

use chedit_store::{Blob, ObjectInserter, Tree, TreeEntry};
use chedit_types::ObjectId;
use serde::Serialize;
use tracing::debug;

use crate::error::{MergeError, MergeResult};
use crate::text_merge::{merge_text, TextMerge};

/// Why a path could not be merged.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ConflictKind {
    /// Text content changed differently on both sides.
    Content,
    /// Non-text content changed differently on both sides.
    Binary,
    /// Added on both sides with content that does not merge.
    AddAdd,
    /// Modified on one side, deleted on the other.
    ModifyDelete,
    /// Both sides changed the file mode differently.
    Mode,
}

/// A path that could not be merged, with all three versions.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct MergeConflict {
    pub path: String,
    pub kind: ConflictKind,
    pub ancestor: Option<TreeEntry>,
    pub ours: Option<TreeEntry>,
    pub theirs: Option<TreeEntry>,
}

/// Outcome of [`merge_trees`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeMerge {
    /// The merged tree. Merged blobs have been added to the inserter.
    Clean(Tree),
    Conflicted(Vec<MergeConflict>),
}

/// Merge the trees `ours` and `theirs`, both derived from `base`.
///
/// Trees and blobs are read through `inserter`, so unflushed objects are
/// visible. Blobs produced by a content merge are inserted into it; the
/// merged tree itself is returned but not inserted.
pub fn merge_trees(
    inserter: &mut ObjectInserter<'_>,
    base: &ObjectId,
    ours: &ObjectId,
    theirs: &ObjectId,
) -> MergeResult<TreeMerge> {
    let base_tree = read_tree(inserter, base)?;
    let our_tree = read_tree(inserter, ours)?;
    let their_tree = read_tree(inserter, theirs)?;

    let paths: BTreeSet<&str> = base_tree
        .paths()
        .chain(our_tree.paths())
        .chain(their_tree.paths())
        .collect();

    let mut merged = Vec::new();
    let mut conflicts = Vec::new();
    for path in paths {
        let b = base_tree.get(path);
        let o = our_tree.get(path);
        let t = their_tree.get(path);
        match merge_entry(inserter, b, o, t)? {
            Ok(Some(entry)) => merged.push(entry),
            Ok(None) => {}
            Err(kind) => conflicts.push(MergeConflict {
                path: path.to_string(),
                kind,
                ancestor: b.cloned(),
                ours: o.cloned(),
                theirs: t.cloned(),
            }),
        }
    }

    if conflicts.is_empty() {
        debug!(entries = merged.len(), "trees merged cleanly");
        Ok(TreeMerge::Clean(Tree::new(merged)))
    } else {
        debug!(conflicts = conflicts.len(), "tree merge conflicted");
        Ok(TreeMerge::Conflicted(conflicts))
    }
}

/// Resolve one path. The outer result carries I/O errors; the inner one is
/// the merged entry (`None` for deleted) or the conflict kind.
fn merge_entry(
    inserter: &mut ObjectInserter<'_>,
    base: Option<&TreeEntry>,
    ours: Option<&TreeEntry>,
    theirs: Option<&TreeEntry>,
) -> MergeResult<Result<Option<TreeEntry>, ConflictKind>> {
    if ours == theirs || base == theirs {
        return Ok(Ok(ours.cloned()));
    }
    if base == ours {
        return Ok(Ok(theirs.cloned()));
    }
    let (Some(o), Some(t)) = (ours, theirs) else {
        return Ok(Err(ConflictKind::ModifyDelete));
    };

    let mode = match pick(base.map(|b| b.mode), o.mode, t.mode) {
        Some(mode) => mode,
        None => return Ok(Err(ConflictKind::Mode)),
    };
    if let Some(id) = pick(base.map(|b| b.object_id), o.object_id, t.object_id) {
        return Ok(Ok(Some(TreeEntry::new(o.path.clone(), mode, id))));
    }

    let base_data = match base {
        Some(b) => read_blob(inserter, &b.object_id)?,
        None => Vec::new(),
    };
    let our_data = read_blob(inserter, &o.object_id)?;
    let their_data = read_blob(inserter, &t.object_id)?;
    match merge_text(&base_data, &our_data, &their_data) {
        TextMerge::Clean(data) => {
            let id = inserter.insert_blob(data);
            Ok(Ok(Some(TreeEntry::new(o.path.clone(), mode, id))))
        }
        TextMerge::Conflict(why) => {
            debug!(path = %o.path, reason = %why, "content merge failed");
            let kind = if base.is_none() {
                ConflictKind::AddAdd
            } else if why.contains("binary") {
                ConflictKind::Binary
            } else {
                ConflictKind::Content
            };
            Ok(Err(kind))
        }
    }
}

/// Three-way choice of a scalar: the side that differs from the base wins.
/// `None` if both sides differ from the base and from each other.
fn pick<T: PartialEq + Copy>(base: Option<T>, ours: T, theirs: T) -> Option<T> {
    if ours == theirs || base == Some(theirs) {
        Some(ours)
    } else if base == Some(ours) {
        Some(theirs)
    } else {
        None
    }
}

fn read_tree(inserter: &ObjectInserter<'_>, id: &ObjectId) -> MergeResult<Tree> {
    let obj = inserter.read(id)?.ok_or(MergeError::ObjectNotFound(*id))?;
    Ok(Tree::from_stored_object(&obj)?)
}

fn read_blob(inserter: &ObjectInserter<'_>, id: &ObjectId) -> MergeResult<Vec<u8>> {
    let obj = inserter.read(id)?.ok_or(MergeError::ObjectNotFound(*id))?;
    Ok(Blob::from_stored_object(&obj)?.data)
}
