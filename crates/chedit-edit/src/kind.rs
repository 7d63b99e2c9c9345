//! Classifies how a new patch set relates to its predecessor.

use chedit_merge::diff_trees;
use chedit_types::ObjectId;
use tracing::debug;

use crate::collaborators::{ChangeKind, ChangeKindClassifier};
use crate::error::EditResult;
use crate::repo::Repository;

/// Compares trees, parents, and per-parent diffs.
///
/// - same commit: `NoChange`
/// - same tree and parents: `NoChange` if the message is also equal, else
///   `NoCodeChange`
/// - single parent on both sides, different parents, equal message and an
///   equal diff against the respective parent: `TrivialRebase`
/// - anything else: `Rework`
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultChangeKindClassifier;

impl ChangeKindClassifier for DefaultChangeKindClassifier {
    fn classify(
        &self,
        repo: &Repository,
        project: &str,
        prior: &ObjectId,
        next: &ObjectId,
    ) -> EditResult<ChangeKind> {
        if prior == next {
            return Ok(ChangeKind::NoChange);
        }
        let objects = repo.objects.as_ref();
        let old = objects.read_commit(prior)?;
        let new = objects.read_commit(next)?;

        let kind = if old.tree == new.tree && old.parents == new.parents {
            if old.message == new.message {
                ChangeKind::NoChange
            } else {
                ChangeKind::NoCodeChange
            }
        } else {
            match (old.parents.as_slice(), new.parents.as_slice()) {
                ([old_parent], [new_parent])
                    if old_parent != new_parent && old.message == new.message =>
                {
                    let old_parent_tree = objects.read_commit(old_parent)?.tree;
                    let new_parent_tree = objects.read_commit(new_parent)?.tree;
                    let old_diff = diff_trees(objects, Some(&old_parent_tree), &old.tree)?;
                    let new_diff = diff_trees(objects, Some(&new_parent_tree), &new.tree)?;
                    if old_diff == new_diff {
                        ChangeKind::TrivialRebase
                    } else {
                        ChangeKind::Rework
                    }
                }
                _ => ChangeKind::Rework,
            }
        };
        debug!(project, prior = %prior.abbrev(), next = %next.abbrev(), ?kind, "classified change kind");
        Ok(kind)
    }
}
