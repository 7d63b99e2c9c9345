//! Services the edit engine consumes but does not own.

use chedit_types::{AccountId, ChangeId, ObjectId, PatchSetId};
use serde::{Deserialize, Serialize};

use crate::change::{Change, PatchSet};
use crate::error::EditResult;
use crate::repo::Repository;

/// A new patch set to register on a change.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatchSetInsertion {
    pub id: PatchSetId,
    pub commit: ObjectId,
    pub draft: bool,
    pub uploader: AccountId,
    /// Change message recorded alongside the patch set.
    pub message: String,
    /// The patch set the caller saw as current; the insert is rejected if
    /// the change has moved on since.
    pub expected_current: PatchSetId,
}

/// Change and patch-set records plus the permission model.
pub trait ChangeMetadata: Send + Sync {
    fn change(&self, id: ChangeId) -> EditResult<Option<Change>>;

    fn patch_set(&self, id: PatchSetId) -> EditResult<Option<PatchSet>>;

    fn can_edit(&self, account: AccountId, change: &Change) -> bool;

    /// May `account` write an author identity other than its own?
    fn can_forge_author(&self, account: AccountId, change: &Change) -> bool;

    fn can_forge_committer(&self, account: AccountId, change: &Change) -> bool;

    /// Apply the project's commit message rules to an edited message.
    fn check_commit_message(&self, change: &Change, message: &str) -> EditResult<()>;

    /// Register a patch set and return the updated change.
    fn insert_patch_set(&self, change: &Change, insertion: PatchSetInsertion) -> EditResult<Change>;
}

/// How a new patch set relates to its predecessor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeKind {
    /// Code changed.
    Rework,
    /// Same diff applied to a different parent.
    TrivialRebase,
    /// Only the commit message changed.
    NoCodeChange,
    NoChange,
}

pub trait ChangeKindClassifier: Send + Sync {
    fn classify(
        &self,
        repo: &Repository,
        project: &str,
        prior: &ObjectId,
        next: &ObjectId,
    ) -> EditResult<ChangeKind>;
}

/// Keeps the change search index in sync.
pub trait ChangeIndexer: Send + Sync {
    fn reindex(&self, change: &Change) -> EditResult<()>;
}
