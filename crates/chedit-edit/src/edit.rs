use chedit_store::Commit;
use chedit_types::{AccountId, ObjectId, PatchSetId};

use crate::change::{Change, PatchSet};

/// A user's pending edit of a change, as observed at one instant.
///
/// `commit_id` is the value the edit ref held when it was read and is the
/// expected old value of the next compare-and-swap on that ref.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChangeEdit {
    pub owner: AccountId,
    pub change: Change,
    pub ref_name: String,
    pub commit_id: ObjectId,
    pub commit: Commit,
    /// The patch set this edit was started from (or last rebased onto).
    pub base_patch_set: PatchSet,
}

impl ChangeEdit {
    pub fn base(&self) -> PatchSetId {
        self.base_patch_set.id
    }

    pub fn tree(&self) -> &ObjectId {
        &self.commit.tree
    }

    pub fn message(&self) -> &str {
        &self.commit.message
    }

    /// `true` if the change has moved past the edit's base patch set.
    pub fn is_stale(&self, current: PatchSetId) -> bool {
        self.base() != current
    }
}
