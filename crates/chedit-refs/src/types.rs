//! Core reference types.

use serde::{Deserialize, Serialize};
use chedit_types::ObjectId;

/// A named pointer to a commit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ref {
    /// Full name, e.g. `refs/changes/01/1/1`.
    pub name: String,
    pub target: ObjectId,
}

impl Ref {
    pub fn new(name: impl Into<String>, target: ObjectId) -> Self {
        Self {
            name: name.into(),
            target,
        }
    }
}

/// One step of an atomic [`batch_update`](crate::RefStore::batch_update).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RefCommand {
    /// Create `name`; the ref must not exist (or already point at `new`).
    Create { name: String, new: ObjectId },
    /// Move `name` from `old` to `new`.
    Update {
        name: String,
        old: ObjectId,
        new: ObjectId,
    },
    /// Remove `name`, which must currently point at `old`.
    Delete { name: String, old: ObjectId },
}

impl RefCommand {
    pub fn name(&self) -> &str {
        match self {
            Self::Create { name, .. } | Self::Update { name, .. } | Self::Delete { name, .. } => {
                name
            }
        }
    }

    /// Value the ref must hold before the command applies.
    pub fn expected(&self) -> Option<ObjectId> {
        match self {
            Self::Create { .. } => None,
            Self::Update { old, .. } | Self::Delete { old, .. } => Some(*old),
        }
    }

    /// Value the ref holds after the command applies.
    pub fn new_value(&self) -> Option<ObjectId> {
        match self {
            Self::Create { new, .. } | Self::Update { new, .. } => Some(*new),
            Self::Delete { .. } => None,
        }
    }
}

/// Successful outcome of a single ref write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RefUpdateResult {
    Created,
    Updated,
    Deleted,
    /// The ref already held the requested value.
    NoChange,
}

impl RefUpdateResult {
    /// Failures are reported as `RefError`, so every outcome is a success.
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            Self::Created | Self::Updated | Self::Deleted | Self::NoChange
        )
    }

    /// `true` if the store was actually modified.
    pub fn changed(&self) -> bool {
        !matches!(self, Self::NoChange)
    }
}
