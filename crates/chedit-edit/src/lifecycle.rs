//! The edit lifecycle as a pure state machine.
//!
//! ```text
//! Absent --create/mutate--> Present(base = current)
//! Present --mutate--> Present
//! Present(stale) --rebase--> Present(base = current)
//! Present(current) --publish--> Absent (+1 patch set)
//! Present --delete--> Absent
//! ```
//!
//! Only delete is allowed once the change is merged or abandoned.

use crate::change::Change;
use crate::edit::ChangeEdit;
use crate::error::{EditError, EditResult};

/// What the ref store currently holds for (owner, change).
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EditState {
    Absent,
    Present(ChangeEdit),
}

impl EditState {
    pub fn edit(&self) -> Option<&ChangeEdit> {
        match self {
            Self::Absent => None,
            Self::Present(edit) => Some(edit),
        }
    }

    pub fn into_edit(self) -> Option<ChangeEdit> {
        match self {
            Self::Absent => None,
            Self::Present(edit) => Some(edit),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditOp {
    Create,
    Mutate,
    Rebase,
    Publish,
    Delete,
}

/// The step an operation takes, decided before any store is touched.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Synthesize an edit from the current patch set and create its ref.
    Start,
    /// Write a new commit on top of the existing edit.
    Amend,
    Rebase,
    Publish,
    Delete,
}

/// Decide how `op` proceeds from `state` given the change as it is now.
pub fn plan(state: &EditState, op: EditOp, change: &Change) -> EditResult<Transition> {
    if op != EditOp::Delete && !change.status.is_open() {
        return Err(EditError::Conflict(format!(
            "change {} is {}",
            change.id, change.status
        )));
    }
    let current = change.current_patch_set;
    match (state, op) {
        (EditState::Absent, EditOp::Create | EditOp::Mutate) => Ok(Transition::Start),
        (EditState::Present(_), EditOp::Create) => Err(EditError::Conflict(format!(
            "A change edit already exists for change {}",
            change.id
        ))),
        (EditState::Present(_), EditOp::Mutate) => Ok(Transition::Amend),
        (EditState::Absent, _) => Err(EditError::NotFound(format!(
            "no change edit exists for change {}",
            change.id
        ))),
        (EditState::Present(edit), EditOp::Rebase) if !edit.is_stale(current) => Err(
            EditError::Conflict("Change edit is already up to date.".into()),
        ),
        (EditState::Present(_), EditOp::Rebase) => Ok(Transition::Rebase),
        (EditState::Present(edit), EditOp::Publish) if edit.is_stale(current) => Err(
            EditError::Conflict("only edit for current patch set can be published".into()),
        ),
        (EditState::Present(_), EditOp::Publish) => Ok(Transition::Publish),
        (EditState::Present(_), EditOp::Delete) => Ok(Transition::Delete),
    }
}
