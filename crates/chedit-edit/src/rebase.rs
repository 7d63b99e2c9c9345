//! Moves a stale edit onto the change's current patch set.

use chedit_merge::{merge_trees, TreeMerge};
use chedit_refs::{edit_ref_name, RefCommand};
use chedit_store::{Commit, ObjectInserter};
use tracing::{info, warn};

use crate::change::Change;
use crate::context::EditContext;
use crate::edit::ChangeEdit;
use crate::error::{EditError, EditResult};
use crate::lifecycle::{plan, EditOp, EditState};

pub const REBASE_CONFLICT: &str =
    "Rebasing change edit onto another patchset results in merge conflicts.";

pub struct RebaseEngine<'a> {
    ctx: EditContext<'a>,
}

impl<'a> RebaseEngine<'a> {
    pub fn new(ctx: EditContext<'a>) -> Self {
        Self { ctx }
    }

    /// Three-way merge the edit's changes onto the current patch set and
    /// move the edit ref to the new base in one batch.
    ///
    /// On conflict nothing is written and the edit keeps its ref and commit.
    pub fn rebase(&self, change: &Change, state: &EditState) -> EditResult<ChangeEdit> {
        plan(state, EditOp::Rebase, change)?;
        self.ctx.check_can_edit(change)?;
        let EditState::Present(edit) = state else {
            return Err(EditError::NotFound(format!(
                "no change edit exists for change {}",
                change.id
            )));
        };

        let objects = self.ctx.repo.objects.as_ref();
        let current = self.ctx.patch_set(change.current_patch_set)?;
        let old_base = objects.read_commit(&edit.base_patch_set.commit)?;
        let new_base = objects.read_commit(&current.commit)?;

        let mut inserter = ObjectInserter::new(objects);
        let tree = match merge_trees(&mut inserter, &old_base.tree, edit.tree(), &new_base.tree)? {
            TreeMerge::Clean(tree) => tree,
            TreeMerge::Conflicted(conflicts) => {
                warn!(
                    change = %change.id,
                    from = edit.base_patch_set.id.number,
                    to = current.id.number,
                    paths = ?conflicts.iter().map(|c| c.path.as_str()).collect::<Vec<_>>(),
                    "change edit rebase conflicts"
                );
                return Err(EditError::Conflict(REBASE_CONFLICT.into()));
            }
        };

        let commit = Commit {
            tree: inserter.insert_tree(&tree)?,
            parents: vec![current.commit],
            author: edit.commit.author.clone(),
            committer: edit
                .commit
                .committer
                .with_when(self.ctx.now_after(&edit.commit.committer.when)),
            message: edit.commit.message.clone(),
        };
        let commit_id = inserter.insert_commit(&commit)?;
        inserter.flush()?;

        let ref_name = edit_ref_name(edit.owner, current.id);
        self.ctx.repo.refs.batch_update(&[
            RefCommand::Create {
                name: ref_name.clone(),
                new: commit_id,
            },
            RefCommand::Delete {
                name: edit.ref_name.clone(),
                old: edit.commit_id,
            },
        ])?;
        info!(
            change = %change.id,
            from = edit.base_patch_set.id.number,
            to = current.id.number,
            ref_name = %ref_name,
            "rebased change edit"
        );

        Ok(ChangeEdit {
            owner: edit.owner,
            change: change.clone(),
            ref_name,
            commit_id,
            commit,
            base_patch_set: current,
        })
    }
}
