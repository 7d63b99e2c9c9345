//! Squashes an edit into a new patch set, and discards edits.

use chedit_store::{Commit, ObjectInserter};
use tracing::{debug, info};

use crate::change::{Change, ChangeStatus, PatchSet};
use crate::collaborators::{ChangeIndexer, ChangeKind, ChangeKindClassifier, PatchSetInsertion};
use crate::context::EditContext;
use crate::error::{EditError, EditResult};
use crate::lifecycle::{plan, EditOp, EditState};

pub struct SquashPublisher<'a> {
    ctx: EditContext<'a>,
    classifier: &'a dyn ChangeKindClassifier,
    indexer: &'a dyn ChangeIndexer,
}

impl<'a> SquashPublisher<'a> {
    pub fn new(
        ctx: EditContext<'a>,
        classifier: &'a dyn ChangeKindClassifier,
        indexer: &'a dyn ChangeIndexer,
    ) -> Self {
        Self {
            ctx,
            classifier,
            indexer,
        }
    }

    /// Publish the edit as patch set `current + 1`.
    ///
    /// The new commit replaces the base patch set rather than stacking on
    /// it: it takes the base commit's parents and the edit's tree, message
    /// and identities. The edit ref is removed once the patch set is
    /// registered. If that removal fails the patch set stays published and
    /// the left-over edit is stale, so it can only be rebased or deleted.
    pub fn publish(&self, change: &Change, state: &EditState) -> EditResult<(Change, PatchSet)> {
        plan(state, EditOp::Publish, change)?;
        let EditState::Present(edit) = state else {
            return Err(missing_edit(change));
        };

        let objects = self.ctx.repo.objects.as_ref();
        let base = objects.read_commit(&edit.base_patch_set.commit)?;
        if base.tree == edit.commit.tree && base.message == edit.commit.message {
            return Err(EditError::Conflict("identical tree and message".into()));
        }

        let squashed = Commit {
            tree: edit.commit.tree,
            parents: base.parents.clone(),
            author: edit.commit.author.clone(),
            committer: edit.commit.committer.clone(),
            message: edit.commit.message.clone(),
        };
        let mut inserter = ObjectInserter::new(objects);
        let commit_id = inserter.insert_commit(&squashed)?;
        inserter.flush()?;

        let base_number = edit.base_patch_set.id.number;
        let kind = self.classifier.classify(
            self.ctx.repo,
            &change.project,
            &edit.base_patch_set.commit,
            &commit_id,
        )?;
        let reason = match kind {
            ChangeKind::NoCodeChange => "Commit message was updated.".to_string(),
            _ => format!("Published edit on patch set {base_number}."),
        };
        debug!(change = %change.id, ?kind, commit = %commit_id.abbrev(), "squashed change edit");

        let id = change.current_patch_set.next();
        let insertion = PatchSetInsertion {
            id,
            commit: commit_id,
            draft: change.status == ChangeStatus::Draft || edit.base_patch_set.draft,
            uploader: self.ctx.user.id,
            message: format!("Patch set {}: {reason}", id.number),
            expected_current: change.current_patch_set,
        };
        let patch_set = PatchSet {
            id,
            commit: commit_id,
            draft: insertion.draft,
            uploader: insertion.uploader,
        };
        let updated = self.ctx.metadata.insert_patch_set(change, insertion)?;

        self.ctx
            .repo
            .refs
            .delete_ref(&edit.ref_name, edit.commit_id)?;
        self.indexer.reindex(&updated)?;
        info!(
            change = %change.id,
            patch_set = id.number,
            base = base_number,
            "published change edit"
        );
        Ok((updated, patch_set))
    }

    /// Remove the edit ref, expecting it still to hold the observed commit.
    pub fn delete(&self, change: &Change, state: &EditState) -> EditResult<()> {
        plan(state, EditOp::Delete, change)?;
        let EditState::Present(edit) = state else {
            return Err(missing_edit(change));
        };
        self.ctx
            .repo
            .refs
            .delete_ref(&edit.ref_name, edit.commit_id)?;
        self.indexer.reindex(change)?;
        info!(change = %change.id, ref_name = %edit.ref_name, "deleted change edit");
        Ok(())
    }
}

fn missing_edit(change: &Change) -> EditError {
    EditError::NotFound(format!("no change edit exists for change {}", change.id))
}

