//! Public entry points for change edits.

use std::sync::Arc;

use chedit_store::EntryMode;
use chedit_types::ChangeId;
use tracing::{debug, warn};

use crate::change::{Change, CurrentUser, PatchSet};
use crate::collaborators::{ChangeIndexer, ChangeKindClassifier, ChangeMetadata};
use crate::config::EditConfig;
use crate::context::EditContext;
use crate::edit::ChangeEdit;
use crate::error::{EditError, EditResult};
use crate::lifecycle::EditState;
use crate::locator::EditLocator;
use crate::modifier::{Delta, EditMutator, IdentityKind, TreeEdit, COMMIT_MSG};
use crate::publish::SquashPublisher;
use crate::rebase::RebaseEngine;
use crate::repo::RepositoryManager;

/// Creates, modifies, rebases, publishes and deletes change edits.
///
/// Every operation authenticates the caller, loads the change, opens the
/// project repository, and locates the caller's edit before acting. Each
/// write is one compare-and-swap against the edit state observed at the
/// start of the call; a concurrent writer makes the call fail with
/// [`EditError::Conflict`] rather than retry.
pub struct ChangeEditService {
    repos: Arc<dyn RepositoryManager>,
    metadata: Arc<dyn ChangeMetadata>,
    classifier: Arc<dyn ChangeKindClassifier>,
    indexer: Arc<dyn ChangeIndexer>,
    config: EditConfig,
}

impl ChangeEditService {
    pub fn new(
        repos: Arc<dyn RepositoryManager>,
        metadata: Arc<dyn ChangeMetadata>,
        classifier: Arc<dyn ChangeKindClassifier>,
        indexer: Arc<dyn ChangeIndexer>,
        config: EditConfig,
    ) -> Self {
        Self {
            repos,
            metadata,
            classifier,
            indexer,
            config,
        }
    }

    pub fn config(&self) -> &EditConfig {
        &self.config
    }

    pub fn create_edit(&self, user: &CurrentUser, change: ChangeId) -> EditResult<ChangeEdit> {
        self.run(user, change, |ctx, change, state| {
            EditMutator::new(ctx).create(change, &state)
        })
    }

    pub fn modify_file(
        &self,
        user: &CurrentUser,
        change: ChangeId,
        path: &str,
        content: Vec<u8>,
        mode: Option<EntryMode>,
    ) -> EditResult<ChangeEdit> {
        self.mutate(
            user,
            change,
            Delta::Tree(TreeEdit::Modify {
                path: path.to_string(),
                content,
                mode,
            }),
        )
    }

    pub fn delete_file(&self, user: &CurrentUser, change: ChangeId, path: &str) -> EditResult<ChangeEdit> {
        self.mutate(user, change, Delta::Tree(TreeEdit::Delete(path.to_string())))
    }

    pub fn rename_file(
        &self,
        user: &CurrentUser,
        change: ChangeId,
        from: &str,
        to: &str,
    ) -> EditResult<ChangeEdit> {
        self.mutate(
            user,
            change,
            Delta::Tree(TreeEdit::Rename {
                from: from.to_string(),
                to: to.to_string(),
            }),
        )
    }

    /// Reset `path` to its content in the edit's base patch set.
    pub fn restore_file(&self, user: &CurrentUser, change: ChangeId, path: &str) -> EditResult<ChangeEdit> {
        self.mutate(user, change, Delta::Tree(TreeEdit::Restore(path.to_string())))
    }

    pub fn modify_commit_message(
        &self,
        user: &CurrentUser,
        change: ChangeId,
        message: &str,
    ) -> EditResult<ChangeEdit> {
        self.mutate(user, change, Delta::Message(message.to_string()))
    }

    /// Replace the author or committer. Omitted fields default to the
    /// caller's own name and email.
    pub fn modify_identity(
        &self,
        user: &CurrentUser,
        change: ChangeId,
        name: Option<&str>,
        email: Option<&str>,
        kind: IdentityKind,
    ) -> EditResult<ChangeEdit> {
        self.mutate(
            user,
            change,
            Delta::Identity {
                name: name.map(str::to_string),
                email: email.map(str::to_string),
                kind,
            },
        )
    }

    pub fn rebase_edit(&self, user: &CurrentUser, change: ChangeId) -> EditResult<ChangeEdit> {
        self.run(user, change, |ctx, change, state| {
            RebaseEngine::new(ctx).rebase(change, &state)
        })
    }

    /// Publish the caller's edit as the change's next patch set.
    pub fn publish(&self, user: &CurrentUser, change: ChangeId) -> EditResult<PatchSet> {
        self.run(user, change, |ctx, change, state| {
            let publisher =
                SquashPublisher::new(ctx, self.classifier.as_ref(), self.indexer.as_ref());
            let (_, patch_set) = publisher.publish(change, &state)?;
            Ok(patch_set)
        })
    }

    pub fn delete_edit(&self, user: &CurrentUser, change: ChangeId) -> EditResult<()> {
        self.run(user, change, |ctx, change, state| {
            SquashPublisher::new(ctx, self.classifier.as_ref(), self.indexer.as_ref())
                .delete(change, &state)
        })
    }

    pub fn get_edit(&self, user: &CurrentUser, change: ChangeId) -> EditResult<Option<ChangeEdit>> {
        self.run(user, change, |_, _, state| Ok(state.into_edit()))
    }

    /// Content and mode of `path` in the caller's edit. `None` if there is
    /// no edit or the path is absent from it.
    pub fn get_file(
        &self,
        user: &CurrentUser,
        change: ChangeId,
        path: &str,
    ) -> EditResult<Option<(Vec<u8>, EntryMode)>> {
        self.run(user, change, |ctx, _, state| {
            let Some(edit) = state.edit() else {
                return Ok(None);
            };
            if path == COMMIT_MSG {
                return Ok(Some((edit.message().as_bytes().to_vec(), EntryMode::Regular)));
            }
            let objects = ctx.repo.objects.as_ref();
            let tree = objects.read_tree(edit.tree())?;
            match tree.get(path) {
                Some(entry) => Ok(Some((objects.read_blob(&entry.object_id)?.data, entry.mode))),
                None => Ok(None),
            }
        })
    }

    pub fn get_commit_message(&self, user: &CurrentUser, change: ChangeId) -> EditResult<String> {
        self.run(user, change, |_, change, state| {
            state
                .edit()
                .map(|edit| edit.message().to_string())
                .ok_or_else(|| no_edit(change))
        })
    }

    /// Sorted paths of every file in the caller's edit.
    pub fn list_files(&self, user: &CurrentUser, change: ChangeId) -> EditResult<Vec<String>> {
        self.run(user, change, |ctx, change, state| {
            let edit = state.edit().ok_or_else(|| no_edit(change))?;
            let tree = ctx.repo.objects.read_tree(edit.tree())?;
            Ok(tree.paths().map(str::to_string).collect())
        })
    }

    fn mutate(&self, user: &CurrentUser, change: ChangeId, delta: Delta) -> EditResult<ChangeEdit> {
        self.run(user, change, |ctx, change, state| {
            debug!(change = %change.id, ?delta, "modifying change edit");
            EditMutator::new(ctx).apply(change, &state, delta)
        })
    }

    /// Resolve the caller, change, repository and current edit state, then
    /// run `op` against them.
    fn run<T>(
        &self,
        user: &CurrentUser,
        change: ChangeId,
        op: impl FnOnce(EditContext<'_>, &Change, EditState) -> EditResult<T>,
    ) -> EditResult<T> {
        let account = user.account()?;
        let change = self
            .metadata
            .change(change)?
            .ok_or_else(|| EditError::NotFound(format!("change {change} not found")))?;
        let repo = self.repos.open(&change.project)?;
        let ctx = EditContext {
            user: account,
            repo: &repo,
            metadata: self.metadata.as_ref(),
            config: &self.config,
        };
        let state = EditLocator::new(ctx).find(account.id, &change)?;
        op(ctx, &change, state).inspect_err(|e| {
            if e.is_conflict() {
                warn!(change = %change.id, account = %account.id, error = %e, "change edit conflict");
            }
        })
    }
}

fn no_edit(change: &Change) -> EditError {
    EditError::NotFound(format!("no change edit exists for change {}", change.id))
}
