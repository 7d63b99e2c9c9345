//! In-memory collaborators for embedding and tests.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chedit_refs::patch_set_ref_name;
use chedit_types::{AccountId, ChangeId, PatchSetId};
use tracing::debug;

use crate::change::{Change, ChangeStatus, PatchSet};
use crate::collaborators::{ChangeIndexer, ChangeMetadata, PatchSetInsertion};
use crate::error::{EditError, EditResult};
use crate::message::CommitMessagePolicy;
use crate::repo::RepositoryManager;

#[derive(Default)]
struct MetadataState {
    changes: HashMap<ChangeId, Change>,
    patch_sets: HashMap<PatchSetId, PatchSet>,
    messages: HashMap<ChangeId, Vec<String>>,
    denied: HashSet<(AccountId, ChangeId)>,
    forge_author: HashSet<AccountId>,
    forge_committer: HashSet<AccountId>,
}

/// Change records kept in memory.
///
/// Every account may edit every change unless [`deny_edit`] says
/// otherwise. Inserting a patch set also writes its
/// `refs/changes/...` ref in the change's repository.
///
/// [`deny_edit`]: Self::deny_edit
pub struct InMemoryChangeMetadata {
    repos: Arc<dyn RepositoryManager>,
    policy: CommitMessagePolicy,
    state: RwLock<MetadataState>,
}

impl InMemoryChangeMetadata {
    pub fn new(repos: Arc<dyn RepositoryManager>, policy: CommitMessagePolicy) -> Self {
        Self {
            repos,
            policy,
            state: RwLock::new(MetadataState::default()),
        }
    }

    /// Register a change together with its current patch set.
    pub fn insert_change(&self, change: Change, patch_set: PatchSet) -> EditResult<()> {
        let repo = self.repos.open(&change.project)?;
        repo.refs
            .create_ref(&patch_set_ref_name(patch_set.id), patch_set.commit)?;
        let mut state = self.write()?;
        state.patch_sets.insert(patch_set.id, patch_set);
        state.changes.insert(change.id, change);
        Ok(())
    }

    pub fn set_status(&self, id: ChangeId, status: ChangeStatus) -> EditResult<()> {
        let mut state = self.write()?;
        let change = state
            .changes
            .get_mut(&id)
            .ok_or_else(|| EditError::NotFound(format!("change {id} not found")))?;
        change.status = status;
        Ok(())
    }

    pub fn grant_forge_author(&self, account: AccountId) -> EditResult<()> {
        self.write()?.forge_author.insert(account);
        Ok(())
    }

    pub fn grant_forge_committer(&self, account: AccountId) -> EditResult<()> {
        self.write()?.forge_committer.insert(account);
        Ok(())
    }

    pub fn deny_edit(&self, account: AccountId, change: ChangeId) -> EditResult<()> {
        self.write()?.denied.insert((account, change));
        Ok(())
    }

    /// Change messages recorded for `change`, oldest first.
    pub fn messages(&self, change: ChangeId) -> Vec<String> {
        self.state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .messages
            .get(&change)
            .cloned()
            .unwrap_or_default()
    }

    fn read(&self) -> EditResult<std::sync::RwLockReadGuard<'_, MetadataState>> {
        self.state
            .read()
            .map_err(|e| EditError::Io(format!("lock poisoned: {e}")))
    }

    fn write(&self) -> EditResult<std::sync::RwLockWriteGuard<'_, MetadataState>> {
        self.state
            .write()
            .map_err(|e| EditError::Io(format!("lock poisoned: {e}")))
    }
}

impl ChangeMetadata for InMemoryChangeMetadata {
    fn change(&self, id: ChangeId) -> EditResult<Option<Change>> {
        Ok(self.read()?.changes.get(&id).cloned())
    }

    fn patch_set(&self, id: PatchSetId) -> EditResult<Option<PatchSet>> {
        Ok(self.read()?.patch_sets.get(&id).cloned())
    }

    fn can_edit(&self, account: AccountId, change: &Change) -> bool {
        self.state
            .read()
            .map(|s| !s.denied.contains(&(account, change.id)))
            .unwrap_or(false)
    }

    fn can_forge_author(&self, account: AccountId, _change: &Change) -> bool {
        self.state
            .read()
            .map(|s| s.forge_author.contains(&account))
            .unwrap_or(false)
    }

    fn can_forge_committer(&self, account: AccountId, _change: &Change) -> bool {
        self.state
            .read()
            .map(|s| s.forge_committer.contains(&account))
            .unwrap_or(false)
    }

    fn check_commit_message(&self, change: &Change, message: &str) -> EditResult<()> {
        self.policy.check(change, message)
    }

    fn insert_patch_set(&self, change: &Change, insertion: PatchSetInsertion) -> EditResult<Change> {
        let repo = self.repos.open(&change.project)?;
        let mut state = self.write()?;
        let stored = state
            .changes
            .get(&change.id)
            .ok_or_else(|| EditError::NotFound(format!("change {} not found", change.id)))?;
        if !stored.status.is_open() {
            return Err(EditError::Conflict(format!(
                "Cannot create new patch set of change {} because it is {}",
                change.id, stored.status
            )));
        }
        if stored.current_patch_set != insertion.expected_current {
            return Err(EditError::Conflict(format!(
                "current patch set of change {} is {}, expected {}",
                change.id, stored.current_patch_set.number, insertion.expected_current.number
            )));
        }

        repo.refs
            .create_ref(&patch_set_ref_name(insertion.id), insertion.commit)?;

        let mut updated = stored.clone();
        updated.current_patch_set = insertion.id;
        state.patch_sets.insert(
            insertion.id,
            PatchSet {
                id: insertion.id,
                commit: insertion.commit,
                draft: insertion.draft,
                uploader: insertion.uploader,
            },
        );
        state
            .messages
            .entry(change.id)
            .or_default()
            .push(insertion.message);
        state.changes.insert(change.id, updated.clone());
        debug!(change = %change.id, patch_set = insertion.id.number, "inserted patch set");
        Ok(updated)
    }
}

/// Remembers which changes were reindexed, in order.
#[derive(Debug, Default)]
pub struct RecordingIndexer {
    reindexed: Mutex<Vec<ChangeId>>,
}

impl RecordingIndexer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reindexed(&self) -> Vec<ChangeId> {
        self.reindexed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl ChangeIndexer for RecordingIndexer {
    fn reindex(&self, change: &Change) -> EditResult<()> {
        self.reindexed
            .lock()
            .map_err(|e| EditError::Io(format!("lock poisoned: {e}")))?
            .push(change.id);
        Ok(())
    }
}
