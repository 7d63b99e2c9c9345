//! Change edits: a user's private, mutable draft of a change under review.
//!
//! An edit is a single commit referenced by
//! `refs/users/<SS>/<account>/edit-<change>/<ps>`, where `<ps>` is the patch
//! set it was started from. Mutations replace that commit through a
//! compare-and-swap on the ref. A stale edit is rebased onto the current
//! patch set with a three-way merge, and publishing squashes the edit into
//! patch set `current + 1`.
//!
//! [`ChangeEditService`] is the entry point. It is assembled from the
//! collaborator traits in [`collaborators`] and a [`RepositoryManager`];
//! in-memory implementations of all of them live in [`memory`] and [`repo`].
//!
//! # Modules
//!
//! - [`lifecycle`] -- the edit state machine as a pure planning function
//! - [`locator`] -- finds an account's edit of a change
//! - [`modifier`] -- content, message and identity deltas
//! - [`rebase`] -- moves a stale edit onto the current patch set
//! - [`publish`] -- squashes an edit into a new patch set, or deletes it
//! - [`kind`] -- classifies the relation between two patch sets

pub mod change;
pub mod collaborators;
pub mod config;
pub mod context;
pub mod edit;
pub mod error;
pub mod kind;
pub mod lifecycle;
pub mod locator;
pub mod memory;
pub mod message;
pub mod modifier;
pub mod publish;
pub mod rebase;
pub mod repo;
pub mod service;

pub use change::{Account, Change, ChangeKey, ChangeStatus, CurrentUser, PatchSet};
pub use collaborators::{
    ChangeIndexer, ChangeKind, ChangeKindClassifier, ChangeMetadata, PatchSetInsertion,
};
pub use config::{CommitMessageConfig, ConfigError, EditConfig};
pub use context::EditContext;
pub use edit::ChangeEdit;
pub use error::{EditError, EditResult};
pub use kind::DefaultChangeKindClassifier;
pub use lifecycle::{plan, EditOp, EditState, Transition};
pub use locator::EditLocator;
pub use memory::{InMemoryChangeMetadata, RecordingIndexer};
pub use message::CommitMessagePolicy;
pub use modifier::{Delta, EditMutator, IdentityKind, TreeEdit, COMMIT_MSG};
pub use publish::SquashPublisher;
pub use rebase::RebaseEngine;
pub use repo::{InMemoryRepository, InMemoryRepositoryManager, Repository, RepositoryManager};
pub use service::ChangeEditService;

// Re-export key types
pub use chedit_store::{EntryMode, Tree, TreeEntry};
pub use chedit_types::{AccountId, ChangeId, ObjectId, PatchSetId, PersonIdent, Timestamp};
