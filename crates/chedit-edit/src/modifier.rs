//! Applies content, message and identity deltas to a change edit.

use chedit_refs::edit_ref_name;
use chedit_store::{Commit, EntryMode, ObjectInserter, Tree, TreeEntry};
use chedit_types::{ObjectId, PersonIdent};
use tracing::{debug, info, warn};

use crate::change::{Change, PatchSet};
use crate::context::EditContext;
use crate::edit::ChangeEdit;
use crate::error::{EditError, EditResult};
use crate::lifecycle::{plan, EditOp, EditState, Transition};
use crate::message::same_message;

/// Path under which the commit message is exposed as a file.
pub const COMMIT_MSG: &str = "/COMMIT_MSG";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentityKind {
    Author,
    Committer,
}

/// A change to the edit's tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TreeEdit {
    /// Add or overwrite a file. `mode` defaults to the existing entry's.
    Modify {
        path: String,
        content: Vec<u8>,
        mode: Option<EntryMode>,
    },
    Delete(String),
    Rename { from: String, to: String },
    /// Reset a path to its state in the base patch set.
    Restore(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Delta {
    Tree(TreeEdit),
    Message(String),
    Identity {
        name: Option<String>,
        email: Option<String>,
        kind: IdentityKind,
    },
}

/// The commit an operation starts from and where its ref lives.
struct Snapshot {
    ref_name: String,
    /// Current ref value; `None` when the edit is being created.
    observed: Option<ObjectId>,
    commit: Commit,
    base: PatchSet,
}

pub struct EditMutator<'a> {
    ctx: EditContext<'a>,
}

impl<'a> EditMutator<'a> {
    pub fn new(ctx: EditContext<'a>) -> Self {
        Self { ctx }
    }

    /// Start an edit from the change's current patch set.
    pub fn create(&self, change: &Change, state: &EditState) -> EditResult<ChangeEdit> {
        plan(state, EditOp::Create, change)?;
        self.ctx.check_can_edit(change)?;
        let snapshot = self.synthesize(change)?;
        let inserter = ObjectInserter::new(self.ctx.repo.objects.as_ref());
        let edit = self.write(change, &snapshot, snapshot.commit.clone(), inserter)?;
        info!(change = %change.id, ref_name = %edit.ref_name, "created change edit");
        Ok(edit)
    }

    /// Apply `delta` to the edit in `state`, creating the edit first if it
    /// is absent.
    pub fn apply(&self, change: &Change, state: &EditState, delta: Delta) -> EditResult<ChangeEdit> {
        let transition = plan(state, EditOp::Mutate, change)?;
        self.ctx.check_can_edit(change)?;
        let delta = route_commit_msg(delta)?;

        let snapshot = match (transition, state) {
            (Transition::Amend, EditState::Present(edit)) => Snapshot {
                ref_name: edit.ref_name.clone(),
                observed: Some(edit.commit_id),
                commit: edit.commit.clone(),
                base: edit.base_patch_set.clone(),
            },
            _ => self.synthesize(change)?,
        };

        let current = &snapshot.commit;
        let mut next = current.clone();
        next.committer.when = self.ctx.now_after(&current.committer.when);
        let mut inserter = ObjectInserter::new(self.ctx.repo.objects.as_ref());

        match delta {
            Delta::Tree(edit) => {
                next.tree = self.apply_tree_edit(&mut inserter, &current.tree, &snapshot.base, edit)?;
            }
            Delta::Message(message) => {
                self.check_message(change, &current.message, &message)?;
                next.message = message;
            }
            Delta::Identity { name, email, kind } => {
                let ident = self.identity(change, name, email, kind)?;
                match kind {
                    IdentityKind::Author => next.author = ident.with_when(current.author.when),
                    IdentityKind::Committer => next.committer = ident.with_when(next.committer.when),
                }
            }
        }

        if next.tree == current.tree
            && next.message == current.message
            && next.author.same_identity(&current.author)
            && next.committer.same_identity(&current.committer)
        {
            return Err(EditError::Conflict("no changes were made".into()));
        }

        self.write(change, &snapshot, next, inserter)
    }

    /// An edit commit identical to the current patch set, committed by the
    /// acting user.
    fn synthesize(&self, change: &Change) -> EditResult<Snapshot> {
        let base = self.ctx.patch_set(change.current_patch_set)?;
        let base_commit = self.ctx.repo.objects.read_commit(&base.commit)?;
        let commit = Commit {
            tree: base_commit.tree,
            parents: vec![base.commit],
            author: base_commit.author,
            committer: self.ctx.user.ident(self.ctx.now()),
            message: base_commit.message,
        };
        Ok(Snapshot {
            ref_name: edit_ref_name(self.ctx.user.id, base.id),
            observed: None,
            commit,
            base,
        })
    }

    /// Insert `commit`, then compare-and-swap the edit ref onto it.
    fn write(
        &self,
        change: &Change,
        snapshot: &Snapshot,
        commit: Commit,
        mut inserter: ObjectInserter<'_>,
    ) -> EditResult<ChangeEdit> {
        let commit_id = inserter.insert_commit(&commit)?;
        inserter.flush()?;

        let refs = &self.ctx.repo.refs;
        let result = match snapshot.observed {
            Some(old) => refs.update_ref(&snapshot.ref_name, old, commit_id),
            None => refs.create_ref(&snapshot.ref_name, commit_id),
        };
        let result = result.inspect_err(|e| {
            warn!(ref_name = %snapshot.ref_name, error = %e, "change edit ref update failed");
        })?;
        debug!(
            change = %change.id,
            ref_name = %snapshot.ref_name,
            commit = %commit_id.abbrev(),
            ?result,
            "updated change edit"
        );

        Ok(ChangeEdit {
            owner: self.ctx.user.id,
            change: change.clone(),
            ref_name: snapshot.ref_name.clone(),
            commit_id,
            commit,
            base_patch_set: snapshot.base.clone(),
        })
    }

    fn apply_tree_edit(
        &self,
        inserter: &mut ObjectInserter<'_>,
        tree_id: &ObjectId,
        base: &PatchSet,
        edit: TreeEdit,
    ) -> EditResult<ObjectId> {
        let mut tree = self.ctx.repo.objects.read_tree(tree_id)?;
        match edit {
            TreeEdit::Modify {
                path,
                content,
                mode,
            } => {
                validate_path(&path)?;
                let max = self.ctx.config.max_file_size;
                if content.len() as u64 > max {
                    return Err(EditError::InvalidInput(format!(
                        "file {path} exceeds the maximum size of {max} bytes"
                    )));
                }
                let mode = mode
                    .or_else(|| tree.get(&path).map(|e| e.mode))
                    .unwrap_or(EntryMode::Regular);
                check_path_clash(&tree, &path)?;
                let blob = inserter.insert_blob(content);
                tree.upsert(TreeEntry::new(path, mode, blob));
            }
            TreeEdit::Delete(path) => {
                validate_path(&path)?;
                tree.remove(&path);
            }
            TreeEdit::Rename { from, to } => {
                validate_path(&from)?;
                validate_path(&to)?;
                let entry = tree
                    .remove(&from)
                    .ok_or_else(|| EditError::Conflict(format!("file {from} does not exist")))?;
                check_path_clash(&tree, &to)?;
                tree.upsert(TreeEntry::new(to, entry.mode, entry.object_id));
            }
            TreeEdit::Restore(path) => {
                validate_path(&path)?;
                let base_commit = self.ctx.repo.objects.read_commit(&base.commit)?;
                let base_tree: Tree = self.ctx.repo.objects.read_tree(&base_commit.tree)?;
                match base_tree.get(&path) {
                    Some(entry) => {
                        check_path_clash(&tree, &path)?;
                        tree.upsert(entry.clone());
                    }
                    None => {
                        tree.remove(&path);
                    }
                }
            }
        }
        Ok(inserter.insert_tree(&tree)?)
    }

    fn check_message(&self, change: &Change, current: &str, message: &str) -> EditResult<()> {
        if message.trim().is_empty() {
            return Err(EditError::InvalidInput("commit message must not be empty".into()));
        }
        if same_message(current, message) {
            return Err(EditError::Conflict(
                "New commit message cannot be same as existing commit message".into(),
            ));
        }
        self.ctx.metadata.check_commit_message(change, message)
    }

    /// Resolve the replacement identity, defaulting to the acting user and
    /// requiring the forge capability for anyone else.
    fn identity(
        &self,
        change: &Change,
        name: Option<String>,
        email: Option<String>,
        kind: IdentityKind,
    ) -> EditResult<PersonIdent> {
        let user = self.ctx.user;
        let ident = PersonIdent::new(
            name.unwrap_or_else(|| user.name.clone()),
            email.unwrap_or_else(|| user.email.clone()),
            self.ctx.now(),
        );
        ident.validate()?;
        if !user.is_self(&ident) {
            let allowed = match kind {
                IdentityKind::Author => self.ctx.metadata.can_forge_author(user.id, change),
                IdentityKind::Committer => self.ctx.metadata.can_forge_committer(user.id, change),
            };
            if !allowed {
                let what = match kind {
                    IdentityKind::Author => "author",
                    IdentityKind::Committer => "committer",
                };
                return Err(EditError::PermissionDenied(format!(
                    "not permitted to forge {what} identity"
                )));
            }
        }
        Ok(ident)
    }
}

/// Content written to [`COMMIT_MSG`] replaces the commit message.
fn route_commit_msg(delta: Delta) -> EditResult<Delta> {
    match delta {
        Delta::Tree(TreeEdit::Modify { path, content, .. }) if path == COMMIT_MSG => {
            let message = String::from_utf8(content).map_err(|_| {
                EditError::InvalidInput("commit message must be valid UTF-8".into())
            })?;
            Ok(Delta::Message(message))
        }
        other => Ok(other),
    }
}

/// Reject paths that cannot name a file in a tree.
pub fn validate_path(path: &str) -> EditResult<()> {
    let invalid = path.is_empty()
        || path.starts_with('/')
        || path.ends_with('/')
        || path.contains('\0')
        || path
            .split('/')
            .any(|c| c.is_empty() || c == "." || c == "..");
    if invalid {
        return Err(EditError::InvalidInput(format!("Invalid path: {path}")));
    }
    Ok(())
}

/// Reject a file at `path` when a file already sits at one of its parent
/// directories, or when `path` is itself a directory of the tree.
fn check_path_clash(tree: &Tree, path: &str) -> EditResult<()> {
    let parent_file = path
        .match_indices('/')
        .map(|(i, _)| &path[..i])
        .find(|dir| tree.get(dir).is_some());
    if let Some(dir) = parent_file {
        return Err(EditError::InvalidInput(format!(
            "cannot create {path}: {dir} is a file"
        )));
    }
    let dir = format!("{path}/");
    if tree.entries().iter().any(|e| e.path.starts_with(&dir)) {
        return Err(EditError::InvalidInput(format!(
            "cannot create {path}: it is a directory"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn path_validation() {
        for ok in ["a", "src/main.rs", "dir/.hidden", "a..b"] {
            assert!(validate_path(ok).is_ok(), "{ok:?} should be valid");
        }
        for bad in ["", "/abs", "invalid/path/", "a//b", "./a", "a/../b", "a\0b"] {
            let err = validate_path(bad).unwrap_err();
            assert_eq!(err.to_string(), format!("Invalid path: {bad}"));
        }
    }

    #[test]
    fn files_and_directories_do_not_share_a_path() {
        let blob = ObjectId::from_bytes(b"blob");
        let tree = Tree::new(vec![
            TreeEntry::new("a", EntryMode::Regular, blob),
            TreeEntry::new("dir/x", EntryMode::Regular, blob),
        ]);
        let err = check_path_clash(&tree, "a/b").unwrap_err();
        assert_eq!(err.to_string(), "cannot create a/b: a is a file");
        assert!(matches!(check_path_clash(&tree, "dir"), Err(EditError::InvalidInput(_))));

        for ok in ["a", "dir/y", "dir/x", "ab/c", "dirx"] {
            assert!(check_path_clash(&tree, ok).is_ok(), "{ok:?} should not clash");
        }
    }

    #[test]
    fn commit_msg_content_becomes_message_delta() {
        let delta = Delta::Tree(TreeEdit::Modify {
            path: COMMIT_MSG.into(),
            content: b"New subject\n".to_vec(),
            mode: None,
        });
        assert_eq!(
            route_commit_msg(delta).unwrap(),
            Delta::Message("New subject\n".into())
        );
    }

    #[test]
    fn non_utf8_commit_msg_is_rejected() {
        let delta = Delta::Tree(TreeEdit::Modify {
            path: COMMIT_MSG.into(),
            content: vec![0xff, 0xfe],
            mode: None,
        });
        assert!(matches!(route_commit_msg(delta), Err(EditError::InvalidInput(_))));
    }

    #[test]
    fn other_paths_pass_through() {
        let delta = Delta::Tree(TreeEdit::Delete("README".into()));
        assert_eq!(route_commit_msg(delta.clone()).unwrap(), delta);
    }

    proptest! {
        #[test]
        fn joined_components_are_valid(parts in prop::collection::vec("[a-zA-Z0-9_][a-zA-Z0-9_.-]{0,12}", 1..5)) {
            let path = parts.join("/");
            prop_assert!(validate_path(&path).is_ok(), "{}", path);
            let doubled = parts.join("//");
            prop_assert_eq!(validate_path(&doubled).is_ok(), parts.len() == 1);
            let rooted = format!("/{path}");
            prop_assert!(validate_path(&rooted).is_err());
        }
    }
}
