use chedit_refs::{edit_ref_name, parse_edit_ref};
use chedit_types::{AccountId, PatchSetId};
use tracing::debug;

use crate::change::Change;
use crate::context::EditContext;
use crate::edit::ChangeEdit;
use crate::error::{EditError, EditResult};
use crate::lifecycle::EditState;

/// Finds the edit an account holds on a change.
pub struct EditLocator<'a> {
    ctx: EditContext<'a>,
}

impl<'a> EditLocator<'a> {
    pub fn new(ctx: EditContext<'a>) -> Self {
        Self { ctx }
    }

    /// Look up `owner`'s edit of `change` with a single ref query over every
    /// possible base patch set, newest first.
    pub fn find(&self, owner: AccountId, change: &Change) -> EditResult<EditState> {
        let names: Vec<String> = (1..=change.current_patch_set.number)
            .rev()
            .map(|n| edit_ref_name(owner, PatchSetId::new(change.id, n)))
            .collect();
        let Some(found) = self.ctx.repo.refs.first_exact_ref(&names)? else {
            debug!(change = %change.id, account = %owner, "no change edit");
            return Ok(EditState::Absent);
        };

        let parsed = parse_edit_ref(&found.name).map_err(|e| EditError::Io(e.to_string()))?;
        let commit = self.ctx.repo.objects.read_commit(&found.target)?;
        let base_patch_set = self.ctx.patch_set(parsed.base())?;
        debug!(
            change = %change.id,
            ref_name = %found.name,
            base = parsed.patch_set,
            "found change edit"
        );
        Ok(EditState::Present(ChangeEdit {
            owner,
            change: change.clone(),
            ref_name: found.name,
            commit_id: found.target,
            commit,
            base_patch_set,
        }))
    }
}
