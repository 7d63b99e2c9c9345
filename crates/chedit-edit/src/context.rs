use chedit_types::{PatchSetId, Timestamp};

use crate::change::{Account, Change, PatchSet};
use crate::collaborators::ChangeMetadata;
use crate::config::EditConfig;
use crate::error::{EditError, EditResult};
use crate::repo::Repository;

/// Everything one edit operation needs: the acting account, the open
/// repository, and the metadata service.
#[derive(Clone, Copy)]
pub struct EditContext<'a> {
    pub user: &'a Account,
    pub repo: &'a Repository,
    pub metadata: &'a dyn ChangeMetadata,
    pub config: &'a EditConfig,
}

impl<'a> EditContext<'a> {
    pub fn now(&self) -> Timestamp {
        Timestamp::now(self.config.timezone_offset_minutes)
    }

    /// A timestamp strictly later than `prev`.
    pub fn now_after(&self, prev: &Timestamp) -> Timestamp {
        Timestamp::now_after(prev, self.config.timezone_offset_minutes)
    }

    /// Load a patch-set record that the repository state says must exist.
    pub fn patch_set(&self, id: PatchSetId) -> EditResult<PatchSet> {
        self.metadata
            .patch_set(id)?
            .ok_or_else(|| EditError::Io(format!("patch set {id} not found")))
    }

    pub fn check_can_edit(&self, change: &Change) -> EditResult<()> {
        if self.metadata.can_edit(self.user.id, change) {
            Ok(())
        } else {
            Err(EditError::PermissionDenied(format!(
                "edit not permitted on change {}",
                change.id
            )))
        }
    }
}
