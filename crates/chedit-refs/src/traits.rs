//! The [`RefStore`] trait defining the reference storage interface.

use chedit_types::ObjectId;

use crate::error::RefResult;
use crate::names::is_edit_ref;
use crate::types::{Ref, RefCommand, RefUpdateResult};

/// Storage backend for named references.
///
/// Every write is a compare-and-swap: the caller passes the value it last
/// observed and the store rejects the write with
/// [`RefError::LockFailure`](crate::RefError::LockFailure) if the ref has
/// moved since. A rejected or failed write has no side effects.
pub trait RefStore: Send + Sync {
    /// Read a ref by its full name. `Ok(None)` if it does not exist.
    fn read_ref(&self, name: &str) -> RefResult<Option<Ref>>;

    /// The first of `names`, in order, that exists.
    ///
    /// Implementations should answer with a single lookup.
    fn first_exact_ref(&self, names: &[String]) -> RefResult<Option<Ref>>;

    /// All refs whose name starts with `prefix`, sorted by name.
    fn list_refs(&self, prefix: &str) -> RefResult<Vec<Ref>>;

    /// Create `name`, expecting it to be absent.
    fn create_ref(&self, name: &str, new: ObjectId) -> RefResult<RefUpdateResult> {
        self.apply(RefCommand::Create {
            name: name.to_string(),
            new,
        })
    }

    /// Move `name` from `old` to `new`.
    fn update_ref(&self, name: &str, old: ObjectId, new: ObjectId) -> RefResult<RefUpdateResult> {
        self.apply(RefCommand::Update {
            name: name.to_string(),
            old,
            new,
        })
    }

    /// Delete `name`, expecting it to point at `old`.
    fn delete_ref(&self, name: &str, old: ObjectId) -> RefResult<RefUpdateResult> {
        self.apply(RefCommand::Delete {
            name: name.to_string(),
            old,
        })
    }

    /// Apply one command.
    fn apply(&self, command: RefCommand) -> RefResult<RefUpdateResult> {
        let mut results = self.batch_update(std::slice::from_ref(&command))?;
        Ok(results.pop().unwrap_or(RefUpdateResult::NoChange))
    }

    /// Apply all commands atomically: every precondition is checked before
    /// anything is written, and either every command applies or none does.
    fn batch_update(&self, commands: &[RefCommand]) -> RefResult<Vec<RefUpdateResult>>;

    /// Refs visible to clients: everything except the edit namespace.
    fn advertised_refs(&self) -> RefResult<Vec<Ref>> {
        Ok(self
            .list_refs("refs/")?
            .into_iter()
            .filter(|r| !is_edit_ref(&r.name))
            .collect())
    }
}
