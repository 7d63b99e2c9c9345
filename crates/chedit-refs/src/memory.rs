//! In-memory reference store for testing and embedding.
//!
//! [`InMemoryRefStore`] keeps all refs in a `BTreeMap` behind a `RwLock`,
//! so a batch holds the write lock while it checks and applies every
//! command.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};

use chedit_types::ObjectId;
use tracing::{debug, warn};

use crate::error::{RefError, RefResult};
use crate::names::validate_ref_name;
use crate::traits::RefStore;
use crate::types::{Ref, RefCommand, RefUpdateResult};

/// An in-memory implementation of [`RefStore`].
#[derive(Debug, Default)]
pub struct InMemoryRefStore {
    refs: RwLock<BTreeMap<String, ObjectId>>,
    fail_writes: AtomicBool,
}

fn poisoned<T>(e: PoisonError<T>) -> RefError {
    RefError::Io(format!("lock poisoned: {e}"))
}

impl InMemoryRefStore {
    /// Create a new empty ref store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent write fail with [`RefError::Io`].
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.refs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Outcome of `command` against the ref's current value, or the lock
/// failure that rejects it.
fn check(command: &RefCommand, current: Option<ObjectId>) -> RefResult<RefUpdateResult> {
    let lock_failure = || RefError::LockFailure {
        name: command.name().to_string(),
        expected: command.expected(),
        actual: current,
    };
    match (command, current) {
        (_, current) if current == command.new_value() => Ok(RefUpdateResult::NoChange),
        (RefCommand::Create { .. }, None) => Ok(RefUpdateResult::Created),
        (RefCommand::Update { old, .. }, Some(cur)) if cur == *old => Ok(RefUpdateResult::Updated),
        (RefCommand::Delete { old, .. }, Some(cur)) if cur == *old => Ok(RefUpdateResult::Deleted),
        _ => Err(lock_failure()),
    }
}

impl RefStore for InMemoryRefStore {
    fn read_ref(&self, name: &str) -> RefResult<Option<Ref>> {
        let refs = self.refs.read().map_err(poisoned)?;
        Ok(refs.get(name).map(|id| Ref::new(name, *id)))
    }

    fn first_exact_ref(&self, names: &[String]) -> RefResult<Option<Ref>> {
        let refs = self.refs.read().map_err(poisoned)?;
        Ok(names
            .iter()
            .find_map(|name| refs.get(name).map(|id| Ref::new(name.clone(), *id))))
    }

    fn list_refs(&self, prefix: &str) -> RefResult<Vec<Ref>> {
        let refs = self.refs.read().map_err(poisoned)?;
        Ok(refs
            .range(prefix.to_string()..)
            .take_while(|(name, _)| name.starts_with(prefix))
            .map(|(name, id)| Ref::new(name.clone(), *id))
            .collect())
    }

    fn batch_update(&self, commands: &[RefCommand]) -> RefResult<Vec<RefUpdateResult>> {
        for command in commands {
            validate_ref_name(command.name())?;
        }
        let mut refs = self.refs.write().map_err(poisoned)?;

        // Check every precondition against a scratch view before touching
        // the real map, so later commands see earlier ones in the batch.
        let mut view: BTreeMap<&str, Option<ObjectId>> = BTreeMap::new();
        let mut results = Vec::with_capacity(commands.len());
        for command in commands {
            let name = command.name();
            let current = match view.get(name) {
                Some(v) => *v,
                None => refs.get(name).copied(),
            };
            let result = check(command, current).inspect_err(|e| {
                debug!(ref_name = %name, error = %e, "ref update rejected");
            })?;
            view.insert(name, command.new_value());
            results.push(result);
        }

        if self.fail_writes.load(Ordering::SeqCst) {
            warn!(commands = commands.len(), "injected ref store write failure");
            return Err(RefError::Io("ref store is failing writes".into()));
        }

        for (name, value) in view {
            match value {
                Some(id) => {
                    refs.insert(name.to_string(), id);
                }
                None => {
                    refs.remove(name);
                }
            }
        }
        debug!(commands = commands.len(), "applied ref batch");
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn oid(b: u8) -> ObjectId {
        ObjectId::from_hash([b; 32])
    }

    const NAME: &str = "refs/changes/01/1/1";

    #[test]
    fn create_and_read() {
        let store = InMemoryRefStore::new();
        assert_eq!(store.create_ref(NAME, oid(1)).unwrap(), RefUpdateResult::Created);
        assert_eq!(store.read_ref(NAME).unwrap(), Some(Ref::new(NAME, oid(1))));
        assert!(store.read_ref("refs/changes/01/1/2").unwrap().is_none());
    }

    #[test]
    fn create_existing_with_other_value_is_lock_failure() {
        let store = InMemoryRefStore::new();
        store.create_ref(NAME, oid(1)).unwrap();
        let err = store.create_ref(NAME, oid(2)).unwrap_err();
        assert!(matches!(
            err,
            RefError::LockFailure { expected: None, actual: Some(a), .. } if a == oid(1)
        ));
    }

    #[test]
    fn create_with_same_value_is_no_change() {
        let store = InMemoryRefStore::new();
        store.create_ref(NAME, oid(1)).unwrap();
        assert_eq!(store.create_ref(NAME, oid(1)).unwrap(), RefUpdateResult::NoChange);
    }

    #[test]
    fn update_requires_observed_value() {
        let store = InMemoryRefStore::new();
        store.create_ref(NAME, oid(1)).unwrap();
        assert_eq!(
            store.update_ref(NAME, oid(1), oid(2)).unwrap(),
            RefUpdateResult::Updated
        );
        // A second writer still holding oid(1) loses.
        let err = store.update_ref(NAME, oid(1), oid(3)).unwrap_err();
        assert!(err.is_lock_failure());
        assert_eq!(store.read_ref(NAME).unwrap().unwrap().target, oid(2));
    }

    #[test]
    fn update_of_absent_ref_is_lock_failure() {
        let store = InMemoryRefStore::new();
        assert!(store.update_ref(NAME, oid(1), oid(2)).unwrap_err().is_lock_failure());
    }

    #[test]
    fn delete_semantics() {
        let store = InMemoryRefStore::new();
        store.create_ref(NAME, oid(1)).unwrap();
        assert!(store.delete_ref(NAME, oid(9)).unwrap_err().is_lock_failure());
        assert_eq!(store.delete_ref(NAME, oid(1)).unwrap(), RefUpdateResult::Deleted);
        assert_eq!(store.delete_ref(NAME, oid(1)).unwrap(), RefUpdateResult::NoChange);
        assert!(store.is_empty());
    }

    #[test]
    fn batch_is_all_or_nothing() {
        let store = InMemoryRefStore::new();
        store.create_ref("refs/a/1", oid(1)).unwrap();
        let err = store
            .batch_update(&[
                RefCommand::Create {
                    name: "refs/a/2".into(),
                    new: oid(2),
                },
                RefCommand::Delete {
                    name: "refs/a/1".into(),
                    old: oid(7),
                },
            ])
            .unwrap_err();
        assert!(err.is_lock_failure());
        assert!(store.read_ref("refs/a/2").unwrap().is_none());
        assert!(store.read_ref("refs/a/1").unwrap().is_some());

        let results = store
            .batch_update(&[
                RefCommand::Create {
                    name: "refs/a/2".into(),
                    new: oid(2),
                },
                RefCommand::Delete {
                    name: "refs/a/1".into(),
                    old: oid(1),
                },
            ])
            .unwrap();
        assert_eq!(results, vec![RefUpdateResult::Created, RefUpdateResult::Deleted]);
        assert_eq!(store.list_refs("refs/a/").unwrap(), vec![Ref::new("refs/a/2", oid(2))]);
    }

    #[test]
    fn batch_sees_its_own_earlier_commands() {
        let store = InMemoryRefStore::new();
        let results = store
            .batch_update(&[
                RefCommand::Create {
                    name: "refs/a/1".into(),
                    new: oid(1),
                },
                RefCommand::Update {
                    name: "refs/a/1".into(),
                    old: oid(1),
                    new: oid(2),
                },
            ])
            .unwrap();
        assert_eq!(results, vec![RefUpdateResult::Created, RefUpdateResult::Updated]);
        assert_eq!(store.read_ref("refs/a/1").unwrap().unwrap().target, oid(2));
    }

    #[test]
    fn invalid_name_is_rejected_before_write() {
        let store = InMemoryRefStore::new();
        assert!(matches!(
            store.create_ref("refs/bad..name", oid(1)),
            Err(RefError::InvalidName { .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn failing_writes_leave_store_untouched() {
        let store = InMemoryRefStore::new();
        store.create_ref(NAME, oid(1)).unwrap();
        store.set_fail_writes(true);
        assert!(matches!(store.update_ref(NAME, oid(1), oid(2)), Err(RefError::Io(_))));
        assert_eq!(store.read_ref(NAME).unwrap().unwrap().target, oid(1));
    }

    #[test]
    fn first_exact_ref_respects_order() {
        let store = InMemoryRefStore::new();
        store.create_ref("refs/x/1", oid(1)).unwrap();
        store.create_ref("refs/x/2", oid(2)).unwrap();
        let names = vec!["refs/x/3".to_string(), "refs/x/2".into(), "refs/x/1".into()];
        assert_eq!(store.first_exact_ref(&names).unwrap().unwrap().target, oid(2));
        assert!(store.first_exact_ref(&["refs/x/9".to_string()]).unwrap().is_none());
    }

    #[test]
    fn advertised_refs_hide_edits() {
        let store = InMemoryRefStore::new();
        store.create_ref("refs/changes/11/11/1", oid(1)).unwrap();
        store.create_ref("refs/users/05/5/edit-11/1", oid(2)).unwrap();
        let advertised: Vec<String> = store
            .advertised_refs()
            .unwrap()
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(advertised, vec!["refs/changes/11/11/1"]);
        assert_eq!(store.list_refs("refs/users/").unwrap().len(), 1);
    }
}
