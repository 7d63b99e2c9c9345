use std::collections::HashMap;

use chedit_types::ObjectId;
use tracing::debug;

use crate::error::StoreResult;
use crate::object::{Blob, Commit, StoredObject, Tree};
use crate::traits::ObjectStore;

/// Buffers new objects for one logical operation.
///
/// Ids are computed on insert so callers can build trees and commits that
/// reference not-yet-written objects. Nothing reaches the backing store
/// until [`flush`](Self::flush), which must happen before any ref is
/// pointed at the inserted objects.
pub struct ObjectInserter<'a> {
    store: &'a dyn ObjectStore,
    /// Buffered objects in insertion order.
    pending: Vec<StoredObject>,
    /// Position of each buffered object in `pending`.
    index: HashMap<ObjectId, usize>,
}

impl<'a> ObjectInserter<'a> {
    pub fn new(store: &'a dyn ObjectStore) -> Self {
        Self {
            store,
            pending: Vec::new(),
            index: HashMap::new(),
        }
    }

    pub fn insert(&mut self, object: StoredObject) -> ObjectId {
        let id = object.compute_id();
        if !self.index.contains_key(&id) {
            self.index.insert(id, self.pending.len());
            self.pending.push(object);
        }
        id
    }

    pub fn insert_blob(&mut self, data: Vec<u8>) -> ObjectId {
        self.insert(Blob::new(data).to_stored_object())
    }

    pub fn insert_tree(&mut self, tree: &Tree) -> StoreResult<ObjectId> {
        Ok(self.insert(tree.to_stored_object()?))
    }

    pub fn insert_commit(&mut self, commit: &Commit) -> StoreResult<ObjectId> {
        Ok(self.insert(commit.to_stored_object()?))
    }

    /// Read through the buffer, falling back to the backing store.
    pub fn read(&self, id: &ObjectId) -> StoreResult<Option<StoredObject>> {
        if let Some(&i) = self.index.get(id) {
            return Ok(Some(self.pending[i].clone()));
        }
        self.store.read(id)
    }

    /// Number of buffered objects not yet flushed.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Write all buffered objects to the backing store.
    pub fn flush(&mut self) -> StoreResult<()> {
        if self.pending.is_empty() {
            return Ok(());
        }
        let written = self.store.write_batch(&self.pending)?;
        debug!(objects = written.len(), "flushed inserted objects");
        self.pending.clear();
        self.index.clear();
        Ok(())
    }
}
