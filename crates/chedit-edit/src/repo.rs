//! Repository handles.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use chedit_refs::{InMemoryRefStore, RefStore};
use chedit_store::{InMemoryObjectStore, ObjectStore};
use tracing::debug;

use crate::error::{EditError, EditResult};

/// Object and ref storage of one project.
///
/// Handles are cheap to clone; operations open one at their start and drop
/// it at their end.
#[derive(Clone)]
pub struct Repository {
    pub objects: Arc<dyn ObjectStore>,
    pub refs: Arc<dyn RefStore>,
}

impl Repository {
    pub fn new(objects: Arc<dyn ObjectStore>, refs: Arc<dyn RefStore>) -> Self {
        Self { objects, refs }
    }
}

impl std::fmt::Debug for Repository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Repository").finish_non_exhaustive()
    }
}

/// Opens repositories by project name.
pub trait RepositoryManager: Send + Sync {
    fn open(&self, project: &str) -> EditResult<Repository>;
}

/// Keeps every project in memory.
#[derive(Default)]
pub struct InMemoryRepositoryManager {
    repos: RwLock<HashMap<String, InMemoryRepository>>,
}

/// The concrete stores behind an in-memory project, kept so tests can
/// inject failures.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    pub objects: Arc<InMemoryObjectStore>,
    pub refs: Arc<InMemoryRefStore>,
}

impl InMemoryRepository {
    pub fn handle(&self) -> Repository {
        Repository::new(self.objects.clone(), self.refs.clone())
    }
}

impl InMemoryRepositoryManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `project` if needed and return its stores.
    pub fn create(&self, project: &str) -> InMemoryRepository {
        let mut repos = self.repos.write().unwrap_or_else(PoisonError::into_inner);
        repos
            .entry(project.to_string())
            .or_insert_with(|| {
                debug!(project, "created in-memory repository");
                InMemoryRepository::default()
            })
            .clone()
    }

    pub fn get(&self, project: &str) -> Option<InMemoryRepository> {
        self.repos
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(project)
            .cloned()
    }
}

impl RepositoryManager for InMemoryRepositoryManager {
    fn open(&self, project: &str) -> EditResult<Repository> {
        let repos = self
            .repos
            .read()
            .map_err(|e| EditError::Io(format!("lock poisoned: {e}")))?;
        repos
            .get(project)
            .map(InMemoryRepository::handle)
            .ok_or_else(|| EditError::NotFound(format!("project {project} not found")))
    }
}
