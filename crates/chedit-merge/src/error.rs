//! Error types for the merge crate.

use chedit_types::ObjectId;

/// Errors that can occur during diff and merge operations.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// An object referenced during the merge was not found in the store.
    #[error("object not found: {0}")]
    ObjectNotFound(ObjectId),

    /// Store operation failed.
    #[error("store error: {0}")]
    Store(#[from] chedit_store::StoreError),
}

/// Convenience alias for merge results.
pub type MergeResult<T> = Result<T, MergeError>;
