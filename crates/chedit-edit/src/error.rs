use chedit_refs::RefError;
use thiserror::Error;

/// Outcome of a failed edit operation.
///
/// Domain-rule violations carry fixed, user-facing messages; callers branch
/// on the variant, not the text.
#[derive(Debug, Error)]
pub enum EditError {
    /// The acting user is not identified.
    #[error("Authentication required")]
    Unauthenticated,

    #[error("{0}")]
    PermissionDenied(String),

    /// A precondition on the change or edit state does not hold, or a
    /// concurrent writer moved the edit ref first.
    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// The request itself is malformed (bad path, empty message, oversized
    /// content).
    #[error("{0}")]
    InvalidInput(String),

    /// Object or ref store failure, or corrupt repository state.
    #[error("I/O error: {0}")]
    Io(String),
}

impl EditError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict(_))
    }
}

impl From<RefError> for EditError {
    fn from(e: RefError) -> Self {
        match e {
            RefError::LockFailure { .. } => Self::Conflict(e.to_string()),
            other => Self::Io(other.to_string()),
        }
    }
}

impl From<chedit_store::StoreError> for EditError {
    fn from(e: chedit_store::StoreError) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<chedit_merge::MergeError> for EditError {
    fn from(e: chedit_merge::MergeError) -> Self {
        Self::Io(e.to_string())
    }
}

impl From<chedit_types::TypeError> for EditError {
    fn from(e: chedit_types::TypeError) -> Self {
        Self::InvalidInput(e.to_string())
    }
}

pub type EditResult<T> = Result<T, EditError>;
