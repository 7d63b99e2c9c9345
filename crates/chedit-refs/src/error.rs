//! Error types for reference operations.

use chedit_types::ObjectId;
use thiserror::Error;

/// Errors that can occur during reference operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The ref's current value did not match the caller's expectation.
    ///
    /// `None` means "absent" on either side.
    #[error("lock failure on {name}: expected {expected:?}, found {actual:?}")]
    LockFailure {
        name: String,
        expected: Option<ObjectId>,
        actual: Option<ObjectId>,
    },

    /// The ref name is malformed or outside the expected namespace.
    #[error("invalid ref name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// The backend failed to read or persist refs.
    #[error("ref store I/O error: {0}")]
    Io(String),
}

impl RefError {
    pub fn invalid_name(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidName {
            name: name.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_lock_failure(&self) -> bool {
        matches!(self, Self::LockFailure { .. })
    }
}

/// Convenience type alias for ref operations.
pub type RefResult<T> = std::result::Result<T, RefError>;
