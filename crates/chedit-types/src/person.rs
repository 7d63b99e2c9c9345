use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::temporal::Timestamp;

/// Name, email and timestamp recorded as a commit's author or committer.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PersonIdent {
    pub name: String,
    pub email: String,
    pub when: Timestamp,
}

impl PersonIdent {
    pub fn new(name: impl Into<String>, email: impl Into<String>, when: Timestamp) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            when,
        }
    }

    /// Reject names and emails that cannot be written on a commit header
    /// line.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.name.trim().is_empty() {
            return Err(TypeError::InvalidIdentity("name must not be empty".into()));
        }
        for (field, value) in [("name", &self.name), ("email", &self.email)] {
            if value.contains(['<', '>', '\n', '\0']) {
                return Err(TypeError::InvalidIdentity(format!(
                    "{field} contains a forbidden character: {value:?}"
                )));
            }
        }
        Ok(())
    }

    /// `true` if name and email match, ignoring the timestamp.
    pub fn same_identity(&self, other: &Self) -> bool {
        self.name == other.name && self.email == other.email
    }

    /// Same identity, different instant.
    pub fn with_when(&self, when: Timestamp) -> Self {
        Self {
            name: self.name.clone(),
            email: self.email.clone(),
            when,
        }
    }
}

impl fmt::Display for PersonIdent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}> {}", self.name, self.email, self.when)
    }
}
