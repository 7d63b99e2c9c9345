//! Review metadata: changes, patch sets and accounts.

use std::fmt;

use chedit_types::{AccountId, ChangeId, ObjectId, PatchSetId, PersonIdent, Timestamp};
use serde::{Deserialize, Serialize};

use crate::error::{EditError, EditResult};

/// The `Change-Id` footer value that ties commits to a change:
/// `I` followed by 40 lowercase hex digits.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChangeKey(String);

impl ChangeKey {
    pub fn parse(s: &str) -> EditResult<Self> {
        let valid = s.len() == 41
            && s.starts_with('I')
            && s[1..].bytes().all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b));
        if !valid {
            return Err(EditError::InvalidInput(format!("invalid Change-Id: {s}")));
        }
        Ok(Self(s.to_string()))
    }

    /// Derive a key from the first commit uploaded for a change.
    pub fn for_commit(id: &ObjectId) -> Self {
        Self(format!("I{}", hex::encode(&id.as_bytes()[..20])))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChangeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChangeStatus {
    New,
    Draft,
    Merged,
    Abandoned,
}

impl ChangeStatus {
    /// Open changes accept new edits and patch sets.
    pub fn is_open(&self) -> bool {
        matches!(self, Self::New | Self::Draft)
    }
}

impl fmt::Display for ChangeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::New => "new",
            Self::Draft => "draft",
            Self::Merged => "merged",
            Self::Abandoned => "abandoned",
        })
    }
}

/// A change under review.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub id: ChangeId,
    pub key: ChangeKey,
    pub project: String,
    pub owner: AccountId,
    pub status: ChangeStatus,
    pub current_patch_set: PatchSetId,
}

/// One published revision of a change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatchSet {
    pub id: PatchSetId,
    pub commit: ObjectId,
    pub draft: bool,
    pub uploader: AccountId,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub email: String,
}

impl Account {
    pub fn new(id: AccountId, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }

    pub fn ident(&self, when: Timestamp) -> PersonIdent {
        PersonIdent::new(self.name.clone(), self.email.clone(), when)
    }

    /// `true` if `ident` carries this account's own name and email.
    pub fn is_self(&self, ident: &PersonIdent) -> bool {
        ident.name == self.name && ident.email == self.email
    }
}

/// The caller of an edit operation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CurrentUser {
    Anonymous,
    Identified(Account),
}

impl CurrentUser {
    pub fn account(&self) -> EditResult<&Account> {
        match self {
            Self::Identified(account) => Ok(account),
            Self::Anonymous => Err(EditError::Unauthenticated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn change_key_parsing() {
        let key = ChangeKey::for_commit(&ObjectId::from_bytes(b"first upload"));
        assert_eq!(key.as_str().len(), 41);
        assert_eq!(ChangeKey::parse(key.as_str()).unwrap(), key);
        assert!(ChangeKey::parse("I123").is_err());
        assert!(ChangeKey::parse(&format!("X{}", &key.as_str()[1..])).is_err());
        assert!(ChangeKey::parse(&key.as_str().to_uppercase()).is_err());
    }

    #[test]
    fn open_statuses() {
        assert!(ChangeStatus::New.is_open());
        assert!(ChangeStatus::Draft.is_open());
        assert!(!ChangeStatus::Merged.is_open());
        assert_eq!(ChangeStatus::Abandoned.to_string(), "abandoned");
    }

    #[test]
    fn anonymous_user_has_no_account() {
        assert!(matches!(
            CurrentUser::Anonymous.account(),
            Err(EditError::Unauthenticated)
        ));
        let jane = Account::new(AccountId(7), "Jane", "jane@example.com");
        let user = CurrentUser::Identified(jane.clone());
        assert_eq!(user.account().unwrap(), &jane);
        assert!(jane.is_self(&jane.ident(Timestamp::epoch())));
    }
}
