//! Numeric identifiers for accounts, changes and patch sets.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Two-digit shard used by ref namespaces (`id % 100`, zero padded).
fn shard(id: u32) -> String {
    format!("{:02}", id % 100)
}

/// A registered user account.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AccountId(pub u32);

impl AccountId {
    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn shard(&self) -> String {
        shard(self.0)
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A change under review.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChangeId(pub u32);

impl ChangeId {
    pub fn get(&self) -> u32 {
        self.0
    }

    pub fn shard(&self) -> String {
        shard(self.0)
    }
}

impl fmt::Display for ChangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A numbered patch set of a change. Numbers start at 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PatchSetId {
    pub change: ChangeId,
    pub number: u32,
}

impl PatchSetId {
    pub fn new(change: ChangeId, number: u32) -> Self {
        Self { change, number }
    }

    /// The patch set that would follow this one.
    pub fn next(&self) -> Self {
        Self {
            change: self.change,
            number: self.number + 1,
        }
    }
}

impl fmt::Display for PatchSetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.change, self.number)
    }
}

impl FromStr for PatchSetId {
    type Err = TypeError;

    /// Parses the `<change>,<number>` form produced by `Display`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (change, number) = s
            .split_once(',')
            .ok_or_else(|| TypeError::InvalidId(format!("not a patch set id: {s}")))?;
        let change = change
            .parse::<u32>()
            .map_err(|e| TypeError::InvalidId(format!("{s}: {e}")))?;
        let number = number
            .parse::<u32>()
            .map_err(|e| TypeError::InvalidId(format!("{s}: {e}")))?;
        if number == 0 {
            return Err(TypeError::InvalidId(format!("{s}: patch set numbers start at 1")));
        }
        Ok(Self::new(ChangeId(change), number))
    }
}
