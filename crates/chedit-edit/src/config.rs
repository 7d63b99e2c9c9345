//! Edit engine configuration, loadable from TOML.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Errors from loading an [`EditConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for the change edit engine.
///
/// Every field has a default, so a partial (or empty) TOML document is
/// valid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditConfig {
    /// Offset recorded on committer timestamps the engine writes.
    pub timezone_offset_minutes: i16,
    /// Largest file content accepted by a content edit, in bytes.
    pub max_file_size: u64,
    pub commit_message: CommitMessageConfig,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommitMessageConfig {
    /// Reject edited messages without a `Change-Id` footer.
    pub require_change_id: bool,
}

impl Default for EditConfig {
    fn default() -> Self {
        Self {
            timezone_offset_minutes: 0,
            max_file_size: 10 * 1024 * 1024,
            commit_message: CommitMessageConfig::default(),
        }
    }
}

impl Default for CommitMessageConfig {
    fn default() -> Self {
        Self {
            require_change_id: true,
        }
    }
}

impl EditConfig {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }
}
