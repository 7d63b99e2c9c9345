//! Commit message rules for edited messages.

use crate::change::Change;
use crate::config::CommitMessageConfig;
use crate::error::{EditError, EditResult};

const CHANGE_ID_FOOTER: &str = "Change-Id";
const LINK_FOOTER: &str = "Link";

/// Validates the `Change-Id` footer of a replacement commit message. A
/// `Link: <url>/id/<Change-Id>` footer stands in for `Change-Id`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CommitMessagePolicy {
    pub require_change_id: bool,
}

impl Default for CommitMessagePolicy {
    fn default() -> Self {
        Self {
            require_change_id: true,
        }
    }
}

impl From<&CommitMessageConfig> for CommitMessagePolicy {
    fn from(config: &CommitMessageConfig) -> Self {
        Self {
            require_change_id: config.require_change_id,
        }
    }
}

impl CommitMessagePolicy {
    pub fn check(&self, change: &Change, message: &str) -> EditResult<()> {
        let mut ids = footer_values(message, CHANGE_ID_FOOTER);
        for linked in footer_values(message, LINK_FOOTER)
            .into_iter()
            .filter_map(linked_change_id)
        {
            if !ids.contains(&linked) {
                ids.push(linked);
            }
        }
        match ids.as_slice() {
            [] if self.require_change_id => {
                Err(EditError::Conflict("missing Change-Id footer".into()))
            }
            [] => Ok(()),
            [id] if *id == change.key.as_str() => Ok(()),
            [_] => Err(EditError::Conflict("wrong Change-Id footer".into())),
            _ => Err(EditError::Conflict("multiple Change-Id footers".into())),
        }
    }
}

/// Values of every `key: value` footer line in the message's last
/// paragraph. The key match is case-insensitive. A message with a single
/// paragraph has no footers.
pub fn footer_values<'a>(message: &'a str, key: &str) -> Vec<&'a str> {
    let lines: Vec<&str> = message.trim_end().lines().collect();
    let Some(last_blank) = lines.iter().rposition(|l| l.trim().is_empty()) else {
        return Vec::new();
    };
    lines[last_blank + 1..]
        .iter()
        .filter_map(|line| {
            let (k, v) = line.split_once(':')?;
            k.trim().eq_ignore_ascii_case(key).then(|| v.trim())
        })
        .collect()
}

/// The change key at the end of a `Link` footer value, if it points at one.
fn linked_change_id(link: &str) -> Option<&str> {
    let (_, id) = link.rsplit_once("/id/")?;
    let id = id.trim_end_matches('/');
    (id.starts_with('I') && id.len() > 1 && !id.contains('/')).then_some(id)
}

/// `true` if the two messages differ only in trailing whitespace and blank
/// lines.
pub fn same_message(a: &str, b: &str) -> bool {
    a.trim_end() == b.trim_end()
}
