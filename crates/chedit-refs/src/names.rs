//! Ref name validation and the change/edit namespaces.
//!
//! Valid ref names:
//! - Must start with `refs/`
//! - Must not contain whitespace, control characters, `~`, `^`, `:`, `?`,
//!   `*`, `[`, `\`
//! - Must not contain `..` or `@{`
//! - Must not end with `/` or `.lock`
//! - Components between slashes must be non-empty and not start with `.`

use chedit_types::{AccountId, ChangeId, PatchSetId};

use crate::error::{RefError, RefResult};

const FORBIDDEN_CHARS: &[char] = &['~', '^', ':', '?', '*', '[', '\\'];

const USERS_PREFIX: &str = "refs/users/";
const CHANGES_PREFIX: &str = "refs/changes/";
const EDIT_COMPONENT: &str = "edit-";

/// Validate a full ref name, returning `Ok(())` if valid.
///
/// ```
/// use chedit_refs::names::validate_ref_name;
///
/// assert!(validate_ref_name("refs/changes/01/1/1").is_ok());
/// assert!(validate_ref_name("refs/heads/bad..name").is_err());
/// assert!(validate_ref_name("HEAD").is_err());
/// ```
pub fn validate_ref_name(name: &str) -> RefResult<()> {
    if !name.starts_with("refs/") {
        return Err(RefError::invalid_name(name, "must start with 'refs/'"));
    }
    if let Some(ch) = name
        .chars()
        .find(|c| c.is_whitespace() || c.is_control() || FORBIDDEN_CHARS.contains(c))
    {
        return Err(RefError::invalid_name(
            name,
            format!("contains forbidden character: {ch:?}"),
        ));
    }
    if name.contains("..") {
        return Err(RefError::invalid_name(name, "must not contain '..'"));
    }
    if name.contains("@{") {
        return Err(RefError::invalid_name(name, "must not contain '@{'"));
    }
    if name.ends_with('/') || name.ends_with(".lock") {
        return Err(RefError::invalid_name(
            name,
            "must not end with '/' or '.lock'",
        ));
    }
    for component in name.split('/') {
        if component.is_empty() {
            return Err(RefError::invalid_name(name, "path components must not be empty"));
        }
        if component.starts_with('.') {
            return Err(RefError::invalid_name(
                name,
                format!("component must not start with '.': {component:?}"),
            ));
        }
    }
    Ok(())
}

/// `refs/changes/<SS>/<change>/<ps>` for a published patch set.
pub fn patch_set_ref_name(ps: PatchSetId) -> String {
    format!(
        "{CHANGES_PREFIX}{}/{}/{}",
        ps.change.shard(),
        ps.change,
        ps.number
    )
}

/// Common prefix of every edit ref `account` may hold for `change`.
pub fn edit_ref_prefix(account: AccountId, change: ChangeId) -> String {
    format!(
        "{USERS_PREFIX}{}/{}/{EDIT_COMPONENT}{}/",
        account.shard(),
        account,
        change
    )
}

/// `refs/users/<SS>/<account>/edit-<change>/<ps>`.
pub fn edit_ref_name(account: AccountId, ps: PatchSetId) -> String {
    format!("{}{}", edit_ref_prefix(account, ps.change), ps.number)
}

/// The components encoded in an edit ref name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EditRefName {
    pub account: AccountId,
    pub change: ChangeId,
    /// Number of the patch set the edit is based on.
    pub patch_set: u32,
}

impl EditRefName {
    pub fn base(&self) -> PatchSetId {
        PatchSetId::new(self.change, self.patch_set)
    }
}

/// `true` if `name` lives in the edit namespace.
pub fn is_edit_ref(name: &str) -> bool {
    name.strip_prefix(USERS_PREFIX)
        .map(|rest| rest.split('/').any(|c| c.starts_with(EDIT_COMPONENT)))
        .unwrap_or(false)
}

/// Decode an edit ref name.
///
/// A name inside the edit namespace whose patch-set suffix is missing, not
/// numeric or zero is rejected with [`RefError::InvalidName`].
pub fn parse_edit_ref(name: &str) -> RefResult<EditRefName> {
    let rest = name
        .strip_prefix(USERS_PREFIX)
        .ok_or_else(|| RefError::invalid_name(name, "not under refs/users/"))?;
    let parts: Vec<&str> = rest.split('/').collect();
    let [shard, account, edit, ps] = parts.as_slice() else {
        return Err(RefError::invalid_name(name, "expected 4 components after refs/users/"));
    };

    let account: u32 = account
        .parse()
        .map_err(|_| RefError::invalid_name(name, "account id is not a number"))?;
    let account = AccountId(account);
    if *shard != account.shard() {
        return Err(RefError::invalid_name(name, "shard does not match account id"));
    }

    let change: u32 = edit
        .strip_prefix(EDIT_COMPONENT)
        .ok_or_else(|| RefError::invalid_name(name, "missing 'edit-' component"))?
        .parse()
        .map_err(|_| RefError::invalid_name(name, "change id is not a number"))?;

    let patch_set: u32 = ps
        .parse()
        .map_err(|_| RefError::invalid_name(name, format!("malformed patch set suffix {ps:?}")))?;
    if patch_set == 0 {
        return Err(RefError::invalid_name(name, "patch set numbers start at 1"));
    }

    Ok(EditRefName {
        account,
        change: ChangeId(change),
        patch_set,
    })
}
