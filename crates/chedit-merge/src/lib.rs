//! Diff and merge engine for change edits.
//!
//! - [`tree_diff`] compares two flat trees, detecting additions, deletions,
//!   modifications, mode changes and exact renames.
//! - [`text_merge`] performs a line-based three-way merge of file contents.
//! - [`tree_merge`] combines both to merge a base tree with two derived
//!   trees, reporting per-path conflicts when the sides cannot be
//!   reconciled.

pub mod error;
pub mod text_merge;
pub mod tree_diff;
pub mod tree_merge;

pub use error::{MergeError, MergeResult};
pub use text_merge::{merge_text, TextMerge};
pub use tree_diff::{diff_tree_objects, diff_trees, TreeChange, TreeDiff};
pub use tree_merge::{merge_trees, ConflictKind, MergeConflict, TreeMerge};
