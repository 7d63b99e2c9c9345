//! Reference management for the change edit engine.
//!
//! References are named, mutable pointers to commits. Every write is a
//! compare-and-swap against the caller's last observed value, which makes
//! the ref store the only source of atomicity for the layers above it.
//!
//! # Namespaces
//!
//! - `refs/changes/<SS>/<change>/<ps>` -- published patch sets
//! - `refs/users/<SS>/<account>/edit-<change>/<ps>` -- a user's pending edit
//!   of a change, based on patch set `<ps>`
//!
//! `<SS>` is the owning id modulo 100, zero padded to two digits. Edit refs
//! are private to their owner and never advertised.
//!
//! # Modules
//!
//! - [`error`] -- Error types for ref operations
//! - [`types`] -- [`Ref`], [`RefCommand`] and [`RefUpdateResult`]
//! - [`traits`] -- The [`RefStore`] trait defining the storage interface
//! - [`names`] -- Ref name validation and the change/edit namespaces
//! - [`memory`] -- In-memory [`InMemoryRefStore`]

pub mod error;
pub mod memory;
pub mod names;
pub mod traits;
pub mod types;

pub use error::{RefError, RefResult};
pub use memory::InMemoryRefStore;
pub use names::{
    edit_ref_name, edit_ref_prefix, is_edit_ref, parse_edit_ref, patch_set_ref_name,
    validate_ref_name, EditRefName,
};
pub use traits::RefStore;
pub use types::{Ref, RefCommand, RefUpdateResult};
