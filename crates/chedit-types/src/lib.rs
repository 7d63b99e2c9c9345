//! Foundation types for the change edit engine.
//!
//! Every other `chedit` crate depends on `chedit-types`. The types here are
//! plain values: they carry no storage handles and perform no I/O.
//!
//! # Key Types
//!
//! - [`ObjectId`] -- Content-addressed identifier (BLAKE3 hash)
//! - [`Timestamp`] -- Wall-clock instant with a timezone offset
//! - [`PersonIdent`] -- Author/committer identity plus timestamp
//! - [`AccountId`] / [`ChangeId`] / [`PatchSetId`] -- Numeric review identifiers

pub mod error;
pub mod ids;
pub mod object;
pub mod person;
pub mod temporal;

pub use error::TypeError;
pub use ids::{AccountId, ChangeId, PatchSetId};
pub use object::ObjectId;
pub use person::PersonIdent;
pub use temporal::Timestamp;
