//! Content-addressed object storage for the change edit engine.
//!
//! Every blob, tree and commit is stored as an immutable object identified
//! by the BLAKE3 hash of its bytes, domain-separated by object kind.
//!
//! # Object Types
//!
//! - [`Blob`] -- raw file content
//! - [`Tree`] -- flat, path-sorted mapping of file paths to blob ids and modes
//! - [`Commit`] -- tree, parents, author, committer, and message
//!
//! # Storage Backends
//!
//! All backends implement the [`ObjectStore`] trait:
//!
//! - [`InMemoryObjectStore`] -- `HashMap`-based store for tests and embedding
//!
//! Writers batch new objects in an [`ObjectInserter`] and flush once per
//! operation, before any ref is moved to point at them.
//!
//! # Design Rules
//!
//! 1. Objects are immutable once written (content-addressing guarantees this).
//! 2. Write-then-link: flush objects first, then update refs.
//! 3. Unreferenced objects are left for garbage collection, never deleted
//!    by writers.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod hasher;
pub mod inserter;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use hasher::ContentHasher;
pub use inserter::ObjectInserter;
pub use memory::InMemoryObjectStore;
pub use object::{Blob, Commit, EntryMode, ObjectKind, StoredObject, Tree, TreeEntry};
pub use traits::ObjectStore;
