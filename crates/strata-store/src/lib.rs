//! Object records and blob storage for Strata.
//!
//! Two kinds of state live here:
//!
//! - [`ObjectTable`] -- the Transport tier's identifier → payload records,
//!   keyed by short random [`ObjectId`]s.
//! - [`BlobStore`] -- the Storage tier's key → bytes persistence, with
//!   [`FsBlobStore`] writing one file per key and [`InMemoryBlobStore`] for
//!   tests and embedding.
//!
//! # Design Rules
//!
//! 1. Blob writes overwrite; they are not atomic.
//! 2. Keys reach the filesystem only through a [`PathPolicy`].
//! 3. All I/O errors are propagated to the caller, never retried.

pub mod error;
pub mod fs;
pub mod memory;
pub mod object;
pub mod path;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsBlobStore;
pub use memory::InMemoryBlobStore;
pub use object::{ObjectId, ObjectTable, OBJECT_ID_LEN};
pub use path::{ConfinedRoot, PathPolicy, ShardedRoot, VerbatimPaths};
pub use traits::BlobStore;
