//! Content-addressed blob storage for cross-origin storage.
//!
//! The storage host is the only component that touches a [`BlobStore`];
//! requesters never see file names, paths, or other records.
//!
//! # Storage Backends
//!
//! - [`InMemoryBlobStore`] -- `HashMap`-based store for tests and embedding
//! - [`FsBlobStore`] -- one file per record under a root directory
//!
//! # Design Rules
//!
//! 1. One record per content hash; re-writing a hash replaces its bytes.
//! 2. Writes are whole-record replacements, never partial.
//! 3. Reserving a hash leaves an existing record untouched.
//! 4. The store never interprets blob contents -- it is a pure key-value store.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod error;
pub mod fs;
pub mod memory;
pub mod record;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsBlobStore;
pub use memory::InMemoryBlobStore;
pub use record::StorageRecord;
pub use traits::BlobStore;
