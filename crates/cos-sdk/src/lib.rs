//! High-level SDK for cross-origin storage.
//!
//! [`CrossOriginStorage`] is the main entry point: it turns content hashes
//! into [`FileHandle`]s, asking the user (through an injected
//! [`PermissionPrompter`](cos_gate::PermissionPrompter)) before any origin
//! may read shared bytes. [`HashCache`] layers a keyed cache on top for
//! callers that look resources up by URL.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use cos_gate::StaticPrompter;
//! use cos_host::StorageHost;
//! use cos_sdk::{ClientConfig, CrossOriginStorage, RequestOptions};
//! use cos_types::Origin;
//!
//! # tokio::runtime::Runtime::new().unwrap().block_on(async {
//! let storage = CrossOriginStorage::connect_in_process(
//!     Origin::new("example.com").unwrap(),
//!     Arc::new(StorageHost::in_memory()),
//!     Arc::new(StaticPrompter::allow_session()),
//!     ClientConfig::default(),
//! );
//! let hash = storage.hash(b"weights");
//! let handles = storage
//!     .request_file_handles(&[hash.clone()], RequestOptions::create())
//!     .await
//!     .unwrap();
//! let mut stream = handles[0].open_write_stream();
//! stream.write(b"weights".to_vec()).await.unwrap();
//! stream.close().await.unwrap();
//!
//! let handles = storage
//!     .request_file_handles(&[hash], RequestOptions::read())
//!     .await
//!     .unwrap();
//! assert_eq!(handles[0].read().await.unwrap(), b"weights");
//! # });
//! ```

pub mod cache;
mod channel;
pub mod config;
pub mod error;
pub mod handle;
pub mod permissions;
pub mod storage;

pub use cache::{CacheConfig, HashCache, KeyIndex, KeyNormalizer};
pub use config::ClientConfig;
pub use error::{SdkError, SdkResult};
pub use handle::{FileHandle, HandleIntent, RequestOptions, WritableFileStream, WriteAck};
pub use permissions::RemotePermissionStore;
pub use storage::CrossOriginStorage;

// Re-export key types
pub use cos_types::{ContentHash, HashAlgorithm, Origin, PermissionDecision};
