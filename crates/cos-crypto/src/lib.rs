//! Content hashing for cross-origin storage.
//!
//! Computes the [`ContentHash`](cos_types::ContentHash) that addresses a blob.
//! SHA-256 is the session default; BLAKE3 is available for callers that
//! want it. All digests wrap established libraries.

pub mod hasher;

pub use hasher::ContentHasher;
