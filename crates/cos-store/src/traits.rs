use cos_types::ContentHash;

use crate::error::StoreResult;

/// Content-addressed blob store backing the storage host.
///
/// All implementations must satisfy these invariants:
/// - At most one record exists per [`ContentHash`].
/// - `write` replaces the whole record atomically with respect to that hash.
///   Writes to different hashes never interfere.
/// - `reserve` never clobbers an existing record.
/// - The store never interprets blob contents.
/// - All I/O errors are propagated, never silently ignored.
pub trait BlobStore: Send + Sync {
    /// Read a record's bytes.
    ///
    /// Returns `Ok(None)` if no record exists.
    fn read(&self, hash: &ContentHash) -> StoreResult<Option<Vec<u8>>>;

    /// Create or replace the record for `hash`.
    fn write(&self, hash: &ContentHash, bytes: &[u8]) -> StoreResult<()>;

    /// Reserve an empty record for `hash` if none exists.
    ///
    /// Returns `true` if a placeholder was created.
    fn reserve(&self, hash: &ContentHash) -> StoreResult<bool>;

    /// Check whether a record exists.
    fn exists(&self, hash: &ContentHash) -> StoreResult<bool>;

    /// Delete a record. Returns `true` if it existed.
    fn delete(&self, hash: &ContentHash) -> StoreResult<bool>;

    /// Check existence for a batch of hashes, in order.
    fn exists_batch(&self, hashes: &[ContentHash]) -> StoreResult<Vec<bool>> {
        hashes.iter().map(|hash| self.exists(hash)).collect()
    }

    /// Reserve a batch of hashes, in order.
    fn reserve_batch(&self, hashes: &[ContentHash]) -> StoreResult<Vec<bool>> {
        hashes.iter().map(|hash| self.reserve(hash)).collect()
    }
}
