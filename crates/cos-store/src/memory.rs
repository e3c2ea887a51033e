use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use cos_types::ContentHash;

use crate::error::{StoreError, StoreResult};
use crate::record::StorageRecord;
use crate::traits::BlobStore;

/// In-memory, HashMap-based blob store.
///
/// Intended for tests and embedding. All records are held in memory behind a
/// `RwLock` for safe concurrent access. Bytes are cloned on read/write.
pub struct InMemoryBlobStore {
    records: RwLock<HashMap<ContentHash, StorageRecord>>,
}

impl InMemoryBlobStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
        }
    }

    fn read_map(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<ContentHash, StorageRecord>>> {
        self.records.read().map_err(|_| StoreError::Poisoned)
    }

    fn write_map(&self) -> StoreResult<RwLockWriteGuard<'_, HashMap<ContentHash, StorageRecord>>> {
        self.records.write().map_err(|_| StoreError::Poisoned)
    }

    /// Number of records currently stored, placeholders included.
    pub fn len(&self) -> usize {
        self.read_map().map(|map| map.len()).unwrap_or(0)
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total bytes across all stored records.
    pub fn total_bytes(&self) -> u64 {
        self.read_map()
            .map(|map| map.values().map(StorageRecord::size).sum())
            .unwrap_or(0)
    }

    /// Remove all records from the store.
    pub fn clear(&self) -> StoreResult<()> {
        self.write_map()?.clear();
        Ok(())
    }

    /// Snapshot of a single record.
    pub fn record(&self, hash: &ContentHash) -> StoreResult<Option<StorageRecord>> {
        Ok(self.read_map()?.get(hash).cloned())
    }
}

impl Default for InMemoryBlobStore {
    fn default() -> Self {
        Self::new()
    }
}

impl BlobStore for InMemoryBlobStore {
    fn read(&self, hash: &ContentHash) -> StoreResult<Option<Vec<u8>>> {
        Ok(self.read_map()?.get(hash).map(|record| record.bytes.clone()))
    }

    fn write(&self, hash: &ContentHash, bytes: &[u8]) -> StoreResult<()> {
        if !hash.is_well_formed() {
            return Err(StoreError::MalformedHash(hash.clone()));
        }
        let mut map = self.write_map()?;
        map.insert(hash.clone(), StorageRecord::new(hash.clone(), bytes.to_vec()));
        Ok(())
    }

    fn reserve(&self, hash: &ContentHash) -> StoreResult<bool> {
        if !hash.is_well_formed() {
            return Err(StoreError::MalformedHash(hash.clone()));
        }
        let mut map = self.write_map()?;
        if map.contains_key(hash) {
            return Ok(false);
        }
        map.insert(hash.clone(), StorageRecord::placeholder(hash.clone()));
        Ok(true)
    }

    fn exists(&self, hash: &ContentHash) -> StoreResult<bool> {
        Ok(self.read_map()?.contains_key(hash))
    }

    fn delete(&self, hash: &ContentHash) -> StoreResult<bool> {
        Ok(self.write_map()?.remove(hash).is_some())
    }
}

impl std::fmt::Debug for InMemoryBlobStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryBlobStore")
            .field("record_count", &self.len())
            .finish()
    }
}
