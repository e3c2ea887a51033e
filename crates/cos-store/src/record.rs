use cos_types::ContentHash;

/// One stored blob, addressed by its hash.
///
/// Records are replaced whole on every write and never partially updated.
/// A freshly reserved record has no bytes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StorageRecord {
    pub hash: ContentHash,
    pub bytes: Vec<u8>,
}

impl StorageRecord {
    pub fn new(hash: ContentHash, bytes: Vec<u8>) -> Self {
        Self { hash, bytes }
    }

    /// An empty record reserved so a later write can target `hash`.
    pub fn placeholder(hash: ContentHash) -> Self {
        Self {
            hash,
            bytes: Vec::new(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}
