use std::io::{self, Read};

use cos_types::{ContentHash, HashAlgorithm};
use sha2::{Digest, Sha256};

const READ_CHUNK: usize = 64 * 1024;

/// Computes content hashes with one fixed digest scheme.
///
/// Hashing is pure: the same bytes always produce the same [`ContentHash`],
/// and the only failure mode is an unreadable input.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentHasher {
    algorithm: HashAlgorithm,
}

impl ContentHasher {
    pub const SHA256: Self = Self {
        algorithm: HashAlgorithm::Sha256,
    };
    pub const BLAKE3: Self = Self {
        algorithm: HashAlgorithm::Blake3,
    };

    pub const fn for_algorithm(algorithm: HashAlgorithm) -> Self {
        Self { algorithm }
    }

    pub fn algorithm(&self) -> HashAlgorithm {
        self.algorithm
    }

    /// Hash an in-memory blob.
    pub fn hash(&self, data: &[u8]) -> ContentHash {
        match self.algorithm {
            HashAlgorithm::Sha256 => {
                ContentHash::from_digest(self.algorithm, &Sha256::digest(data))
            }
            HashAlgorithm::Blake3 => {
                ContentHash::from_digest(self.algorithm, blake3::hash(data).as_bytes())
            }
        }
    }

    /// Hash a blob from a reader without buffering it whole.
    pub fn hash_reader<R: Read>(&self, mut reader: R) -> io::Result<ContentHash> {
        let mut buf = vec![0u8; READ_CHUNK];
        match self.algorithm {
            HashAlgorithm::Sha256 => {
                let mut hasher = Sha256::new();
                loop {
                    let n = reader.read(&mut buf)?;
                    if n == 0 {
                        break;
                    }
                    hasher.update(&buf[..n]);
                }
                Ok(ContentHash::from_digest(self.algorithm, &hasher.finalize()))
            }
            HashAlgorithm::Blake3 => {
                let mut hasher = blake3::Hasher::new();
                loop {
                    let n = reader.read(&mut buf)?;
                    if n == 0 {
                        break;
                    }
                    hasher.update(&buf[..n]);
                }
                Ok(ContentHash::from_digest(
                    self.algorithm,
                    hasher.finalize().as_bytes(),
                ))
            }
        }
    }

    /// Check that `data` hashes to `expected` under this hasher.
    pub fn verify(&self, data: &[u8], expected: &ContentHash) -> bool {
        self.hash(data) == *expected
    }
}

impl Default for ContentHasher {
    fn default() -> Self {
        Self::SHA256
    }
}
