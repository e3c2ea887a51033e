//! Filesystem-backed blob store.
//!
//! Layout: `<root>/<algorithm>/<value>`, one file per record. Path
//! components are derived from the hash so that no caller-supplied string
//! can escape the root.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use cos_types::ContentHash;
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::BlobStore;

/// One file per record under a root directory.
///
/// Writes go to a temporary file in the same directory and are renamed into
/// place, so readers observe either the old bytes or the new bytes.
#[derive(Debug)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Open (or create) a store rooted at `root`.
    pub fn open(root: impl Into<PathBuf>) -> StoreResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, hash: &ContentHash) -> StoreResult<PathBuf> {
        if !hash.is_well_formed() {
            return Err(StoreError::MalformedHash(hash.clone()));
        }
        Ok(self
            .root
            .join(path_component(&hash.algorithm().to_ascii_lowercase()))
            .join(path_component(hash.value())))
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> StoreResult<()> {
        let dir = path
            .parent()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "record path has no parent"))?;
        fs::create_dir_all(dir)?;
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
        Ok(())
    }
}

/// Longest component written as-is or hex-escaped. Longer parts are
/// replaced by their SHA-256 so file names stay under the usual 255-byte
/// limit.
const MAX_COMPONENT: usize = 128;

/// Plain lowercase hex digests are used as-is; anything else is hex-encoded
/// behind a `~` prefix so it cannot contain separators or `..`. Parts whose
/// escaped form would be too long become `=` plus their SHA-256.
fn path_component(part: &str) -> String {
    let plain = part
        .bytes()
        .all(|b| b.is_ascii_digit() || (b'a'..=b'z').contains(&b) || b == b'-');
    if !part.is_empty() && plain && part.len() <= MAX_COMPONENT {
        part.to_string()
    } else if !part.is_empty() && part.len() * 2 < MAX_COMPONENT {
        format!("~{}", hex::encode(part.as_bytes()))
    } else {
        format!("={}", hex::encode(Sha256::digest(part.as_bytes())))
    }
}

impl BlobStore for FsBlobStore {
    fn read(&self, hash: &ContentHash) -> StoreResult<Option<Vec<u8>>> {
        let path = self.path_for(hash)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, hash: &ContentHash, bytes: &[u8]) -> StoreResult<()> {
        let path = self.path_for(hash)?;
        self.write_atomic(&path, bytes)?;
        debug!(hash = %hash, size = bytes.len(), "record written");
        Ok(())
    }

    fn reserve(&self, hash: &ContentHash) -> StoreResult<bool> {
        let path = self.path_for(hash)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        match fs::OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, hash: &ContentHash) -> StoreResult<bool> {
        match fs::metadata(self.path_for(hash)?) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn delete(&self, hash: &ContentHash) -> StoreResult<bool> {
        let path = self.path_for(hash)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cos_crypto::ContentHasher;

    fn temp_store() -> (tempfile::TempDir, FsBlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FsBlobStore::open(dir.path().join("blobs")).unwrap();
        (dir, store)
    }

    #[test]
    fn write_then_read_round_trips() {
        let (_dir, store) = temp_store();
        let hash = ContentHasher::SHA256.hash(b"on disk");
        store.write(&hash, b"on disk").unwrap();
        assert_eq!(store.read(&hash).unwrap().unwrap(), b"on disk");
        assert!(store.root().join("sha-256").join(hash.value()).is_file());
    }

    #[test]
    fn rewrite_replaces_file() {
        let (_dir, store) = temp_store();
        let hash = ContentHash::new("SHA-256", "deadbeef");
        store.write(&hash, &[1, 2, 3]).unwrap();
        store.write(&hash, &[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(store.read(&hash).unwrap().unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn reserve_is_create_new() {
        let (_dir, store) = temp_store();
        let hash = ContentHash::new("SHA-256", "abc123");
        assert!(store.reserve(&hash).unwrap());
        assert!(!store.reserve(&hash).unwrap());
        assert_eq!(store.read(&hash).unwrap().unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn reserve_keeps_existing_bytes() {
        let (_dir, store) = temp_store();
        let hash = ContentHash::new("SHA-256", "abc123");
        store.write(&hash, b"payload").unwrap();
        assert!(!store.reserve(&hash).unwrap());
        assert_eq!(store.read(&hash).unwrap().unwrap(), b"payload");
    }

    #[test]
    fn hostile_values_stay_under_root() {
        let (dir, store) = temp_store();
        let hash = ContentHash::new("SHA-256", "../../escape");
        store.write(&hash, b"x").unwrap();
        assert!(!dir.path().join("escape").exists());
        assert_eq!(store.read(&hash).unwrap().unwrap(), b"x");
    }

    #[test]
    fn missing_record() {
        let (_dir, store) = temp_store();
        let hash = ContentHash::new("BLAKE3", "00");
        assert!(store.read(&hash).unwrap().is_none());
        assert!(!store.exists(&hash).unwrap());
        assert!(!store.delete(&hash).unwrap());
    }

    #[test]
    fn path_component_rules() {
        assert_eq!(path_component("deadbeef"), "deadbeef");
        assert_eq!(path_component("sha-256"), "sha-256");
        assert_eq!(path_component("SHA-256"), format!("~{}", hex::encode("SHA-256")));
        assert!(path_component("a/b").starts_with('~'));
    }

    #[test]
    fn long_values_get_bounded_names() {
        let long_plain = "a".repeat(400);
        let long_escaped = "A".repeat(200);
        for part in [long_plain.as_str(), long_escaped.as_str()] {
            let name = path_component(part);
            assert!(name.starts_with('='));
            assert_eq!(name.len(), 65);
        }
        assert_ne!(path_component(&long_plain), path_component(&"a".repeat(401)));
    }

    #[test]
    fn long_hash_values_round_trip() {
        let (_dir, store) = temp_store();
        let hash = ContentHash::new("SHA-256", "Z".repeat(300));
        store.write(&hash, b"long").unwrap();
        assert!(store.exists(&hash).unwrap());
        assert_eq!(store.read(&hash).unwrap().unwrap(), b"long");
    }

    #[cfg(unix)]
    #[test]
    fn exists_propagates_io_errors() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, store) = temp_store();
        let hash = ContentHash::new("SHA-256", "deadbeef");
        store.write(&hash, b"x").unwrap();
        let alg_dir = store.root().join("sha-256");
        fs::set_permissions(&alg_dir, fs::Permissions::from_mode(0o000)).unwrap();
        let direct = fs::metadata(alg_dir.join("deadbeef"));
        let result = store.exists(&hash);
        fs::set_permissions(&alg_dir, fs::Permissions::from_mode(0o755)).unwrap();

        // Privileged users bypass directory permissions; nothing to observe then.
        if direct.is_err() {
            assert!(matches!(result, Err(StoreError::Io(_))));
        }
    }
}
