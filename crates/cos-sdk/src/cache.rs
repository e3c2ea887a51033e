//! Keyed cache on top of hash-addressed storage.
//!
//! Callers that think in URLs or names rather than digests keep a
//! [`KeyIndex`] from normalized key to [`ContentHash`]. Bytes live in shared
//! storage, so a model fetched by one origin can be served to another
//! without downloading it again.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cos_types::ContentHash;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::{SdkError, SdkResult};
use crate::handle::RequestOptions;
use crate::storage::CrossOriginStorage;

/// Key normalization and index persistence settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// JSON file holding the key index. Unset keeps the index in memory.
    pub index_path: Option<PathBuf>,
    /// Leading strings removed from a key, tried in order.
    pub strip_prefixes: Vec<String>,
    /// Substrings removed from a key wherever they first occur.
    pub strip_segments: Vec<String>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            index_path: None,
            strip_prefixes: vec!["https://huggingface.co".into(), "/models".into()],
            strip_segments: vec!["/resolve/main".into()],
        }
    }
}

/// Maps request URLs to stable cache keys.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KeyNormalizer {
    prefixes: Vec<String>,
    segments: Vec<String>,
}

impl KeyNormalizer {
    pub fn new(prefixes: Vec<String>, segments: Vec<String>) -> Self {
        Self { prefixes, segments }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.strip_prefixes.clone(), config.strip_segments.clone())
    }

    pub fn normalize(&self, key: &str) -> String {
        let mut key = key.trim().to_string();
        for prefix in &self.prefixes {
            if let Some(rest) = key.strip_prefix(prefix.as_str()) {
                key = rest.to_string();
            }
        }
        for segment in self.segments.iter().filter(|s| !s.is_empty()) {
            key = key.replacen(segment.as_str(), "", 1);
        }
        key
    }
}

/// Key to hash mapping, optionally persisted as a JSON object.
#[derive(Debug, Default)]
pub struct KeyIndex {
    entries: BTreeMap<String, ContentHash>,
    path: Option<PathBuf>,
}

impl KeyIndex {
    /// An index that is never written to disk.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the index at `path`, starting empty if the file does not exist.
    /// Later [`save`](Self::save) calls write back to the same path.
    pub fn load(path: impl Into<PathBuf>) -> SdkResult<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };
        debug!(path = %path.display(), entries = entries.len(), "cache index loaded");
        Ok(Self {
            entries,
            path: Some(path),
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: &str) -> Option<&ContentHash> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, hash: ContentHash) -> Option<ContentHash> {
        self.entries.insert(key.into(), hash)
    }

    pub fn remove(&mut self, key: &str) -> Option<ContentHash> {
        self.entries.remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ContentHash)> {
        self.entries.iter()
    }

    /// Write the index back to its file. No-op for in-memory indexes.
    pub fn save(&self) -> SdkResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_json::to_vec_pretty(&self.entries)?)?;
        Ok(())
    }
}

/// Get/put cache whose bytes live in cross-origin storage.
pub struct HashCache {
    storage: Arc<CrossOriginStorage>,
    normalizer: KeyNormalizer,
    index: Mutex<KeyIndex>,
}

impl HashCache {
    pub fn new(storage: Arc<CrossOriginStorage>, normalizer: KeyNormalizer, index: KeyIndex) -> Self {
        Self {
            storage,
            normalizer,
            index: Mutex::new(index),
        }
    }

    /// Build a cache from config, loading the index file if one is set.
    pub fn from_config(storage: Arc<CrossOriginStorage>, config: &CacheConfig) -> SdkResult<Self> {
        let index = match &config.index_path {
            Some(path) => KeyIndex::load(path)?,
            None => KeyIndex::new(),
        };
        Ok(Self::new(storage, KeyNormalizer::from_config(config), index))
    }

    pub fn storage(&self) -> &Arc<CrossOriginStorage> {
        &self.storage
    }

    /// The hash recorded for `key`, after normalization.
    pub async fn hash_for(&self, key: &str) -> Option<ContentHash> {
        let key = self.normalizer.normalize(key);
        self.index.lock().await.get(&key).cloned()
    }

    /// Look up `key`. Unknown keys, missing records and refused reads are
    /// misses; transport and host failures are errors.
    pub async fn get(&self, key: &str) -> SdkResult<Option<Vec<u8>>> {
        let Some(hash) = self.hash_for(key).await else {
            debug!(key, "cache miss, key not indexed");
            return Ok(None);
        };

        let handles = match self
            .storage
            .request_file_handles(std::slice::from_ref(&hash), RequestOptions::read())
            .await
        {
            Ok(handles) => handles,
            Err(e @ (SdkError::NotFound { .. } | SdkError::PermissionDenied { .. })) => {
                debug!(key, hash = %hash, reason = %e, "cache miss");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let Some(handle) = handles.into_iter().next() else {
            return Ok(None);
        };
        match handle.read().await {
            Ok(bytes) => {
                debug!(key, hash = %hash, size = bytes.len(), "cache hit");
                Ok(Some(bytes))
            }
            Err(SdkError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Store `bytes` under `key` and return their hash.
    ///
    /// The key is indexed only once the bytes are written, so a failed put
    /// leaves any earlier mapping for `key` in place.
    pub async fn put(&self, key: &str, bytes: &[u8]) -> SdkResult<ContentHash> {
        let normalized = self.normalizer.normalize(key);
        let hash = self.storage.hash(bytes);

        let handles = self
            .storage
            .request_file_handles(std::slice::from_ref(&hash), RequestOptions::create())
            .await?;
        let handle = handles.into_iter().next().ok_or_else(|| SdkError::NotFound {
            hashes: vec![hash.clone()],
        })?;
        let mut stream = handle.open_write_stream();
        stream.write(bytes).await?;
        stream.close().await?;

        {
            let mut index = self.index.lock().await;
            index.insert(normalized.clone(), hash.clone());
            index.save()?;
        }
        info!(key = %normalized, hash = %hash, size = bytes.len(), "cached");
        Ok(hash)
    }
}
