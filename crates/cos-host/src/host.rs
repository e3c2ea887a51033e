use std::sync::Arc;

use async_trait::async_trait;
use cos_crypto::ContentHasher;
use cos_gate::InMemoryPermissionStore;
use cos_protocol::{CosMessage, EnvelopeHandler};
use cos_store::{BlobStore, InMemoryBlobStore};
use cos_types::{ContentHash, Origin, PermissionDecision};
use tracing::{debug, info, warn};

use crate::config::HostConfig;
use crate::error::{HostError, HostResult};

/// Outcome of a handle request: which of the requested hashes resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FileHandlesResponse {
    pub success: Vec<ContentHash>,
    /// The requested hashes, echoed in request order.
    pub hashes: Vec<ContentHash>,
}

/// The isolated party that owns shared storage.
///
/// Holds the blob store and the session permission table. Requesters never
/// touch either directly; everything arrives as a protocol message.
pub struct StorageHost {
    store: Arc<dyn BlobStore>,
    permissions: InMemoryPermissionStore,
    config: HostConfig,
}

impl StorageHost {
    pub fn new(store: Arc<dyn BlobStore>, config: HostConfig) -> Self {
        Self {
            store,
            permissions: InMemoryPermissionStore::new(),
            config,
        }
    }

    /// A host over a fresh in-memory store with default limits.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryBlobStore::new()), HostConfig::default())
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn BlobStore> {
        &self.store
    }

    pub fn permissions(&self) -> &InMemoryPermissionStore {
        &self.permissions
    }

    /// Resolve a batch of hashes.
    ///
    /// Without `create`, only hashes that already have a record succeed. With
    /// `create`, an empty placeholder is reserved for every missing hash and
    /// every hash succeeds; existing records are left untouched.
    pub fn resolve_handles(
        &self,
        hashes: &[ContentHash],
        create: bool,
    ) -> HostResult<FileHandlesResponse> {
        for hash in hashes {
            hash.validate()
                .map_err(|e| HostError::InvalidRequest(format!("{hash}: {e}")))?;
        }

        let success = if create {
            let created = self.store.reserve_batch(hashes)?;
            let reserved = created.iter().filter(|c| **c).count();
            if reserved > 0 {
                info!(reserved, requested = hashes.len(), "placeholders reserved");
            }
            hashes.to_vec()
        } else {
            let present = self.store.exists_batch(hashes)?;
            hashes
                .iter()
                .zip(present)
                .filter_map(|(hash, found)| found.then(|| hash.clone()))
                .collect()
        };

        debug!(
            requested = hashes.len(),
            resolved = success.len(),
            create,
            "handles resolved"
        );
        Ok(FileHandlesResponse {
            success,
            hashes: hashes.to_vec(),
        })
    }

    pub fn read(&self, hash: &ContentHash) -> HostResult<Vec<u8>> {
        self.store
            .read(hash)?
            .ok_or_else(|| HostError::NotFound(hash.clone()))
    }

    /// Replace the record at `hash` with `bytes`. Returns the stored size.
    pub fn write(&self, hash: &ContentHash, bytes: &[u8]) -> HostResult<u64> {
        hash.validate()
            .map_err(|e| HostError::InvalidRequest(format!("{hash}: {e}")))?;

        let size = bytes.len() as u64;
        if size > self.config.max_blob_size {
            return Err(HostError::TooLarge {
                size,
                max: self.config.max_blob_size,
            });
        }

        if self.config.verify_writes {
            if let Some(algorithm) = hash.known_algorithm() {
                let actual = ContentHasher::for_algorithm(algorithm).hash(bytes);
                if actual != *hash {
                    warn!(expected = %hash, actual = %actual, "rejecting write with mismatched digest");
                    return Err(HostError::HashMismatch {
                        expected: hash.clone(),
                        actual,
                    });
                }
            }
        }

        self.store.write(hash, bytes)?;
        info!(hash = %hash, size, "record stored");
        Ok(size)
    }

    pub fn get_permission(&self, host: &str) -> HostResult<Option<PermissionDecision>> {
        let origin = parse_origin(host)?;
        Ok(self.permissions.lookup(&origin)?)
    }

    /// Record a decision and return the one now in effect, which differs
    /// from `decision` when the origin is already blocked.
    pub fn store_permission(
        &self,
        host: &str,
        decision: PermissionDecision,
    ) -> HostResult<PermissionDecision> {
        let origin = parse_origin(host)?;
        Ok(self.permissions.record(&origin, decision)?)
    }

    /// Answer one request message.
    pub fn dispatch(&self, message: CosMessage) -> HostResult<CosMessage> {
        match message {
            CosMessage::RequestFileHandles { hashes, create } => {
                let FileHandlesResponse { success, hashes } =
                    self.resolve_handles(&hashes, create)?;
                Ok(CosMessage::FileHandles { success, hashes })
            }
            CosMessage::GetFileData { hash } => Ok(CosMessage::FileData {
                bytes: self.read(&hash)?,
            }),
            CosMessage::StoreFileData { hash, bytes } => {
                let size = self.write(&hash, &bytes)?;
                Ok(CosMessage::StoreAck { hash, size })
            }
            CosMessage::GetPermission { host } => {
                let permission = self.get_permission(&host)?;
                Ok(CosMessage::Permission { host, permission })
            }
            CosMessage::StorePermission { host, permission } => {
                let effective = self.store_permission(&host, permission)?;
                Ok(CosMessage::Permission {
                    host,
                    permission: Some(effective),
                })
            }
            other => Err(HostError::InvalidRequest(format!(
                "{} is not a request",
                other.type_name()
            ))),
        }
    }
}

fn parse_origin(host: &str) -> HostResult<Origin> {
    Origin::new(host).map_err(|e| HostError::InvalidRequest(e.to_string()))
}

/// Permission messages may only name the origin that sent them.
fn check_permission_subject(origin: &str, message: &CosMessage) -> HostResult<()> {
    let host = match message {
        CosMessage::GetPermission { host } | CosMessage::StorePermission { host, .. } => host,
        _ => return Ok(()),
    };
    let sender = Origin::new(origin)
        .map_err(|_| HostError::Forbidden("permission request from an unnamed origin".into()))?;
    if parse_origin(host)? != sender {
        return Err(HostError::Forbidden(format!(
            "{sender} may not access the permission of {host}"
        )));
    }
    Ok(())
}

#[async_trait]
impl EnvelopeHandler for StorageHost {
    async fn handle(&self, origin: &str, message: CosMessage) -> CosMessage {
        let action = message.action();
        debug!(origin, %action, "request received");
        match check_permission_subject(origin, &message).and_then(|()| self.dispatch(message)) {
            Ok(response) => response,
            Err(e) => {
                let code = e.code();
                if code >= 500 {
                    warn!(origin, %action, code, error = %e, "request failed");
                } else {
                    debug!(origin, %action, code, error = %e, "request refused");
                }
                CosMessage::Error {
                    action,
                    code,
                    message: e.to_string(),
                }
            }
        }
    }
}

impl std::fmt::Debug for StorageHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageHost")
            .field("config", &self.config)
            .field("permissions", &self.permissions.len())
            .finish()
    }
}
