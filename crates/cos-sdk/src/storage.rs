use std::sync::Arc;

use cos_crypto::ContentHasher;
use cos_gate::{PermissionGate, PermissionPrompter, PermissionVerdict};
use cos_host::StorageHost;
use cos_protocol::{in_process_pair, serve, CosMessage, Transport};
use cos_types::{ContentHash, HandleRequest, Origin};
use tracing::{debug, info, warn};

use crate::channel::{unexpected, Channel};
use crate::config::ClientConfig;
use crate::error::{SdkError, SdkResult};
use crate::handle::{FileHandle, RequestOptions, Requester};
use crate::permissions::RemotePermissionStore;

/// Frames buffered in each direction of an in-process connection.
const IN_PROCESS_CAPACITY: usize = 64;

/// Hash-addressed access to storage shared across origins.
///
/// One instance speaks for one requesting origin. Reads are gated by the
/// permission state machine; creates are not. The blob store and the
/// permission table live with the storage host on the far side of the
/// transport.
pub struct CrossOriginStorage {
    origin: Origin,
    channel: Channel,
    gate: Arc<PermissionGate>,
    config: ClientConfig,
}

impl CrossOriginStorage {
    /// Attach to a host reachable through `transport`.
    pub fn new(
        origin: Origin,
        transport: Arc<dyn Transport>,
        prompter: Arc<dyn PermissionPrompter>,
        config: ClientConfig,
    ) -> Self {
        let channel = Channel::new(transport, config.request_timeout());
        let permissions = Arc::new(RemotePermissionStore::new(channel.clone()));
        let gate = Arc::new(PermissionGate::new(permissions, prompter, config.gate.clone()));
        Self {
            origin,
            channel,
            gate,
            config,
        }
    }

    /// Serve `host` on a background task and connect to it over an
    /// in-process channel. Must be called within a tokio runtime.
    pub fn connect_in_process(
        origin: Origin,
        host: Arc<StorageHost>,
        prompter: Arc<dyn PermissionPrompter>,
        config: ClientConfig,
    ) -> Self {
        let (transport, endpoint) = in_process_pair(origin.as_str(), IN_PROCESS_CAPACITY);
        tokio::spawn(serve(endpoint, host));
        debug!(origin = %origin, "connected to in-process storage host");
        Self::new(origin, Arc::new(transport), prompter, config)
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Hasher for the configured default algorithm.
    pub fn hasher(&self) -> ContentHasher {
        ContentHasher::for_algorithm(self.config.default_algorithm)
    }

    /// Hash `bytes` with the configured default algorithm.
    pub fn hash(&self, bytes: &[u8]) -> ContentHash {
        self.hasher().hash(bytes)
    }

    /// Resolve a batch of hashes to handles, in input order.
    ///
    /// Fails as a whole: if any hash is unresolved the error names every
    /// requested hash. With [`RequestOptions::create`] missing records are
    /// reserved and no permission is asked until a handle is read.
    pub async fn request_file_handles(
        &self,
        hashes: &[ContentHash],
        options: RequestOptions,
    ) -> SdkResult<Vec<FileHandle>> {
        let request = HandleRequest::new(hashes.to_vec(), options.create);
        request
            .validate()
            .map_err(|e| SdkError::InvalidArgument(e.to_string()))?;

        if !options.create {
            authorize_read(&self.gate, &self.origin, hashes).await?;
        }

        let reply = self
            .channel
            .call(CosMessage::RequestFileHandles {
                hashes: request.hashes,
                create: request.create,
            })
            .await?;
        let (success, echoed) = match reply {
            CosMessage::FileHandles { success, hashes } => (success, hashes),
            other => return Err(unexpected("FileHandles", &other)),
        };
        if echoed != hashes {
            return Err(SdkError::TransportMismatch(
                "handle response answers a different batch".into(),
            ));
        }
        if !hashes.iter().all(|hash| success.contains(hash)) {
            debug!(
                requested = hashes.len(),
                resolved = success.len(),
                "batch partially resolved"
            );
            return Err(SdkError::NotFound {
                hashes: hashes.to_vec(),
            });
        }

        info!(
            origin = %self.origin,
            count = hashes.len(),
            create = options.create,
            "file handles granted"
        );
        let requester = Requester {
            origin: self.origin.clone(),
            gate: self.gate.clone(),
        };
        Ok(hashes
            .iter()
            .map(|hash| {
                FileHandle::new(
                    hash.clone(),
                    self.channel.clone(),
                    options.intent(),
                    requester.clone(),
                )
            })
            .collect())
    }
}

/// Run the gate for a read of `hashes` by `origin`.
pub(crate) async fn authorize_read(
    gate: &PermissionGate,
    origin: &Origin,
    hashes: &[ContentHash],
) -> SdkResult<()> {
    if let PermissionVerdict::Denied(reason) = gate.check(origin, hashes).await? {
        warn!(origin = %origin, count = hashes.len(), %reason, "read denied");
        return Err(SdkError::PermissionDenied {
            origin: origin.clone(),
            hashes: hashes.to_vec(),
            reason,
        });
    }
    Ok(())
}

impl std::fmt::Debug for CrossOriginStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CrossOriginStorage")
            .field("origin", &self.origin)
            .field("config", &self.config)
            .finish()
    }
}
