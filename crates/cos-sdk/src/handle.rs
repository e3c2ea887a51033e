use std::sync::Arc;

use cos_gate::PermissionGate;
use cos_protocol::CosMessage;
use cos_types::{ContentHash, Origin};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::channel::{unexpected, Channel};
use crate::error::{SdkError, SdkResult};
use crate::storage::authorize_read;

/// Options for [`CrossOriginStorage::request_file_handles`](crate::CrossOriginStorage::request_file_handles).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// Reserve missing records for writing instead of requiring them to
    /// exist. Create requests skip the permission prompt.
    pub create: bool,
}

impl RequestOptions {
    pub fn read() -> Self {
        Self { create: false }
    }

    pub fn create() -> Self {
        Self { create: true }
    }

    pub fn intent(&self) -> HandleIntent {
        if self.create {
            HandleIntent::Create
        } else {
            HandleIntent::Read
        }
    }
}

/// What a handle was granted for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HandleIntent {
    /// Granted by the permission gate; reads go straight through.
    Read,
    /// Granted without asking; reads must still pass the gate.
    Create,
}

/// Who holds a handle, and the gate its create-intent reads answer to.
#[derive(Clone)]
pub(crate) struct Requester {
    pub(crate) origin: Origin,
    pub(crate) gate: Arc<PermissionGate>,
}

/// A capability to read or overwrite one shared record.
///
/// Handles carry only the hash; the bytes stay with the storage host until
/// [`read`](Self::read) is called.
#[derive(Clone)]
pub struct FileHandle {
    hash: ContentHash,
    channel: Channel,
    intent: HandleIntent,
    requester: Requester,
}

impl FileHandle {
    pub(crate) fn new(
        hash: ContentHash,
        channel: Channel,
        intent: HandleIntent,
        requester: Requester,
    ) -> Self {
        Self {
            hash,
            channel,
            intent,
            requester,
        }
    }

    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    pub fn intent(&self) -> HandleIntent {
        self.intent
    }

    /// Fetch the record's current bytes.
    ///
    /// A create-intent handle was never checked for reading, so the
    /// permission gate runs first and may prompt or refuse.
    pub async fn read(&self) -> SdkResult<Vec<u8>> {
        if self.intent == HandleIntent::Create {
            authorize_read(
                &self.requester.gate,
                &self.requester.origin,
                std::slice::from_ref(&self.hash),
            )
            .await?;
        }
        let reply = self
            .channel
            .call(CosMessage::GetFileData {
                hash: self.hash.clone(),
            })
            .await
            .map_err(|e| match e {
                SdkError::Remote { code: 404, .. } => SdkError::NotFound {
                    hashes: vec![self.hash.clone()],
                },
                other => other,
            })?;
        match reply {
            CosMessage::FileData { bytes } => {
                debug!(hash = %self.hash, size = bytes.len(), "record read");
                Ok(bytes)
            }
            other => Err(unexpected("FileData", &other)),
        }
    }

    pub fn open_write_stream(&self) -> WritableFileStream {
        WritableFileStream {
            hash: self.hash.clone(),
            channel: self.channel.clone(),
            closed: false,
        }
    }
}

impl std::fmt::Debug for FileHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileHandle")
            .field("hash", &self.hash)
            .field("intent", &self.intent)
            .finish()
    }
}

/// Host acknowledgement of a stored write.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteAck {
    pub hash: ContentHash,
    pub size: u64,
}

/// Writes whole records to one hash.
///
/// Each `write` replaces the record; the last completed write wins.
#[derive(Debug)]
pub struct WritableFileStream {
    hash: ContentHash,
    channel: Channel,
    closed: bool,
}

impl WritableFileStream {
    pub fn hash(&self) -> &ContentHash {
        &self.hash
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    pub async fn write(&mut self, bytes: impl Into<Vec<u8>>) -> SdkResult<WriteAck> {
        if self.closed {
            return Err(SdkError::StreamClosed);
        }
        let reply = self
            .channel
            .call(CosMessage::StoreFileData {
                hash: self.hash.clone(),
                bytes: bytes.into(),
            })
            .await?;
        match reply {
            CosMessage::StoreAck { hash, size } if hash == self.hash => Ok(WriteAck { hash, size }),
            CosMessage::StoreAck { hash, .. } => Err(SdkError::TransportMismatch(format!(
                "write to {} acknowledged as {hash}",
                self.hash
            ))),
            other => Err(unexpected("StoreAck", &other)),
        }
    }

    /// Finish the stream. Later writes fail with [`SdkError::StreamClosed`].
    pub async fn close(&mut self) -> SdkResult<()> {
        self.closed = true;
        Ok(())
    }
}
