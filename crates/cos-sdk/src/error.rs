use std::time::Duration;

use cos_gate::DenialReason;
use cos_protocol::ProtocolError;
use cos_types::{ContentHash, Origin};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SdkError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{origin} may not read {} ({reason})", list(.hashes))]
    PermissionDenied {
        origin: Origin,
        hashes: Vec<ContentHash>,
        reason: DenialReason,
    },

    #[error("not found: {}", list(.hashes))]
    NotFound { hashes: Vec<ContentHash> },

    #[error("transport mismatch: {0}")]
    TransportMismatch(String),

    #[error("no reply within {0:?}")]
    Timeout(Duration),

    #[error("write stream is closed")]
    StreamClosed,

    #[error("storage host error {code}: {message}")]
    Remote { code: u32, message: String },

    #[error("protocol error: {0}")]
    Protocol(ProtocolError),

    #[error("permission gate error: {0}")]
    Gate(#[from] cos_gate::GateError),

    #[error("cache index error: {0}")]
    Index(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ProtocolError> for SdkError {
    fn from(e: ProtocolError) -> Self {
        match e {
            ProtocolError::TransportMismatch { .. } => Self::TransportMismatch(e.to_string()),
            ProtocolError::RemoteError { code, message } => Self::Remote { code, message },
            other => Self::Protocol(other),
        }
    }
}

fn list(hashes: &[ContentHash]) -> String {
    hashes
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub type SdkResult<T> = Result<T, SdkError>;
