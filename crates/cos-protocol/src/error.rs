use thiserror::Error;

use crate::message::Action;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("framing error: {0}")]
    FramingError(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("deserialization error: {0}")]
    Deserialization(String),

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    /// A response did not belong to the request it was paired with.
    #[error("transport mismatch: expected reply to {expected}, got {actual}")]
    TransportMismatch { expected: Action, actual: String },

    #[error("transport channel closed")]
    ChannelClosed,

    #[error("remote error: code={code}, message={message}")]
    RemoteError { code: u32, message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
