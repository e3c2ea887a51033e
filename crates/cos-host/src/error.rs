use cos_protocol::codes;
use cos_types::ContentHash;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("no record for {0}")]
    NotFound(ContentHash),

    #[error("bytes hash to {actual}, not {expected}")]
    HashMismatch {
        expected: ContentHash,
        actual: ContentHash,
    },

    #[error("record of {size} bytes exceeds limit of {max}")]
    TooLarge { size: u64, max: u64 },

    #[error("store error: {0}")]
    Store(#[from] cos_store::StoreError),

    #[error("permission table error: {0}")]
    Permissions(#[from] cos_gate::GateError),

    #[error("{0}")]
    Forbidden(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl HostError {
    /// Status code reported in a protocol error reply.
    pub fn code(&self) -> u32 {
        match self {
            Self::InvalidRequest(_) => codes::BAD_REQUEST,
            Self::NotFound(_) => codes::NOT_FOUND,
            Self::HashMismatch { .. } => codes::HASH_MISMATCH,
            Self::TooLarge { .. } => codes::TOO_LARGE,
            Self::Store(cos_store::StoreError::MalformedHash(_)) => codes::BAD_REQUEST,
            Self::Forbidden(_) => codes::FORBIDDEN,
            Self::Store(_) | Self::Permissions(_) | Self::Io(_) | Self::Internal(_) => {
                codes::INTERNAL
            }
        }
    }
}

pub type HostResult<T> = Result<T, HostError>;
