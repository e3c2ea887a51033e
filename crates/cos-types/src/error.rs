use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("content hash is missing its algorithm")]
    MissingAlgorithm,

    #[error("content hash is missing its value")]
    MissingValue,

    #[error("malformed content hash {0:?}: expected ALGORITHM:value")]
    MalformedHash(String),

    #[error("unknown hash algorithm: {0}")]
    UnknownAlgorithm(String),

    #[error("handle request names no hashes")]
    EmptyRequest,

    #[error("invalid hash at position {index}: {source}")]
    InvalidEntry {
        index: usize,
        #[source]
        source: Box<TypeError>,
    },

    #[error("origin must not be empty")]
    EmptyOrigin,

    #[error("unknown permission decision: {0}")]
    UnknownDecision(String),
}
