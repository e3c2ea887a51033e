use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::hash::ContentHash;

/// One batched handle request: every hash resolves, or none do.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandleRequest {
    pub hashes: Vec<ContentHash>,
    /// Reserve missing records instead of requiring them to exist.
    pub create: bool,
}

impl HandleRequest {
    pub fn new(hashes: Vec<ContentHash>, create: bool) -> Self {
        Self { hashes, create }
    }

    /// Non-empty, and every hash well formed.
    pub fn validate(&self) -> Result<(), TypeError> {
        if self.hashes.is_empty() {
            return Err(TypeError::EmptyRequest);
        }
        for (index, hash) in self.hashes.iter().enumerate() {
            hash.validate().map_err(|e| TypeError::InvalidEntry {
                index,
                source: Box::new(e),
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_request_is_invalid() {
        assert_eq!(
            HandleRequest::new(vec![], true).validate(),
            Err(TypeError::EmptyRequest)
        );
    }

    #[test]
    fn names_the_bad_entry() {
        let request = HandleRequest::new(
            vec![ContentHash::new("SHA-256", "ab"), ContentHash::new("SHA-256", "")],
            false,
        );
        let err = request.validate().unwrap_err();
        assert_eq!(
            err,
            TypeError::InvalidEntry {
                index: 1,
                source: Box::new(TypeError::MissingValue)
            }
        );
        assert_eq!(
            err.to_string(),
            "invalid hash at position 1: content hash is missing its value"
        );
    }

    #[test]
    fn well_formed_batch_passes() {
        let request = HandleRequest::new(vec![ContentHash::new("sha-256", "AB")], false);
        assert!(request.validate().is_ok());
        assert_eq!(request.hashes[0].value(), "ab");
    }
}
