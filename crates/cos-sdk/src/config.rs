use std::time::Duration;

use cos_gate::GateConfig;
use cos_types::HashAlgorithm;
use serde::{Deserialize, Serialize};

/// Requester-side settings for a [`CrossOriginStorage`](crate::CrossOriginStorage).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Digest used by [`CrossOriginStorage::hash`](crate::CrossOriginStorage::hash).
    pub default_algorithm: HashAlgorithm,
    /// Abandon a round trip after this many milliseconds. Unset waits until
    /// the host replies.
    pub request_timeout_ms: Option<u64>,
    pub gate: GateConfig,
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }
}
