use std::sync::Arc;
use std::time::Duration;

use cos_protocol::{CosMessage, Transport};
use tracing::warn;

use crate::error::{SdkError, SdkResult};

/// A transport plus the per-request deadline, shared by the facade, its
/// handles, and the remote permission store.
#[derive(Clone)]
pub(crate) struct Channel {
    transport: Arc<dyn Transport>,
    timeout: Option<Duration>,
}

impl Channel {
    pub(crate) fn new(transport: Arc<dyn Transport>, timeout: Option<Duration>) -> Self {
        Self { transport, timeout }
    }

    /// One round trip. On timeout the request is abandoned, not cancelled:
    /// the host may still act on it.
    pub(crate) async fn call(&self, message: CosMessage) -> SdkResult<CosMessage> {
        let action = message.action();
        let send = self.transport.send(message);
        let reply = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, send).await.map_err(|_| {
                warn!(%action, ?limit, "request abandoned after timeout");
                SdkError::Timeout(limit)
            })?,
            None => send.await,
        };
        Ok(reply?)
    }
}

impl std::fmt::Debug for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Channel")
            .field("origin", &self.transport.origin())
            .field("timeout", &self.timeout)
            .finish()
    }
}

pub(crate) fn unexpected(expected: &str, reply: &CosMessage) -> SdkError {
    SdkError::TransportMismatch(format!("expected {expected}, got {}", reply.type_name()))
}
