use std::sync::Arc;

use async_trait::async_trait;
use cos_gate::{GateError, GateResult, PermissionStore};
use cos_protocol::{CosMessage, Transport};
use cos_types::{Origin, PermissionDecision};

use crate::channel::{unexpected, Channel};
use crate::error::SdkError;

/// Reads and writes the host's permission table over the transport.
///
/// The table itself lives with the storage host, so decisions survive for
/// exactly as long as the host session.
pub struct RemotePermissionStore {
    channel: Channel,
}

impl RemotePermissionStore {
    /// A store that talks to the host behind `transport`, with no deadline.
    pub fn over(transport: Arc<dyn Transport>) -> Self {
        Self::new(Channel::new(transport, None))
    }

    pub(crate) fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

fn store_error(e: SdkError) -> GateError {
    GateError::Store(e.to_string())
}

#[async_trait]
impl PermissionStore for RemotePermissionStore {
    async fn get(&self, origin: &Origin) -> GateResult<Option<PermissionDecision>> {
        let reply = self
            .channel
            .call(CosMessage::GetPermission {
                host: origin.as_str().to_string(),
            })
            .await
            .map_err(store_error)?;
        match reply {
            CosMessage::Permission { permission, .. } => Ok(permission),
            other => Err(store_error(unexpected("Permission", &other))),
        }
    }

    async fn put(
        &self,
        origin: &Origin,
        decision: PermissionDecision,
    ) -> GateResult<PermissionDecision> {
        let reply = self
            .channel
            .call(CosMessage::StorePermission {
                host: origin.as_str().to_string(),
                permission: decision,
            })
            .await
            .map_err(store_error)?;
        match reply {
            CosMessage::Permission { permission, .. } => Ok(permission.unwrap_or(decision)),
            other => Err(store_error(unexpected("Permission", &other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use cos_host::StorageHost;
    use cos_protocol::{in_process_pair, serve};

    fn remote(host: Arc<StorageHost>) -> RemotePermissionStore {
        let (transport, endpoint) = in_process_pair("example.com", 8);
        tokio::spawn(serve(endpoint, host));
        RemotePermissionStore::over(Arc::new(transport))
    }

    #[tokio::test]
    async fn decisions_land_in_the_host_table() {
        let host = Arc::new(StorageHost::in_memory());
        let store = remote(host.clone());
        let origin = Origin::new("example.com").unwrap();

        assert_eq!(store.get(&origin).await.unwrap(), None);
        assert_eq!(
            store.put(&origin, PermissionDecision::AllowSession).await.unwrap(),
            PermissionDecision::AllowSession
        );
        assert_eq!(
            host.get_permission("example.com").unwrap(),
            Some(PermissionDecision::AllowSession)
        );
        assert_eq!(
            store.get(&origin).await.unwrap(),
            Some(PermissionDecision::AllowSession)
        );
    }

    #[tokio::test]
    async fn blocked_origin_stays_blocked() {
        let host = Arc::new(StorageHost::in_memory());
        let store = remote(host);
        let origin = Origin::new("example.com").unwrap();

        store.put(&origin, PermissionDecision::NeverAllow).await.unwrap();
        let effective = store
            .put(&origin, PermissionDecision::AllowSession)
            .await
            .unwrap();
        assert_eq!(effective, PermissionDecision::NeverAllow);
    }
}
