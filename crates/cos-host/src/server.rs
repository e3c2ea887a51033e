use std::sync::Arc;

use tokio::net::TcpListener;

use crate::error::{HostError, HostResult};
use crate::host::StorageHost;
use crate::router::build_router;

/// Serves a [`StorageHost`] over HTTP.
pub struct HostServer {
    host: Arc<StorageHost>,
}

impl HostServer {
    pub fn new(host: Arc<StorageHost>) -> Self {
        Self { host }
    }

    pub fn host(&self) -> &Arc<StorageHost> {
        &self.host
    }

    /// Build the router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(self.host.clone())
    }

    /// Bind `bind_addr` from the host config and serve until the listener fails.
    pub async fn serve(self) -> HostResult<()> {
        let addr = self.host.config().bind_addr;
        let listener = TcpListener::bind(addr).await?;
        tracing::info!(%addr, "storage host listening");
        axum::serve(listener, self.router())
            .await
            .map_err(|e| HostError::Internal(e.to_string()))
    }
}
