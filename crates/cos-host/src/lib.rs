//! Storage host for cross-origin storage.
//!
//! The host is the only party that touches shared storage. It owns a
//! [`BlobStore`](cos_store::BlobStore) and the session permission table,
//! and answers protocol requests arriving over an in-process channel
//! ([`cos_protocol::serve`]) or over HTTP ([`HostServer`]).

pub mod config;
pub mod error;
pub mod handler;
pub mod host;
pub mod router;
pub mod server;

pub use config::HostConfig;
pub use error::{HostError, HostResult};
pub use host::{FileHandlesResponse, StorageHost};
pub use router::build_router;
pub use server::HostServer;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use cos_protocol::{CosCodec, CosMessage, Envelope};
    use cos_types::ContentHash;
    use tower::util::ServiceExt;

    fn app() -> axum::Router {
        build_router(Arc::new(StorageHost::in_memory()))
    }

    async fn post_envelope(app: axum::Router, envelope: &Envelope) -> Envelope {
        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/envelope")
                    .body(Body::from(CosCodec::encode(envelope).unwrap()))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        CosCodec::decode(&body).unwrap().0
    }

    #[tokio::test]
    async fn health_endpoint() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/v1/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
    }

    #[tokio::test]
    async fn info_endpoint() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/v1/info")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let info: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(info["name"], "cos-host");
        assert_eq!(info["protocol_version"], 1);
    }

    #[tokio::test]
    async fn envelope_endpoint_shares_host_state() {
        let app = app();
        let hash = ContentHash::new("SHA-256", "deadbeef");

        let reply = post_envelope(
            app.clone(),
            &Envelope::new(
                1,
                "example.com",
                CosMessage::StoreFileData { hash: hash.clone(), bytes: vec![1, 2, 3] },
            ),
        )
        .await;
        assert_eq!(reply.id, 1);
        assert_eq!(reply.message, CosMessage::StoreAck { hash: hash.clone(), size: 3 });

        let reply = post_envelope(
            app,
            &Envelope::new(2, "example.com", CosMessage::GetFileData { hash }),
        )
        .await;
        assert_eq!(reply.id, 2);
        assert_eq!(reply.message, CosMessage::FileData { bytes: vec![1, 2, 3] });
    }

    #[tokio::test]
    async fn envelope_endpoint_rejects_garbage() {
        let response = app()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/v1/envelope")
                    .body(Body::from(vec![0u8, 0, 0, 1, 42]))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 400);
    }
}
