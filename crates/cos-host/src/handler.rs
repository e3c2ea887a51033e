use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

use cos_protocol::{handle_frame, HealthResponse};

use crate::host::StorageHost;

/// Health check handler.
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

/// Info handler.
pub async fn info_handler(State(host): State<Arc<StorageHost>>) -> Json<serde_json::Value> {
    let config = host.config();
    Json(json!({
        "name": "cos-host",
        "version": env!("CARGO_PKG_VERSION"),
        "protocol_version": cos_protocol::PROTOCOL_VERSION,
        "max_blob_size": config.max_blob_size,
        "verify_writes": config.verify_writes,
    }))
}

/// Accepts one framed request envelope and returns the framed reply.
pub async fn envelope_handler(State(host): State<Arc<StorageHost>>, body: Bytes) -> Response {
    match handle_frame(host.as_ref(), &body).await {
        Ok(reply) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "application/octet-stream")],
            reply,
        )
            .into_response(),
        Err(e) => {
            tracing::debug!(error = %e, "rejecting undecodable envelope");
            (StatusCode::BAD_REQUEST, e.to_string()).into_response()
        }
    }
}
