use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use cos_protocol::{endpoints, MAX_MESSAGE_SIZE};
use tower_http::trace::TraceLayer;

use crate::handler;
use crate::host::StorageHost;

/// Build the axum router with all host endpoints.
pub fn build_router(host: Arc<StorageHost>) -> Router {
    Router::new()
        .route(endpoints::HEALTH, get(handler::health_handler))
        .route(endpoints::INFO, get(handler::info_handler))
        .route(endpoints::ENVELOPE, post(handler::envelope_handler))
        .layer(DefaultBodyLimit::max(MAX_MESSAGE_SIZE))
        .layer(TraceLayer::new_for_http())
        .with_state(host)
}
