//! Internal `/internal/cache` endpoints, spoken only by peer nodes.
//!
//! Writes landing here re-derive the caller's intent from the ring: if this
//! node is the key's primary the write replicates onward, otherwise it is a
//! replica write and stays local. Reads never route further.

use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::cluster::protocol::{CachePutRequest, HeartbeatRequest};
use crate::cluster::DiscoveryService;
use crate::coordinator::Coordinator;

/// `GET /internal/cache/{key}`: local store only.
pub async fn handle_get(
    Extension(coordinator): Extension<Arc<Coordinator>>,
    Path(key): Path<String>,
) -> Response {
    match coordinator.internal_get(&key) {
        Some(value) => (StatusCode::OK, Json(value)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

/// `POST /internal/cache/{key}`: primary or replica write, decided here.
pub async fn handle_put(
    Extension(coordinator): Extension<Arc<Coordinator>>,
    Path(key): Path<String>,
    Json(request): Json<CachePutRequest>,
) -> Response {
    match coordinator
        .on_internal_put(&key, request.value, request.ttl_millis)
        .await
    {
        Ok(()) => (StatusCode::OK, format!("Key '{}' stored internally.", key)).into_response(),
        Err(e) => {
            tracing::error!("Internal PUT for key '{}' failed: {}", key, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Internal PUT failed: {}", e),
            )
                .into_response()
        }
    }
}

/// `DELETE /internal/cache/{key}`: primary or replica delete.
pub async fn handle_delete(
    Extension(coordinator): Extension<Arc<Coordinator>>,
    Path(key): Path<String>,
) -> Response {
    match coordinator.on_internal_delete(&key).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!("Internal DELETE for key '{}' failed: {}", key, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Internal DELETE failed: {}", e),
            )
                .into_response()
        }
    }
}

/// `POST /internal/cache/heartbeat`: liveness signal from a peer.
pub async fn handle_heartbeat(
    Extension(discovery): Extension<Arc<DiscoveryService>>,
    Json(heartbeat): Json<HeartbeatRequest>,
) -> StatusCode {
    discovery.on_heartbeat_received(&heartbeat);
    StatusCode::OK
}
