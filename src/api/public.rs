//! Public `/cache` endpoints.
//!
//! These translate client HTTP calls into coordinator operations. Routing
//! (serve locally vs. forward to the primary) happens below, in the
//! coordinator; forwarding failures surface here as 500s.

use std::sync::Arc;

use axum::extract::{Extension, Path};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::cluster::protocol::CachePutRequest;
use crate::coordinator::Coordinator;

/// `GET /cache/`: every non-expired entry held by *this* node. This is a
/// per-node view, not a cluster-wide scan.
pub async fn handle_get_all(
    Extension(coordinator): Extension<Arc<Coordinator>>,
) -> impl IntoResponse {
    Json(coordinator.get_all())
}

/// `GET /cache/{key}`: 200 with the value, or 404.
pub async fn handle_get(
    Extension(coordinator): Extension<Arc<Coordinator>>,
    Path(key): Path<String>,
) -> Response {
    match coordinator.get(&key).await {
        Ok(Some(value)) => (StatusCode::OK, Json(value)).into_response(),
        Ok(None) => StatusCode::NOT_FOUND.into_response(),
        Err(e) => {
            tracing::error!("GET for key '{}' failed: {}", key, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to read key '{}': {}", key, e),
            )
                .into_response()
        }
    }
}

/// `POST /cache/{key}`: 201 on success, 500 on routing failure.
pub async fn handle_put(
    Extension(coordinator): Extension<Arc<Coordinator>>,
    Path(key): Path<String>,
    Json(request): Json<CachePutRequest>,
) -> Response {
    match coordinator.put(&key, request.value, request.ttl_millis).await {
        Ok(()) => (
            StatusCode::CREATED,
            format!("Key '{}' stored successfully.", key),
        )
            .into_response(),
        Err(e) => {
            tracing::error!("PUT for key '{}' failed: {}", key, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to store key '{}': {}", key, e),
            )
                .into_response()
        }
    }
}

/// `DELETE /cache/{key}`: 204 on success, 500 on routing failure.
pub async fn handle_delete(
    Extension(coordinator): Extension<Arc<Coordinator>>,
    Path(key): Path<String>,
) -> Response {
    match coordinator.delete(&key).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => {
            tracing::error!("DELETE for key '{}' failed: {}", key, e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to delete key '{}': {}", key, e),
            )
                .into_response()
        }
    }
}
