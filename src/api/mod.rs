//! HTTP API Module
//!
//! Wires the three surfaces onto one router: the public `/cache` endpoints
//! clients talk to, the `/internal/cache` endpoints peers talk to, and the
//! read-only `/admin/stats` view.

use std::sync::Arc;

use axum::extract::Extension;
use axum::routing::get;
use axum::Router;

use crate::cache::LocalStore;
use crate::cluster::DiscoveryService;
use crate::coordinator::Coordinator;

pub mod admin;
pub mod internal;
pub mod public;

pub fn router(
    coordinator: Arc<Coordinator>,
    store: Arc<LocalStore>,
    discovery: Arc<DiscoveryService>,
) -> Router {
    Router::new()
        .route("/cache/", get(public::handle_get_all))
        .route(
            "/cache/:key",
            get(public::handle_get)
                .post(public::handle_put)
                .delete(public::handle_delete),
        )
        .route(
            "/internal/cache/heartbeat",
            axum::routing::post(internal::handle_heartbeat),
        )
        .route(
            "/internal/cache/:key",
            get(internal::handle_get)
                .post(internal::handle_put)
                .delete(internal::handle_delete),
        )
        .route("/admin/stats", get(admin::handle_stats))
        .layer(Extension(coordinator))
        .layer(Extension(store))
        .layer(Extension(discovery))
}
