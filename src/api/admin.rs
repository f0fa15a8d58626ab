//! Admin `/admin/stats` endpoint: one JSON view of this node's health,
//! cache counters, and cluster membership as it currently sees it.

use std::sync::Arc;

use axum::extract::Extension;
use axum::Json;

use crate::cache::LocalStore;
use crate::cluster::protocol::AdminStatsResponse;
use crate::cluster::DiscoveryService;

pub async fn handle_stats(
    Extension(store): Extension<Arc<LocalStore>>,
    Extension(discovery): Extension<Arc<DiscoveryService>>,
) -> Json<AdminStatsResponse> {
    let node = discovery.local_node();

    Json(AdminStatsResponse {
        node_id: node.id().to_string(),
        node_address: node.address(),
        status: "UP".to_string(),
        local_key_count: store.size(),
        local_memory_usage_bytes: store.memory_usage(),
        total_memory_bytes: store.total_memory(),
        cache_hit_count: store.hit_count(),
        cache_miss_count: store.miss_count(),
        cache_hit_ratio: store.hit_ratio(),
        put_count: store.put_count(),
        delete_count: store.delete_count(),
        last_heartbeat_received_millis: discovery.last_heartbeat_received_millis(),
        active_peer_addresses: discovery.active_peer_addresses(),
    })
}
