//! Wire protocol for the public, internal, and admin HTTP APIs.
//!
//! All DTOs serialize with camelCase field names; that is the contract
//! clients and dashboards already speak.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of `POST /cache/{key}` and `POST /internal/cache/{key}`.
///
/// The value is opaque JSON: null, bool, number, string, object, or array
/// all pass through the cache untouched. A `ttlMillis` of 0 (the default)
/// stores the entry without expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CachePutRequest {
    pub value: Value,
    #[serde(default)]
    pub ttl_millis: u64,
}

/// Liveness announcement sent to `POST /internal/cache/heartbeat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRequest {
    pub node_id: String,
    pub node_host: String,
    pub node_port: u16,
    pub timestamp: u64,
}

/// Response of `GET /admin/stats`.
///
/// `totalJVMMemoryBytes` keeps its historical name so existing dashboards
/// keep working; it reports total host memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminStatsResponse {
    pub node_id: String,
    pub node_address: String,
    pub status: String,
    pub local_key_count: usize,
    pub local_memory_usage_bytes: u64,
    #[serde(rename = "totalJVMMemoryBytes")]
    pub total_memory_bytes: u64,
    pub cache_hit_count: u64,
    pub cache_miss_count: u64,
    pub cache_hit_ratio: f64,
    pub put_count: u64,
    pub delete_count: u64,
    pub last_heartbeat_received_millis: u64,
    pub active_peer_addresses: Vec<String>,
}
