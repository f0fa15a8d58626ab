use std::time::Duration;

use serde_json::Value;

use super::protocol::{CachePutRequest, HeartbeatRequest};
use crate::error::CacheError;
use crate::ring::Node;

/// Read timeout for heartbeats, shorter than the configurable data-op
/// timeout.
const HEARTBEAT_TIMEOUT: Duration = Duration::from_millis(3000);

/// Outbound calls to peer nodes' internal API.
///
/// One shared `reqwest::Client` (connection reuse, configured connect
/// timeout) serves every call; read timeouts are applied per request.
/// Nothing here retries; a timeout or error is final.
pub struct PeerClient {
    http: reqwest::Client,
    data_timeout: Duration,
    heartbeat_timeout: Duration,
}

impl PeerClient {
    pub fn new(connect_timeout: Duration, read_timeout: Duration) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(connect_timeout)
            .build()?;
        Ok(Self {
            http,
            data_timeout: read_timeout,
            heartbeat_timeout: HEARTBEAT_TIMEOUT,
        })
    }

    fn cache_url(node: &Node, key: &str) -> String {
        format!("http://{}:{}/internal/cache/{}", node.host(), node.port(), key)
    }

    /// Fetches `key` from the target's local store. 404 means the key is
    /// absent there; any other non-success surfaces as an error.
    pub async fn forward_get(&self, target: &Node, key: &str) -> Result<Option<Value>, CacheError> {
        let url = Self::cache_url(target, key);
        tracing::debug!("Forwarding GET for key '{}' to {}", key, target);

        let response = self
            .http
            .get(&url)
            .timeout(self.data_timeout)
            .send()
            .await
            .map_err(|source| CacheError::PeerUnreachable {
                address: target.address(),
                source,
            })?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }

        let value = response
            .json::<Value>()
            .await
            .map_err(|source| CacheError::PeerUnreachable {
                address: target.address(),
                source,
            })?;
        Ok(Some(value))
    }

    /// Forwards a write to the target's internal API.
    pub async fn forward_put(
        &self,
        target: &Node,
        key: &str,
        value: &Value,
        ttl_millis: u64,
    ) -> Result<(), CacheError> {
        let url = Self::cache_url(target, key);
        tracing::debug!("Forwarding PUT for key '{}' to {}", key, target);

        let body = CachePutRequest {
            value: value.clone(),
            ttl_millis,
        };
        let response = self
            .http
            .post(&url)
            .json(&body)
            .timeout(self.data_timeout)
            .send()
            .await
            .map_err(|source| CacheError::PeerUnreachable {
                address: target.address(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }

    /// Forwards a delete to the target's internal API.
    pub async fn forward_delete(&self, target: &Node, key: &str) -> Result<(), CacheError> {
        let url = Self::cache_url(target, key);
        tracing::debug!("Forwarding DELETE for key '{}' to {}", key, target);

        let response = self
            .http
            .delete(&url)
            .timeout(self.data_timeout)
            .send()
            .await
            .map_err(|source| CacheError::PeerUnreachable {
                address: target.address(),
                source,
            })?;

        if !response.status().is_success() {
            return Err(error_from_response(response).await);
        }
        Ok(())
    }

    /// Sends a heartbeat to the target. Failures are logged and absorbed;
    /// a missed heartbeat is the timeout sweeper's problem, not ours.
    pub async fn send_heartbeat(&self, target: &Node, heartbeat: &HeartbeatRequest) {
        let url = format!(
            "http://{}:{}/internal/cache/heartbeat",
            target.host(),
            target.port()
        );

        let result = self
            .http
            .post(&url)
            .json(heartbeat)
            .timeout(self.heartbeat_timeout)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {}
            Ok(response) => {
                tracing::warn!(
                    "Heartbeat to {} failed with status {}",
                    target,
                    response.status()
                );
            }
            Err(e) => {
                tracing::warn!("Failed to send heartbeat to {}: {}", target, e);
            }
        }
    }
}

async fn error_from_response(response: reqwest::Response) -> CacheError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    CacheError::PeerErrorResponse { status, body }
}
