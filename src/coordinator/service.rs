use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;

use crate::cache::LocalStore;
use crate::cluster::PeerClient;
use crate::error::CacheError;
use crate::ring::{HashRing, Node};

/// Routes client operations to the right node(s) per the hash ring.
pub struct Coordinator {
    local: Node,
    store: Arc<LocalStore>,
    ring: Arc<HashRing>,
    client: Arc<PeerClient>,
}

impl Coordinator {
    pub fn new(
        local: Node,
        store: Arc<LocalStore>,
        ring: Arc<HashRing>,
        client: Arc<PeerClient>,
    ) -> Arc<Self> {
        Arc::new(Self {
            local,
            store,
            ring,
            client,
        })
    }

    /// Reads `key`: locally when this node is the primary, otherwise from
    /// the primary over the internal API. There is no replica fall-back;
    /// a failing primary surfaces as an error.
    pub async fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let primary = self.ring.primary_for(key)?;
        if primary == self.local {
            tracing::debug!("Key '{}' belongs to this node; reading locally", key);
            Ok(self.store.get(key))
        } else {
            tracing::debug!("Key '{}' belongs to {}; forwarding GET", key, primary);
            self.client.forward_get(&primary, key).await
        }
    }

    /// Writes `key`: a primary write when this node owns the key,
    /// otherwise a blocking forward to the primary whose result is
    /// surfaced as-is. An empty ring fails the write.
    pub async fn put(&self, key: &str, value: Value, ttl_millis: u64) -> Result<(), CacheError> {
        let replicas = self.ring.replica_set(key);
        let Some(primary) = replicas.first() else {
            return Err(CacheError::RingEmpty);
        };

        if *primary == self.local {
            tracing::debug!("Key '{}' belongs to this node; storing locally", key);
            self.primary_write(key, value, ttl_millis, &replicas);
            Ok(())
        } else {
            tracing::debug!("Key '{}' belongs to {}; forwarding PUT", key, primary);
            self.client
                .forward_put(primary, key, &value, ttl_millis)
                .await
        }
    }

    /// Deletes `key`; same routing as `put`. Deleting on an empty ring is
    /// a successful no-op: there is nothing the key could live on.
    pub async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let replicas = self.ring.replica_set(key);
        let Some(primary) = replicas.first() else {
            tracing::debug!("Delete of '{}' on an empty ring; nothing to do", key);
            return Ok(());
        };

        if *primary == self.local {
            tracing::debug!("Key '{}' belongs to this node; deleting locally", key);
            self.primary_delete(key, &replicas);
            Ok(())
        } else {
            tracing::debug!("Key '{}' belongs to {}; forwarding DELETE", key, primary);
            self.client.forward_delete(primary, key).await
        }
    }

    /// This node's non-expired entries. Local view only: the result is not
    /// a cluster-wide scan.
    pub fn get_all(&self) -> HashMap<String, Value> {
        self.store.snapshot()
    }

    /// Internal read: purely from the local store, no routing.
    pub fn internal_get(&self, key: &str) -> Option<Value> {
        self.store.get(key)
    }

    /// Internal write: re-derive the role from the current ring. Primary
    /// writes replicate onward; replica writes stay local.
    pub async fn on_internal_put(
        &self,
        key: &str,
        value: Value,
        ttl_millis: u64,
    ) -> Result<(), CacheError> {
        let primary = self.ring.primary_for(key)?;
        if primary == self.local {
            tracing::debug!("Internal PUT for '{}': this node is primary", key);
            let replicas = self.ring.replica_set(key);
            self.primary_write(key, value, ttl_millis, &replicas);
        } else {
            tracing::debug!("Internal PUT for '{}': replica write", key);
            self.replica_write(key, value, ttl_millis);
        }
        Ok(())
    }

    /// Internal delete, symmetric to [`Self::on_internal_put`].
    pub async fn on_internal_delete(&self, key: &str) -> Result<(), CacheError> {
        let Ok(primary) = self.ring.primary_for(key) else {
            return Ok(());
        };
        if primary == self.local {
            tracing::debug!("Internal DELETE for '{}': this node is primary", key);
            let replicas = self.ring.replica_set(key);
            self.primary_delete(key, &replicas);
        } else {
            tracing::debug!("Internal DELETE for '{}': replica delete", key);
            self.replica_delete(key);
        }
        Ok(())
    }

    /// Primary write: local store first, then fire-and-forget replication
    /// to the other members of the replica set. The operation succeeds as
    /// soon as the local put lands; nothing awaits the fan-out.
    fn primary_write(&self, key: &str, value: Value, ttl_millis: u64, replicas: &[Node]) {
        self.store.put(key, value.clone(), ttl_millis);

        for peer in self.replication_targets(replicas) {
            let client = self.client.clone();
            let key = key.to_string();
            let value = value.clone();
            tokio::spawn(async move {
                if let Err(e) = client.forward_put(&peer, &key, &value, ttl_millis).await {
                    tracing::warn!("Replication of '{}' to {} failed: {}", key, peer, e);
                }
            });
        }
    }

    fn primary_delete(&self, key: &str, replicas: &[Node]) {
        self.store.delete(key);

        for peer in self.replication_targets(replicas) {
            let client = self.client.clone();
            let key = key.to_string();
            tokio::spawn(async move {
                if let Err(e) = client.forward_delete(&peer, &key).await {
                    tracing::warn!("Replicated delete of '{}' to {} failed: {}", key, peer, e);
                }
            });
        }
    }

    fn replica_write(&self, key: &str, value: Value, ttl_millis: u64) {
        self.store.put(key, value, ttl_millis);
    }

    fn replica_delete(&self, key: &str) {
        self.store.delete(key);
    }

    /// The replica-set members this node must push a write to: everyone
    /// but itself, capped at R-1 targets. Empty when R is 1.
    fn replication_targets(&self, replicas: &[Node]) -> Vec<Node> {
        let factor = self.ring.replication_factor();
        if factor <= 1 {
            return Vec::new();
        }
        replicas
            .iter()
            .filter(|node| **node != self.local)
            .take(factor - 1)
            .cloned()
            .collect()
    }
}
