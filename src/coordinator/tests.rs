#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;

    use crate::cache::LocalStore;
    use crate::cluster::PeerClient;
    use crate::coordinator::Coordinator;
    use crate::error::CacheError;
    use crate::ring::{HashRing, Node};

    fn local_node() -> Node {
        Node::new("127.0.0.1:8080", "127.0.0.1", 8080)
    }

    fn test_client() -> Arc<PeerClient> {
        Arc::new(PeerClient::new(Duration::from_millis(200), Duration::from_millis(200)).unwrap())
    }

    /// A cluster of one: the local node owns every key.
    fn single_node() -> (Arc<Coordinator>, Arc<LocalStore>, Arc<HashRing>) {
        let store = LocalStore::new(100);
        let ring = Arc::new(HashRing::new(2));
        ring.add_node(&local_node());
        let coordinator = Coordinator::new(local_node(), store.clone(), ring.clone(), test_client());
        (coordinator, store, ring)
    }

    /// A ring that contains only an unreachable remote node, so every
    /// operation must forward.
    fn remote_only() -> (Arc<Coordinator>, Arc<LocalStore>) {
        let store = LocalStore::new(100);
        let ring = Arc::new(HashRing::new(2));
        // Nothing listens on this port; forwards fail fast.
        ring.add_node(&Node::new("127.0.0.1:1", "127.0.0.1", 1));
        let coordinator = Coordinator::new(local_node(), store.clone(), ring, test_client());
        (coordinator, store)
    }

    fn empty_ring() -> Arc<Coordinator> {
        let store = LocalStore::new(100);
        let ring = Arc::new(HashRing::new(2));
        Coordinator::new(local_node(), store, ring, test_client())
    }

    // ============================================================
    // LOCAL (PRIMARY) ROUTING
    // ============================================================

    #[tokio::test]
    async fn put_then_get_on_the_owning_node() {
        let (coordinator, store, _) = single_node();

        coordinator.put("alpha", json!("A"), 0).await.unwrap();

        assert_eq!(coordinator.get("alpha").await.unwrap(), Some(json!("A")));
        assert_eq!(store.put_count(), 1);
        assert_eq!(store.hit_count(), 1);
    }

    #[tokio::test]
    async fn delete_removes_the_local_copy() {
        let (coordinator, store, _) = single_node();

        coordinator.put("alpha", json!("A"), 0).await.unwrap();
        coordinator.delete("alpha").await.unwrap();

        assert_eq!(coordinator.get("alpha").await.unwrap(), None);
        assert_eq!(store.delete_count(), 1);
    }

    #[tokio::test]
    async fn get_all_returns_the_local_view() {
        let (coordinator, _, _) = single_node();

        coordinator.put("a", json!(1), 0).await.unwrap();
        coordinator.put("b", json!([1, 2]), 0).await.unwrap();

        let all = coordinator.get_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all.get("a"), Some(&json!(1)));
        assert_eq!(all.get("b"), Some(&json!([1, 2])));
    }

    #[tokio::test]
    async fn hits_and_misses_add_up_to_total_gets() {
        let (coordinator, store, _) = single_node();

        coordinator.put("present", json!(1), 0).await.unwrap();
        coordinator.get("present").await.unwrap();
        coordinator.get("absent").await.unwrap();
        coordinator.get("present").await.unwrap();

        assert_eq!(store.hit_count() + store.miss_count(), 3);
    }

    // ============================================================
    // EMPTY RING EDGE CASES
    // ============================================================

    #[tokio::test]
    async fn put_on_an_empty_ring_fails() {
        let coordinator = empty_ring();
        let result = coordinator.put("alpha", json!("A"), 0).await;
        assert!(matches!(result, Err(CacheError::RingEmpty)));
    }

    #[tokio::test]
    async fn get_on_an_empty_ring_surfaces_the_error() {
        let coordinator = empty_ring();
        assert!(matches!(
            coordinator.get("alpha").await,
            Err(CacheError::RingEmpty)
        ));
    }

    #[tokio::test]
    async fn delete_on_an_empty_ring_is_a_successful_no_op() {
        let coordinator = empty_ring();
        assert!(coordinator.delete("alpha").await.is_ok());
    }

    #[tokio::test]
    async fn internal_delete_on_an_empty_ring_is_a_no_op() {
        let coordinator = empty_ring();
        assert!(coordinator.on_internal_delete("alpha").await.is_ok());
    }

    // ============================================================
    // FORWARDING FAILURES SURFACE
    // ============================================================

    #[tokio::test]
    async fn forwarded_get_to_a_dead_primary_fails() {
        let (coordinator, _) = remote_only();
        let result = coordinator.get("alpha").await;
        assert!(matches!(result, Err(CacheError::PeerUnreachable { .. })));
    }

    #[tokio::test]
    async fn forwarded_put_to_a_dead_primary_fails() {
        let (coordinator, store) = remote_only();
        let result = coordinator.put("alpha", json!("A"), 0).await;
        assert!(result.is_err());
        // The write never landed locally on the forwarding node.
        assert_eq!(store.size(), 0);
    }

    #[tokio::test]
    async fn forwarded_delete_to_a_dead_primary_fails() {
        let (coordinator, _) = remote_only();
        assert!(coordinator.delete("alpha").await.is_err());
    }

    // ============================================================
    // INTERNAL (PEER-FACING) PATHS
    // ============================================================

    #[tokio::test]
    async fn internal_put_on_the_primary_stores_locally() {
        let (coordinator, store, _) = single_node();

        coordinator
            .on_internal_put("alpha", json!("A"), 0)
            .await
            .unwrap();

        assert_eq!(store.get("alpha"), Some(json!("A")));
    }

    #[tokio::test]
    async fn internal_put_on_a_replica_stays_local() {
        // The only ring member is remote, so this node is not the primary:
        // the write must be treated as replica state, not forwarded onward.
        let (coordinator, store) = remote_only();

        coordinator
            .on_internal_put("alpha", json!("A"), 0)
            .await
            .unwrap();

        assert_eq!(store.get("alpha"), Some(json!("A")));
    }

    #[tokio::test]
    async fn internal_delete_on_a_replica_stays_local() {
        let (coordinator, store) = remote_only();
        store.put("alpha", json!("A"), 0);

        coordinator.on_internal_delete("alpha").await.unwrap();

        assert_eq!(store.get("alpha"), None);
    }

    #[tokio::test]
    async fn internal_get_reads_only_the_local_store() {
        let (coordinator, store) = remote_only();
        store.put("alpha", json!("A"), 0);

        // Even though a remote node owns the key, internal reads never route.
        assert_eq!(coordinator.internal_get("alpha"), Some(json!("A")));
        assert_eq!(coordinator.internal_get("missing"), None);
    }

    #[tokio::test]
    async fn ttl_is_honored_through_the_coordinator() {
        let (coordinator, store, _) = single_node();

        coordinator.put("tmp", json!(1), 20).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(coordinator.get("tmp").await.unwrap(), None);
        assert_eq!(store.miss_count(), 1);
    }
}
