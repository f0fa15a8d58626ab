#[cfg(test)]
mod tests {
    use crate::cache::entry::now_millis;
    use crate::cache::{Entry, LocalStore};
    use serde_json::json;
    use std::time::Duration;

    #[test]
    fn entry_with_zero_ttl_never_expires() {
        let entry = Entry::new(json!("v"), 0);
        let far_future = entry.creation_time_millis() + 1_000_000_000;
        assert!(!entry.is_expired(far_future));
    }

    #[test]
    fn entry_expires_after_its_ttl() {
        let entry = Entry::new(json!("v"), 500);
        let created = entry.creation_time_millis();
        assert!(!entry.is_expired(created + 500));
        assert!(entry.is_expired(created + 501));
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let store = LocalStore::new(10);
        store.put("alpha", json!({"n": 1}), 0);

        assert_eq!(store.get("alpha"), Some(json!({"n": 1})));
        assert_eq!(store.hit_count(), 1);
        assert_eq!(store.put_count(), 1);
    }

    #[tokio::test]
    async fn get_of_missing_key_is_a_miss() {
        let store = LocalStore::new(10);
        assert_eq!(store.get("ghost"), None);
        assert_eq!(store.miss_count(), 1);
        assert_eq!(store.hit_count(), 0);
    }

    #[tokio::test]
    async fn reput_replaces_the_value() {
        let store = LocalStore::new(10);
        store.put("k", json!("old"), 0);
        store.put("k", json!("new"), 0);

        assert_eq!(store.get("k"), Some(json!("new")));
        assert_eq!(store.size(), 1);
        assert_eq!(store.put_count(), 2);
    }

    #[tokio::test]
    async fn expired_entry_is_removed_on_read() {
        let store = LocalStore::new(10);
        store.put("tmp", json!(1), 20);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(store.get("tmp"), None);
        assert_eq!(store.miss_count(), 1);
        // The entry was pruned, not just hidden.
        assert_eq!(store.size(), 0);
        assert!(store.snapshot().is_empty());
    }

    #[tokio::test]
    async fn size_excludes_expired_entries() {
        let store = LocalStore::new(10);
        store.put("keep", json!(1), 0);
        store.put("tmp", json!(2), 20);
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(store.size(), 1);
    }

    #[tokio::test]
    async fn delete_increments_counter_even_for_missing_keys() {
        let store = LocalStore::new(10);
        store.put("k", json!(1), 0);

        store.delete("k");
        store.delete("k");

        assert_eq!(store.delete_count(), 2);
        assert_eq!(store.get("k"), None);
    }

    #[tokio::test]
    async fn insertion_beyond_capacity_evicts_least_recently_used() {
        let store = LocalStore::new(3);
        store.put("k1", json!(1), 0);
        store.put("k2", json!(2), 0);
        store.put("k3", json!(3), 0);
        store.put("k4", json!(4), 0);

        assert_eq!(store.size(), 3);
        assert_eq!(store.get("k1"), None, "oldest key should be evicted");
        assert_eq!(store.get("k2"), Some(json!(2)));
        assert_eq!(store.get("k4"), Some(json!(4)));
        // Eviction is not a delete.
        assert_eq!(store.delete_count(), 0);
    }

    #[tokio::test]
    async fn get_promotes_a_key_out_of_eviction_order() {
        let store = LocalStore::new(3);
        store.put("k1", json!(1), 0);
        store.put("k2", json!(2), 0);
        store.put("k3", json!(3), 0);

        // k1 becomes most recently used, leaving k2 as the LRU victim.
        assert_eq!(store.get("k1"), Some(json!(1)));
        store.put("k4", json!(4), 0);

        assert_eq!(store.get("k2"), None);
        assert_eq!(store.get("k1"), Some(json!(1)));
    }

    #[tokio::test]
    async fn put_promotes_an_existing_key() {
        let store = LocalStore::new(3);
        store.put("k1", json!(1), 0);
        store.put("k2", json!(2), 0);
        store.put("k3", json!(3), 0);

        store.put("k1", json!(10), 0);
        store.put("k4", json!(4), 0);

        assert_eq!(store.get("k2"), None);
        assert_eq!(store.get("k1"), Some(json!(10)));
    }

    #[tokio::test]
    async fn size_stays_bounded_under_many_inserts() {
        let store = LocalStore::new(5);
        for i in 0..100 {
            store.put(&format!("k{}", i), json!(i), 0);
            assert!(store.size() <= 5);
        }
        assert_eq!(store.size(), 5);
    }

    #[tokio::test]
    async fn snapshot_is_a_point_in_time_copy() {
        let store = LocalStore::new(10);
        store.put("a", json!(1), 0);
        store.put("b", json!("two"), 0);

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("a"), Some(&json!(1)));
        assert_eq!(snapshot.get("b"), Some(&json!("two")));

        // Mutations after the snapshot do not leak into it.
        store.delete("a");
        assert_eq!(snapshot.len(), 2);

        // Snapshots do not touch the read counters.
        assert_eq!(store.hit_count(), 0);
        assert_eq!(store.miss_count(), 0);
    }

    #[tokio::test]
    async fn sweep_removes_all_expired_entries() {
        let store = LocalStore::new(10);
        store.put("keep", json!(1), 0);
        store.put("tmp1", json!(2), 20);
        store.put("tmp2", json!(3), 20);
        tokio::time::sleep(Duration::from_millis(50)).await;

        store.sweep_expired();

        assert_eq!(store.size(), 1);
        assert_eq!(store.snapshot().len(), 1);
    }

    #[tokio::test]
    async fn misconfigured_capacity_falls_back_to_default() {
        let store = LocalStore::new(0);
        assert_eq!(store.max_entries(), 1000);

        let negative = LocalStore::new(-5);
        assert_eq!(negative.max_entries(), 1000);
    }

    #[tokio::test]
    async fn hit_ratio_accounts_for_all_gets() {
        let store = LocalStore::new(10);
        assert_eq!(store.hit_ratio(), 0.0);

        store.put("k", json!(1), 0);
        store.get("k");
        store.get("k");
        store.get("missing");

        assert_eq!(store.hit_count() + store.miss_count(), 3);
        let ratio = store.hit_ratio();
        assert!((ratio - 2.0 / 3.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn shutdown_cancels_the_sweeper() {
        let store = LocalStore::new(10);
        store.put("k", json!(1), 0);
        store.shutdown();
        // Store remains usable after the sweeper is gone.
        assert_eq!(store.get("k"), Some(json!(1)));
    }

    #[test]
    fn now_millis_is_monotonic_enough() {
        let a = now_millis();
        let b = now_millis();
        assert!(b >= a);
    }
}
