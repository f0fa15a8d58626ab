use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::node::Node;
use crate::error::CacheError;

/// Virtual positions contributed by each physical node.
pub const VIRTUAL_NODES_PER_NODE: u32 = 100;

/// The consistent-hash ring: an ordered map from 32-bit hash positions to
/// the physical node occupying that position.
///
/// Reads happen on every request; mutation only on membership events, so the
/// position map sits behind a reader/writer lock. All lookups for a given
/// ring state are deterministic.
pub struct HashRing {
    positions: RwLock<BTreeMap<u32, Node>>,
    replication_factor: usize,
}

impl HashRing {
    /// `replication_factor` is the total number of copies per key (primary
    /// included) and is fixed for the lifetime of the ring.
    pub fn new(replication_factor: usize) -> Self {
        Self {
            positions: RwLock::new(BTreeMap::new()),
            replication_factor: replication_factor.max(1),
        }
    }

    pub fn replication_factor(&self) -> usize {
        self.replication_factor
    }

    /// MurmurHash3 x86 32-bit, seed 0, over the UTF-8 bytes of `value`.
    /// The same function must hash both keys and virtual positions.
    pub fn hash(value: &str) -> u32 {
        murmur3_32(value.as_bytes(), 0)
    }

    /// Inserts the node's virtual positions. Re-adding a node that is
    /// already present rewrites the same positions, so the call is
    /// idempotent.
    pub fn add_node(&self, node: &Node) {
        let mut positions = self.write_positions();
        for i in 0..VIRTUAL_NODES_PER_NODE {
            let position = Self::hash(&format!("{}-{}", node.address(), i));
            positions.insert(position, node.clone());
        }
        tracing::info!(
            "Added node {} to ring ({} positions total)",
            node,
            positions.len()
        );
    }

    /// Removes every position mapped to a node equal to `node`.
    pub fn remove_node(&self, node: &Node) {
        let mut positions = self.write_positions();
        let before = positions.len();
        positions.retain(|_, occupant| occupant != node);
        let removed = before - positions.len();
        tracing::info!("Removed node {} from ring ({} positions)", node, removed);
    }

    /// The node owning `key`: the occupant of the first position at or after
    /// the key's hash, wrapping to the ring's first position.
    pub fn primary_for(&self, key: &str) -> Result<Node, CacheError> {
        let positions = self.read_positions();
        let hash = Self::hash(key);
        positions
            .range(hash..)
            .next()
            .or_else(|| positions.iter().next())
            .map(|(_, node)| node.clone())
            .ok_or(CacheError::RingEmpty)
    }

    /// The ordered replica set for `key`: primary first, then the next
    /// distinct physical nodes clockwise, up to the replication factor.
    ///
    /// Returns an empty list on an empty ring. When fewer distinct nodes
    /// exist than the replication factor, returns what the ring has and
    /// logs a warning; traversal is bounded so this terminates even then.
    pub fn replica_set(&self, key: &str) -> Vec<Node> {
        let positions = self.read_positions();
        if positions.is_empty() {
            return Vec::new();
        }

        let hash = Self::hash(key);
        let mut replicas: Vec<Node> = Vec::with_capacity(self.replication_factor);
        // Clockwise from the key's hash, then around; capped at two full
        // laps so the walk ends when the factor exceeds the node count.
        for (_, node) in positions
            .range(hash..)
            .chain(positions.iter())
            .take(2 * positions.len())
        {
            if !replicas.contains(node) {
                replicas.push(node.clone());
                if replicas.len() == self.replication_factor {
                    break;
                }
            }
        }

        if replicas.len() < self.replication_factor {
            tracing::warn!(
                "Replica set for key has only {} of {} requested nodes",
                replicas.len(),
                self.replication_factor
            );
        }
        replicas
    }

    /// The distinct physical nodes currently on the ring.
    pub fn physical_nodes(&self) -> Vec<Node> {
        let positions = self.read_positions();
        let mut nodes: Vec<Node> = Vec::new();
        for node in positions.values() {
            if !nodes.contains(node) {
                nodes.push(node.clone());
            }
        }
        nodes
    }

    pub fn is_empty(&self) -> bool {
        self.read_positions().is_empty()
    }

    /// Total virtual positions currently on the ring.
    pub fn position_count(&self) -> usize {
        self.read_positions().len()
    }

    fn read_positions(&self) -> RwLockReadGuard<'_, BTreeMap<u32, Node>> {
        self.positions.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_positions(&self) -> RwLockWriteGuard<'_, BTreeMap<u32, Node>> {
        self.positions.write().unwrap_or_else(|e| e.into_inner())
    }
}

/// MurmurHash3 x86 32-bit.
fn murmur3_32(data: &[u8], seed: u32) -> u32 {
    const C1: u32 = 0xcc9e_2d51;
    const C2: u32 = 0x1b87_3593;

    let mut h = seed;
    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        let mut k = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        k = k.wrapping_mul(C1);
        k = k.rotate_left(15);
        k = k.wrapping_mul(C2);
        h ^= k;
        h = h.rotate_left(13);
        h = h.wrapping_mul(5).wrapping_add(0xe654_6b64);
    }

    let tail = chunks.remainder();
    if !tail.is_empty() {
        let mut k: u32 = 0;
        for (i, &byte) in tail.iter().enumerate() {
            k ^= (byte as u32) << (8 * i);
        }
        k = k.wrapping_mul(C1);
        k = k.rotate_left(15);
        k = k.wrapping_mul(C2);
        h ^= k;
    }

    h ^= data.len() as u32;
    h ^= h >> 16;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    h
}

#[cfg(test)]
mod hash_tests {
    use super::murmur3_32;

    #[test]
    fn matches_reference_vectors() {
        assert_eq!(murmur3_32(b"", 0), 0);
        assert_eq!(murmur3_32(b"hello", 0), 0x248b_fa47);
        assert_eq!(
            murmur3_32(b"The quick brown fox jumps over the lazy dog", 0),
            0x2e4f_f723
        );
    }
}
