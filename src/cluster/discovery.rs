use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dashmap::DashMap;

use super::client::PeerClient;
use super::protocol::HeartbeatRequest;
use crate::cache::entry::now_millis;
use crate::config::NodeConfig;
use crate::ring::{HashRing, Node};
use crate::tasks::FixedRateTask;

pub const HEARTBEAT_INTERVAL: Duration = Duration::from_millis(5000);
pub const PEER_TIMEOUT_MILLIS: u64 = 15_000;

/// Heartbeat-based failure detector and ring mutator.
///
/// Keeps a last-seen timestamp per peer address, seeded from configuration.
/// Two fixed-rate tasks run at the heartbeat interval: one announces this
/// node to every known peer, one evicts peers that have been silent past
/// the liveness timeout. An inbound heartbeat is the sole join path for
/// new and recovered peers.
pub struct DiscoveryService {
    local: Node,
    ring: Arc<HashRing>,
    client: Arc<PeerClient>,
    pub(crate) peer_last_seen: DashMap<String, u64>,
    last_heartbeat_received: AtomicU64,
    tasks: Mutex<Vec<FixedRateTask>>,
}

impl DiscoveryService {
    pub fn new(config: &NodeConfig, ring: Arc<HashRing>, client: Arc<PeerClient>) -> Arc<Self> {
        let peer_last_seen = DashMap::new();
        let now = now_millis();
        for peer in &config.peers {
            peer_last_seen.insert(peer.clone(), now);
        }

        Arc::new(Self {
            local: config.local_node(),
            ring,
            client,
            peer_last_seen,
            last_heartbeat_received: AtomicU64::new(0),
            tasks: Mutex::new(Vec::new()),
        })
    }

    /// Adds the local node to the ring, then starts the heartbeat sender
    /// and the timeout sweeper. The ordering matters: the node must be
    /// routable before any peer learns about it.
    pub fn start(self: &Arc<Self>) {
        self.ring.add_node(&self.local);
        tracing::info!("Added current node {} to the ring", self.local);

        let sender = Arc::downgrade(self);
        let sender_task = FixedRateTask::spawn(Duration::ZERO, HEARTBEAT_INTERVAL, move || {
            if let Some(service) = sender.upgrade() {
                service.send_heartbeats();
            }
        });

        let sweeper = Arc::downgrade(self);
        let sweeper_task = FixedRateTask::spawn(Duration::ZERO, HEARTBEAT_INTERVAL, move || {
            if let Some(service) = sweeper.upgrade() {
                service.check_peer_timeouts();
            }
        });

        let mut tasks = self.lock_tasks();
        tasks.push(sender_task);
        tasks.push(sweeper_task);
        tracing::info!("Discovery service started heartbeat sender and timeout sweeper");
    }

    /// One heartbeat round: announce this node to every known peer.
    /// Send failures are absorbed inside the peer client.
    pub(crate) fn send_heartbeats(&self) {
        let heartbeat = HeartbeatRequest {
            node_id: self.local.id().to_string(),
            node_host: self.local.host().to_string(),
            node_port: self.local.port(),
            timestamp: now_millis(),
        };

        let self_address = self.local.address();
        for entry in self.peer_last_seen.iter() {
            let address = entry.key().clone();
            if address == self_address {
                continue;
            }
            match Node::from_address(&address) {
                Ok(peer) => {
                    let client = self.client.clone();
                    let heartbeat = heartbeat.clone();
                    tokio::spawn(async move {
                        client.send_heartbeat(&peer, &heartbeat).await;
                    });
                }
                Err(e) => {
                    tracing::warn!("Skipping peer with bad address: {}", e);
                }
            }
        }
    }

    /// One sweep round: evict every peer whose last heartbeat is older
    /// than the liveness timeout, from both the table and the ring.
    pub(crate) fn check_peer_timeouts(&self) {
        let now = now_millis();
        let self_address = self.local.address();

        let timed_out: Vec<String> = self
            .peer_last_seen
            .iter()
            .filter(|entry| {
                *entry.key() != self_address
                    && now.saturating_sub(*entry.value()) > PEER_TIMEOUT_MILLIS
            })
            .map(|entry| entry.key().clone())
            .collect();

        for address in timed_out {
            tracing::warn!("Peer {} timed out; removing from ring", address);
            self.peer_last_seen.remove(&address);

            // Prefer the node the ring actually holds: a peer that joined
            // via heartbeat may carry an id other than host:port, and
            // removal matches the whole value.
            let node = self
                .ring
                .physical_nodes()
                .into_iter()
                .find(|n| n.address() == address)
                .map(Ok)
                .unwrap_or_else(|| Node::from_address(&address));

            match node {
                Ok(node) => self.ring.remove_node(&node),
                Err(e) => tracing::error!("Cannot evict peer {}: {}", address, e),
            }
        }
    }

    /// Inbound heartbeat: refresh the sender's last-seen stamp and re-add
    /// it to the ring if it is new or was evicted. This is the only way a
    /// peer (re)enters the topology.
    pub fn on_heartbeat_received(&self, heartbeat: &HeartbeatRequest) {
        let sender = Node::new(
            heartbeat.node_id.clone(),
            heartbeat.node_host.clone(),
            heartbeat.node_port,
        );
        let now = now_millis();
        self.peer_last_seen.insert(sender.address(), now);
        self.last_heartbeat_received.store(now, Ordering::Relaxed);

        if !self.ring.physical_nodes().contains(&sender) {
            tracing::info!("New or recovered node detected: {}. Adding to ring.", sender);
            self.ring.add_node(&sender);
        }
    }

    /// Addresses of peers currently tracked as live, excluding this node.
    pub fn active_peer_addresses(&self) -> Vec<String> {
        let self_address = self.local.address();
        let mut peers: Vec<String> = self
            .peer_last_seen
            .iter()
            .map(|entry| entry.key().clone())
            .filter(|address| *address != self_address)
            .collect();
        peers.sort();
        peers
    }

    /// Timestamp of the most recent inbound heartbeat, 0 before the first.
    pub fn last_heartbeat_received_millis(&self) -> u64 {
        self.last_heartbeat_received.load(Ordering::Relaxed)
    }

    pub fn local_node(&self) -> &Node {
        &self.local
    }

    /// Cancels the sender and sweeper tasks.
    pub fn shutdown(&self) {
        let mut tasks = self.lock_tasks();
        for task in tasks.drain(..) {
            task.cancel();
        }
        tracing::info!("Discovery service shut down");
    }

    fn lock_tasks(&self) -> std::sync::MutexGuard<'_, Vec<FixedRateTask>> {
        self.tasks.lock().unwrap_or_else(|e| e.into_inner())
    }
}
