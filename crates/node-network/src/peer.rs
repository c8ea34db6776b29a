use crate::message::{NodeId, PeerAddr};
use node_core::{BlockHeight, Timestamp};
use node_crypto::Hash256;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// A peer's handshake/liveness state (spec.md §3's peer registry entry and
/// §4.4's liveness state machine).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LivenessState {
    Connecting,
    Ready,
    Stale,
    Dropped,
}

/// One tracked peer (spec.md §3: "{address, port, node_id, version,
/// last_seen, liveness-state}").
#[derive(Debug, Clone)]
pub struct PeerDescriptor {
    pub addr: PeerAddr,
    pub node_id: NodeId,
    pub version: u32,
    pub last_seen: Timestamp,
    pub state: LivenessState,
    pub head_index: BlockHeight,
    pub head_hash: Hash256,
    missed_pongs: u32,
}

impl PeerDescriptor {
    pub fn new(addr: PeerAddr, node_id: NodeId, version: u32) -> Self {
        Self {
            addr,
            node_id,
            version,
            last_seen: Timestamp::now(),
            state: LivenessState::Connecting,
            head_index: 0,
            head_hash: Hash256::zero(),
            missed_pongs: 0,
        }
    }
}

/// Shared, concurrently-readable table of known peers, keyed by node_id
/// (grounded on the teacher's `PeerDiscovery`'s `Arc<RwLock<HashMap<...>>>`
/// shape, generalized from socket-address keys to node_id so a peer that
/// reconnects from a new port is recognized as the same peer).
#[derive(Clone, Default)]
pub struct PeerRegistry {
    peers: Arc<RwLock<HashMap<NodeId, PeerDescriptor>>>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn upsert(&self, peer: PeerDescriptor) {
        self.peers.write().await.insert(peer.node_id.clone(), peer);
    }

    pub async fn remove(&self, node_id: &str) -> Option<PeerDescriptor> {
        self.peers.write().await.remove(node_id)
    }

    pub async fn mark_ready(&self, node_id: &str, head_index: BlockHeight, head_hash: Hash256) {
        if let Some(peer) = self.peers.write().await.get_mut(node_id) {
            peer.state = LivenessState::Ready;
            peer.last_seen = Timestamp::now();
            peer.head_index = head_index;
            peer.head_hash = head_hash;
        }
    }

    /// Records a PONG (or any liveness signal) from `node_id`, resetting its
    /// missed-pong counter and reviving it from `Stale` to `Ready`.
    pub async fn mark_seen(&self, node_id: &str) {
        if let Some(peer) = self.peers.write().await.get_mut(node_id) {
            peer.last_seen = Timestamp::now();
            peer.missed_pongs = 0;
            if peer.state == LivenessState::Stale {
                peer.state = LivenessState::Ready;
            }
        }
    }

    pub async fn get(&self, node_id: &str) -> Option<PeerDescriptor> {
        self.peers.read().await.get(node_id).cloned()
    }

    pub async fn snapshot(&self) -> Vec<PeerDescriptor> {
        self.peers.read().await.values().cloned().collect()
    }

    pub async fn addrs(&self) -> Vec<PeerAddr> {
        self.peers.read().await.values().map(|p| p.addr.clone()).collect()
    }

    /// Picks up to `fanout` ready peers at random to gossip a message to
    /// (grounded on the teacher's `Network::gossip_message`'s
    /// `choose_multiple` fanout). `exclude` is the node_id the message was
    /// received from, which must not echo it back.
    pub async fn gossip_targets(&self, fanout: usize, exclude: Option<&str>) -> Vec<PeerDescriptor> {
        use rand::seq::IteratorRandom;
        let peers = self.peers.read().await;
        let candidates = peers
            .values()
            .filter(|p| p.state == LivenessState::Ready)
            .filter(|p| exclude != Some(p.node_id.as_str()));
        candidates
            .choose_multiple(&mut rand::thread_rng(), fanout)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Ages every `Ready` peer one PING interval without a fresh PONG:
    /// after one miss it becomes `Stale` (spec.md §4.4: "no PONG within 2T
    /// marks the peer stale"); after three consecutive misses while stale
    /// it is dropped from the registry ("3 consecutive stale intervals
    /// drop the peer"). Returns the node_ids dropped this tick.
    pub async fn tick_liveness(&self) -> Vec<NodeId> {
        let mut peers = self.peers.write().await;
        let mut dropped = Vec::new();
        for peer in peers.values_mut() {
            match peer.state {
                LivenessState::Ready => {
                    peer.missed_pongs += 1;
                    if peer.missed_pongs >= 2 {
                        peer.state = LivenessState::Stale;
                    }
                }
                LivenessState::Stale => {
                    peer.missed_pongs += 1;
                    if peer.missed_pongs >= 2 + 3 {
                        peer.state = LivenessState::Dropped;
                    }
                }
                LivenessState::Connecting | LivenessState::Dropped => {}
            }
        }
        peers.retain(|node_id, peer| {
            if peer.state == LivenessState::Dropped {
                dropped.push(node_id.clone());
                false
            } else {
                true
            }
        });
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr(port: u16) -> PeerAddr {
        PeerAddr {
            host: "127.0.0.1".to_string(),
            port,
        }
    }

    #[tokio::test]
    async fn ready_peer_goes_stale_after_missed_pongs_then_drops() {
        let registry = PeerRegistry::new();
        let mut peer = PeerDescriptor::new(addr(9000), "node-a".to_string(), 1);
        peer.state = LivenessState::Ready;
        registry.upsert(peer).await;

        registry.tick_liveness().await;
        assert_eq!(
            registry.get("node-a").await.unwrap().state,
            LivenessState::Stale
        );

        for _ in 0..3 {
            registry.tick_liveness().await;
        }
        assert!(registry.get("node-a").await.is_none());
    }

    #[tokio::test]
    async fn a_pong_revives_a_stale_peer() {
        let registry = PeerRegistry::new();
        let mut peer = PeerDescriptor::new(addr(9000), "node-b".to_string(), 1);
        peer.state = LivenessState::Ready;
        registry.upsert(peer).await;
        registry.tick_liveness().await;
        assert_eq!(
            registry.get("node-b").await.unwrap().state,
            LivenessState::Stale
        );

        registry.mark_seen("node-b").await;
        assert_eq!(
            registry.get("node-b").await.unwrap().state,
            LivenessState::Ready
        );
    }

    #[tokio::test]
    async fn gossip_targets_excludes_the_source_and_non_ready_peers() {
        let registry = PeerRegistry::new();
        let mut ready = PeerDescriptor::new(addr(9001), "ready".to_string(), 1);
        ready.state = LivenessState::Ready;
        registry.upsert(ready).await;

        let mut source = PeerDescriptor::new(addr(9002), "source".to_string(), 1);
        source.state = LivenessState::Ready;
        registry.upsert(source).await;

        let connecting = PeerDescriptor::new(addr(9003), "connecting".to_string(), 1);
        registry.upsert(connecting).await;

        let targets = registry.gossip_targets(10, Some("source")).await;
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].node_id, "ready");
    }

    #[tokio::test]
    async fn connecting_peers_are_not_aged() {
        let registry = PeerRegistry::new();
        let peer = PeerDescriptor::new(addr(9000), "node-c".to_string(), 1);
        registry.upsert(peer).await;
        for _ in 0..10 {
            registry.tick_liveness().await;
        }
        assert_eq!(
            registry.get("node-c").await.unwrap().state,
            LivenessState::Connecting
        );
    }
}
