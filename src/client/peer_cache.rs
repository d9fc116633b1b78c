use crate::peer::{combined_throughput, online_peers, Peer, SwarmStats};
use tracing::{debug, warn};

/// The client's copy of the swarm membership. Only ever replaced wholesale by a fetch.
#[derive(Debug, Clone, Default)]
pub struct PeerCache {
    peers: Vec<Peer>,
    refreshed_at: Option<u64>,
}

impl PeerCache {
    pub fn new() -> Self {
        PeerCache::default()
    }

    /// Replaces the cached peers with `fetched`, stamping each with `now`. Entries that
    /// break the layer range invariant are dropped.
    pub fn merge(&mut self, fetched: Vec<Peer>, now: u64) {
        self.peers = fetched
            .into_iter()
            .filter_map(|mut peer| match peer.validate() {
                Ok(()) => {
                    peer.last_seen = Some(now);
                    Some(peer)
                }
                Err(err) => {
                    warn!("dropping peer from status: {}", err);
                    None
                }
            })
            .collect();
        self.refreshed_at = Some(now);
        debug!("peer cache holds {} peers", self.peers.len());
    }

    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    pub fn refreshed_at(&self) -> Option<u64> {
        self.refreshed_at
    }

    pub fn online_peers(&self) -> Vec<&Peer> {
        online_peers(&self.peers)
    }

    pub fn online_peer_names(&self) -> Vec<String> {
        self.online_peers()
            .into_iter()
            .map(|peer| peer.name.clone())
            .collect()
    }

    pub fn combined_throughput(&self) -> f64 {
        combined_throughput(&self.peers)
    }

    pub fn stats(&self) -> SwarmStats {
        SwarmStats::from_peers(&self.peers)
    }
}
