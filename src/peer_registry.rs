use crate::peer::{Peer, PeerStatus};
use tracing::{info, warn};

/// The node's view of the swarm. Peers are kept in insertion order so `/status` is stable.
#[derive(Debug, Clone, Default)]
pub struct PeerRegistry {
    peers: Vec<Peer>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        PeerRegistry { peers: vec![] }
    }

    /// Seeds the registry, skipping entries that break the layer range invariant.
    pub fn from_peers(peers: Vec<Peer>) -> Self {
        let mut registry = PeerRegistry::new();
        for peer in peers {
            if let Err(err) = registry.upsert(peer) {
                warn!("skipping configured peer: {}", err);
            }
        }
        registry
    }

    pub fn peers(&self) -> Vec<Peer> {
        self.peers.clone()
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Peer> {
        self.peers.iter().find(|peer| peer.id == id)
    }

    /// Inserts a new peer or replaces the one with the same id.
    pub fn upsert(&mut self, peer: Peer) -> crate::Result<()> {
        peer.validate()?;
        match self.peers.iter_mut().find(|existing| existing.id == peer.id) {
            Some(existing) => *existing = peer,
            None => self.peers.push(peer),
        }
        Ok(())
    }

    /// Updates the status of every peer registered at `ip` (port suffix ignored). A peer
    /// without a layer range is never marked online; it stays syncing instead.
    pub fn set_status_by_ip(&mut self, ip: &str, status: PeerStatus) -> usize {
        let host = ip.split(':').next().unwrap_or(ip);
        let mut updated = 0;
        for peer in self.peers.iter_mut().filter(|peer| peer.ip == host) {
            let next = match (status, peer.layers) {
                (PeerStatus::Online, Some(range)) if range.is_valid() => PeerStatus::Online,
                (PeerStatus::Online, _) => PeerStatus::Syncing,
                (other, _) => other,
            };
            if peer.status != next {
                info!("peer {} at {} is now {:?}", peer.id, peer.ip, next);
                peer.status = next;
            }
            updated += 1;
        }
        updated
    }
}
