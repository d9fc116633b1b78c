//! A Peer. i.e. another node in the swarm, holding a slice of the model's layers.
use crate::SwarmError;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Copy, PartialEq, Eq, Clone)]
#[serde(rename_all = "lowercase")]
pub enum PeerStatus {
    Online,
    Offline,
    Syncing,
}

#[derive(Serialize, Deserialize, Debug, Copy, PartialEq, Eq, Clone)]
#[serde(rename_all = "lowercase")]
pub enum DeviceType {
    Laptop,
    Server,
    Desktop,
}

#[derive(Serialize, Deserialize, Debug, Copy, PartialEq, Eq, Clone)]
pub enum Accelerator {
    DirectML,
    OpenVINO,
    #[serde(rename = "CUDA")]
    Cuda,
    #[serde(rename = "CPU")]
    Cpu,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Hardware {
    #[serde(rename = "type")]
    pub device_type: DeviceType,
    pub cpu: String,
    /// GB
    pub ram: f64,
    /// GB
    pub vram: f64,
    pub accelerator: Accelerator,
}

/// Inclusive slice of the model's layer stack served by one peer.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct LayerRange {
    pub start: u32,
    pub end: u32,
}

impl LayerRange {
    pub fn new(start: u32, end: u32) -> Self {
        LayerRange { start, end }
    }

    pub fn is_valid(&self) -> bool {
        self.start <= self.end
    }

    pub fn len(&self) -> u32 {
        if self.is_valid() {
            self.end - self.start + 1
        } else {
            0
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Peer {
    pub id: String,
    pub name: String,
    pub ip: String,
    pub status: PeerStatus,
    pub hardware: Hardware,
    #[serde(default)]
    pub layers: Option<LayerRange>,
    /// ms
    #[serde(default)]
    pub latency: f64,
    /// tokens/s
    #[serde(default)]
    pub throughput: f64,
    /// Stamped by the client when the entry is observed, never sent by the node.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<u64>,
}

impl Peer {
    pub fn is_online(&self) -> bool {
        self.status == PeerStatus::Online
    }

    /// An online peer must carry a non-inverted layer range. Syncing and offline
    /// peers may have none.
    pub fn validate(&self) -> crate::Result<()> {
        if !self.is_online() {
            return Ok(());
        }
        match self.layers {
            Some(range) if range.is_valid() => Ok(()),
            Some(range) => Err(SwarmError::InvalidPeer(format!(
                "{} has inverted layer range {}..={}",
                self.id, range.start, range.end
            ))),
            None => Err(SwarmError::InvalidPeer(format!(
                "{} is online without a layer range",
                self.id
            ))),
        }
    }
}

pub fn online_peers(peers: &[Peer]) -> Vec<&Peer> {
    peers.iter().filter(|peer| peer.is_online()).collect()
}

/// Sum of the throughput of online peers.
pub fn combined_throughput(peers: &[Peer]) -> f64 {
    peers
        .iter()
        .filter(|peer| peer.is_online())
        .map(|peer| peer.throughput)
        .sum()
}

/// Aggregate view over a peer list, recomputed on every read.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SwarmStats {
    pub total_peers: usize,
    pub active_peers: usize,
    #[serde(rename = "totalVRAM")]
    pub total_vram: f64,
    #[serde(rename = "totalRAM")]
    pub total_ram: f64,
    pub current_throughput: f64,
    pub average_latency: f64,
}

impl SwarmStats {
    pub fn from_peers(peers: &[Peer]) -> Self {
        let online = online_peers(peers);
        let average_latency = if online.is_empty() {
            0.0
        } else {
            online.iter().map(|peer| peer.latency).sum::<f64>() / online.len() as f64
        };
        SwarmStats {
            total_peers: peers.len(),
            active_peers: online.len(),
            total_vram: peers.iter().map(|peer| peer.hardware.vram).sum(),
            total_ram: peers.iter().map(|peer| peer.hardware.ram).sum(),
            current_throughput: combined_throughput(peers),
            average_latency,
        }
    }
}
