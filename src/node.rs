use crate::generator::{ProcessGenerator, TokenGenerator};
use crate::networking::filters::routes;
use crate::peer_registry::PeerRegistry;
use crate::settings::{Settings, SwarmSettings};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

/// What this node currently is: its id, whether it went online and which swarm it joined.
#[derive(Debug, Clone)]
pub struct Node {
    node_id: String,
    online: bool,
    connected_server: Option<String>,
}

impl Node {
    pub fn new() -> Self {
        let mut node_id = Uuid::new_v4().to_string();
        node_id.truncate(8);
        Node {
            node_id,
            online: false,
            connected_server: None,
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn connected_server(&self) -> Option<&str> {
        self.connected_server.as_deref()
    }

    pub fn is_connected(&self) -> bool {
        self.connected_server.is_some()
    }

    pub fn go_online(&mut self) {
        if !self.online {
            info!("node {} is online", self.node_id);
        }
        self.online = true;
    }

    /// Joining implies being online.
    pub fn join_swarm(&mut self, address: &str) {
        self.online = true;
        self.connected_server = Some(String::from(address));
        info!("node {} joined swarm at {}", self.node_id, address);
    }
}

impl Default for Node {
    fn default() -> Self {
        Node::new()
    }
}

/// Probe parameters used when joining a swarm.
#[derive(Debug, Clone, Copy)]
pub struct JoinPolicy {
    pub probe_port: u16,
    pub probe_timeout: Duration,
}

impl JoinPolicy {
    pub fn from_settings(settings: &SwarmSettings) -> Self {
        JoinPolicy {
            probe_port: settings.probe_port,
            probe_timeout: Duration::from_millis(settings.probe_timeout_ms),
        }
    }
}

/// Everything the routes share. Cloning is cheap.
#[derive(Clone)]
pub struct NodeContext {
    pub node_lock: Arc<RwLock<Node>>,
    pub registry_lock: Arc<RwLock<PeerRegistry>>,
    pub generator: Arc<dyn TokenGenerator>,
    pub join_policy: JoinPolicy,
}

impl NodeContext {
    pub fn new(settings: &Settings, generator: Arc<dyn TokenGenerator>) -> Self {
        NodeContext {
            node_lock: Arc::new(RwLock::new(Node::new())),
            registry_lock: Arc::new(RwLock::new(PeerRegistry::from_peers(
                settings.swarm.peers.clone(),
            ))),
            generator,
            join_policy: JoinPolicy::from_settings(&settings.swarm),
        }
    }
}

///
/// The entry point to the node runtime. Serves until `shutdown` completes.
///
pub async fn run(
    settings: Settings,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> crate::Result<()> {
    let generator: Arc<dyn TokenGenerator> =
        Arc::new(ProcessGenerator::from_settings(&settings.generator));
    let context = NodeContext::new(&settings, generator);
    let address: SocketAddr = SocketAddr::from((settings.network.host, settings.network.port));

    let (bound, server) = warp::serve(routes(context))
        .try_bind_with_graceful_shutdown(address, shutdown)
        .map_err(|err| crate::SwarmError::Transport(err.to_string()))?;
    info!("node listening on {}", bound);
    server.await;
    info!("node shut down");
    Ok(())
}
