pub mod mocks;

use crate::generator::{TokenGenerator, TokenStream};
use crate::networking::filters::routes;
use crate::node::NodeContext;
use crate::peer::{LayerRange, PeerStatus};
use crate::settings::Settings;
use crate::SwarmError;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Replays fixed fragments instead of running a worker process.
pub struct ScriptedGenerator {
    fragments: Vec<String>,
    failure: Option<String>,
}

impl ScriptedGenerator {
    pub fn new(fragments: &[&str]) -> Self {
        ScriptedGenerator {
            fragments: fragments.iter().map(|fragment| String::from(*fragment)).collect(),
            failure: None,
        }
    }

    /// Yields `fragments`, then fails with `message`.
    pub fn failing(fragments: &[&str], message: &str) -> Self {
        ScriptedGenerator {
            failure: Some(String::from(message)),
            ..ScriptedGenerator::new(fragments)
        }
    }
}

impl TokenGenerator for ScriptedGenerator {
    fn generate(&self, _prompt: String) -> TokenStream {
        let mut items: Vec<crate::Result<String>> =
            self.fragments.iter().cloned().map(Ok).collect();
        if let Some(message) = &self.failure {
            items.push(Err(SwarmError::Protocol(message.clone())));
        }
        Box::pin(futures::stream::iter(items))
    }
}

/// A node context seeded with two offline peers: "local" at 127.0.0.1 with a layer range
/// and "remote" without one. Joins probe `probe_port`.
pub fn make_test_context(generator: Arc<dyn TokenGenerator>, probe_port: u16) -> NodeContext {
    let mut settings = Settings::default();
    let mut local = mocks::make_mock_peer("local", PeerStatus::Offline, Some(LayerRange::new(1, 32)), 6.5);
    local.ip = String::from("127.0.0.1");
    let remote = mocks::make_mock_peer("remote", PeerStatus::Offline, None, 0.0);
    settings.swarm.peers = vec![local, remote];
    settings.swarm.probe_port = probe_port;
    settings.swarm.probe_timeout_ms = 500;
    NodeContext::new(&settings, generator)
}

/// Serves the node routes on an ephemeral local port.
pub async fn spawn_test_node(
    generator: Arc<dyn TokenGenerator>,
    probe_port: u16,
) -> (SocketAddr, NodeContext) {
    let context = make_test_context(generator, probe_port);
    let (address, server) = warp::serve(routes(context.clone())).bind_ephemeral(([127, 0, 0, 1], 0));
    tokio::spawn(server);
    (address, context)
}

/// A local port with nothing listening on it.
pub async fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}
