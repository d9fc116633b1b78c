use crate::client::api::{SwarmApi, SwarmBackend, CONNECT_FALLBACK_ERROR};
use crate::client::connection::{ConnectionMachine, ConnectionState, ConnectionStatus};
use crate::client::peer_cache::PeerCache;
use crate::client::session::{ChatSession, SessionEvent, SubmitOutcome};
use crate::networking::api_message::Framing;
use crate::settings::ClientSettings;
use crate::time::create_timestamp;
use crate::util::chat_url;
use crate::SwarmError;
use tracing::{debug, info, warn};

/// What a completed bootstrap found.
#[derive(Debug, Clone, PartialEq)]
pub struct BootstrapReport {
    pub node_id: Option<String>,
    pub connected_to: String,
    pub peers: usize,
}

/// Owns everything one client needs: the backend, the connection state machine, the peer
/// cache and the chat session. Every operation takes `&mut self`, so nothing overlaps.
pub struct SwarmClient<B: SwarmBackend> {
    backend: B,
    connection: ConnectionMachine,
    peer_cache: PeerCache,
    session: ChatSession,
    swarm_address: String,
}

impl SwarmClient<SwarmApi> {
    pub fn from_settings(settings: &ClientSettings, swarm_address: &str) -> crate::Result<Self> {
        let envelope = settings.framing == Framing::Envelope;
        let session = ChatSession::new(chat_url(&settings.api_base, envelope)?, settings.framing);
        Ok(SwarmClient::new(
            SwarmApi::new(&settings.api_base),
            session,
            swarm_address,
        ))
    }
}

impl<B: SwarmBackend> SwarmClient<B> {
    pub fn new(backend: B, session: ChatSession, swarm_address: &str) -> Self {
        SwarmClient {
            backend,
            connection: ConnectionMachine::new(),
            peer_cache: PeerCache::new(),
            session,
            swarm_address: String::from(swarm_address),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn state(&self) -> &ConnectionState {
        self.connection.state()
    }

    pub fn status(&self) -> ConnectionStatus {
        self.connection.status()
    }

    pub fn peer_cache(&self) -> &PeerCache {
        &self.peer_cache
    }

    pub fn session(&self) -> &ChatSession {
        &self.session
    }

    pub fn swarm_address(&self) -> &str {
        &self.swarm_address
    }

    /// Connects to the configured swarm address.
    pub async fn bootstrap(&mut self) -> crate::Result<Option<BootstrapReport>> {
        let address = self.swarm_address.clone();
        self.connect(&address).await
    }

    /// Goes online, joins the swarm at `address`, then refreshes peers. Returns `None` when
    /// already connected or an attempt is in flight. A failed status refresh does not fail
    /// the bootstrap.
    pub async fn connect(&mut self, address: &str) -> crate::Result<Option<BootstrapReport>> {
        if !self.connection.begin_connect() {
            debug!("connect ignored while {}", self.connection.state());
            return Ok(None);
        }
        self.swarm_address = String::from(address);

        let online = self.backend.go_online().await;
        let online = match online {
            Ok(online) => online,
            Err(e) => return self.fail_with(e),
        };
        self.connection.online_acknowledged()?;
        info!("node {} is online", online.node_id.as_deref().unwrap_or("?"));

        self.connection.begin_join()?;
        let joined = self.backend.connect_to_swarm(address).await;
        let joined = match joined {
            Ok(joined) if joined.success => joined,
            Ok(joined) => {
                let reason = joined
                    .error
                    .filter(|error| !error.is_empty())
                    .unwrap_or_else(|| String::from(CONNECT_FALLBACK_ERROR));
                return self.fail_with(SwarmError::Rejected(reason));
            }
            Err(e) => return self.fail_with(e),
        };
        self.connection.join_succeeded()?;
        let connected_to = joined.connected_to.unwrap_or_else(|| String::from(address));
        info!("joined swarm at {}", connected_to);

        if let Some(peers) = joined.peers {
            self.peer_cache.merge(peers, create_timestamp());
        }
        if let Err(e) = self.refresh_status().await {
            warn!("peer refresh after join failed: {}", e);
        }

        Ok(Some(BootstrapReport {
            node_id: online.node_id,
            connected_to,
            peers: self.peer_cache.peers().len(),
        }))
    }

    /// Replaces the cached peers with the node's current view.
    pub async fn refresh_status(&mut self) -> crate::Result<usize> {
        let status = self.backend.get_status().await?;
        self.peer_cache.merge(status.peers, create_timestamp());
        Ok(self.peer_cache.peers().len())
    }

    pub async fn disconnect(&mut self) {
        self.session.close().await;
        self.connection.reset(None);
    }

    pub async fn open_session(&mut self) -> crate::Result<()> {
        self.session.open().await
    }

    pub fn clear_transcript(&mut self) {
        self.session.clear();
    }

    pub async fn submit_prompt(&mut self, text: &str) -> crate::Result<SubmitOutcome> {
        let peers_used = self.peer_cache.online_peer_names();
        let submitted = self
            .session
            .submit_prompt(text, self.connection.is_connected(), peers_used)
            .await;
        if let Err(e) = &submitted {
            if e.is_transport() && self.connection.is_connected() {
                self.connection.reset(Some(&e.to_string()));
            }
        }
        submitted
    }

    /// The next chat event, or `None` when no channel is open.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        let event = self.session.next_event().await?;
        self.observe(&event);
        Some(event)
    }

    fn observe(&mut self, event: &SessionEvent) {
        if let SessionEvent::ChannelLost(Some(reason)) = event {
            if self.connection.is_connected() {
                self.connection.reset(Some(reason));
            }
        }
    }

    fn fail_with<T>(&mut self, e: SwarmError) -> crate::Result<T> {
        self.connection.fail(&e.to_string());
        Err(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::networking::api_message::ConnectResponse;
    use crate::peer::{LayerRange, PeerStatus};
    use crate::test_utilities::mocks::{make_mock_peer, MockBackend};
    use crate::test_utilities::{spawn_test_node, ScriptedGenerator};
    use std::sync::Arc;
    use tokio::net::TcpListener;

    fn mock_client(backend: MockBackend) -> SwarmClient<MockBackend> {
        let session = ChatSession::new(chat_url("http://127.0.0.1:1", false).unwrap(), Framing::Legacy);
        SwarmClient::new(backend, session, "192.168.0.111")
    }

    #[tokio::test]
    async fn bootstrap_sequence_test() {
        let peers = vec![make_mock_peer("a", PeerStatus::Online, Some(LayerRange::new(0, 31)), 6.5)];
        let mut client = mock_client(MockBackend::healthy(peers));
        let report = client.bootstrap().await.unwrap().unwrap();
        assert_eq!(report.connected_to, "192.168.0.111");
        assert_eq!(report.peers, 1);
        assert_eq!(
            client.backend().calls(),
            vec!["go_online", "connect_to_swarm", "get_status"]
        );
        assert!(client.status().connected_to_swarm);
        assert!(client.peer_cache().peers()[0].last_seen.is_some());

        // already connected, nothing is called again
        assert_eq!(client.bootstrap().await.unwrap(), None);
        assert_eq!(client.backend().calls().len(), 3);
    }

    #[tokio::test]
    async fn go_online_failure_stops_bootstrap_test() {
        let mut client = mock_client(MockBackend::healthy(vec![]).failing_go_online("go-online failed with status 500"));
        assert!(client.bootstrap().await.is_err());
        assert_eq!(client.backend().calls(), vec!["go_online"]);
        assert!(matches!(client.state(), ConnectionState::Failed(_)));
        let status = client.status();
        assert!(!status.online);
        assert!(!status.connected_to_swarm);
    }

    #[tokio::test]
    async fn join_rejection_is_verbatim_test() {
        let mut client = mock_client(
            MockBackend::healthy(vec![])
                .with_connect_response(ConnectResponse::failure("peer unreachable")),
        );
        let error = client.bootstrap().await.unwrap_err();
        assert_eq!(error.to_string(), "peer unreachable");
        let status = client.status();
        assert_eq!(status.last_error.as_deref(), Some("peer unreachable"));
        assert!(status.online);
        assert!(!status.connected_to_swarm);
        assert_eq!(client.backend().calls(), vec!["go_online", "connect_to_swarm"]);

        let mut client = mock_client(
            MockBackend::healthy(vec![]).with_connect_response(ConnectResponse::default()),
        );
        client.bootstrap().await.unwrap_err();
        assert_eq!(client.status().last_error.as_deref(), Some(CONNECT_FALLBACK_ERROR));
    }

    #[tokio::test]
    async fn status_failure_does_not_fail_bootstrap_test() {
        let mut client = mock_client(MockBackend::healthy(vec![]).failing_status("status failed"));
        let report = client.bootstrap().await.unwrap().unwrap();
        assert_eq!(report.peers, 0);
        assert!(client.status().connected_to_swarm);
        assert!(client.refresh_status().await.is_err());
    }

    #[tokio::test]
    async fn channel_error_resets_connection_test() {
        let mut client = mock_client(MockBackend::healthy(vec![]));
        client.bootstrap().await.unwrap();

        client.observe(&SessionEvent::ChannelLost(None));
        assert!(client.status().connected_to_swarm);

        client.observe(&SessionEvent::ChannelLost(Some(String::from("connection reset"))));
        assert_eq!(client.state(), &ConnectionState::Disconnected);
        assert_eq!(client.status().last_error.as_deref(), Some("connection reset"));

        // a manual reconnect runs the whole sequence again
        assert!(client.bootstrap().await.unwrap().is_some());
        assert!(client.status().connected_to_swarm);
    }

    #[tokio::test]
    async fn failed_send_resets_connection_test() {
        let (address, _context) =
            spawn_test_node(Arc::new(ScriptedGenerator::new(&["unused"])), 1).await;
        let session = ChatSession::new(
            chat_url(&format!("http://{}", address), false).unwrap(),
            Framing::Legacy,
        );
        let mut client = SwarmClient::new(MockBackend::healthy(vec![]), session, "192.168.0.111");
        client.bootstrap().await.unwrap();
        client.open_session().await.unwrap();
        client.session.close_write_half().await;

        let error = client.submit_prompt("hi").await.unwrap_err();
        assert!(error.is_transport());
        assert_eq!(client.state(), &ConnectionState::Disconnected);
        let status = client.status();
        assert!(!status.connected_to_swarm);
        assert_eq!(status.last_error, Some(error.to_string()));
        assert!(!client.session().is_open());
        assert!(client.session().transcript().is_empty());

        // the next prompt is answered locally until the user reconnects
        assert_eq!(client.submit_prompt("hi").await.unwrap(), SubmitOutcome::LocalReply);
    }

    #[tokio::test]
    async fn end_to_end_chat_test() {
        let swarm = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let probe_port = swarm.local_addr().unwrap().port();
        let (address, _context) =
            spawn_test_node(Arc::new(ScriptedGenerator::new(&["Hel", "lo"])), probe_port).await;
        let settings = ClientSettings {
            api_base: format!("http://{}", address),
            framing: Framing::Envelope,
        };
        let mut client = SwarmClient::from_settings(&settings, "127.0.0.1").unwrap();

        assert_eq!(client.submit_prompt("early").await.unwrap(), SubmitOutcome::LocalReply);
        client.clear_transcript();

        let report = client.bootstrap().await.unwrap().unwrap();
        assert_eq!(report.connected_to, "127.0.0.1");
        assert_eq!(report.node_id.map(|id| id.len()), Some(8));
        client.open_session().await.unwrap();

        assert_eq!(client.submit_prompt("hi").await.unwrap(), SubmitOutcome::Sent);
        let mut tokens = vec![];
        while let Some(event) = client.next_event().await {
            match event {
                SessionEvent::Token(text) => tokens.push(text),
                SessionEvent::Completed => break,
                other => panic!("unexpected event {:?}", other),
            }
        }
        assert_eq!(tokens, vec!["Hel", "lo"]);
        let last = client.session().transcript().last().unwrap();
        assert_eq!(last.content(), "Hello");
        assert_eq!(last.peers_used(), Some(&[String::from("Peer local")][..]));

        client.disconnect().await;
        assert!(!client.session().is_open());
        assert_eq!(client.state(), &ConnectionState::Disconnected);
    }
}
