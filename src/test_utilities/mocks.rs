use crate::client::api::SwarmBackend;
use crate::networking::api_message::{ConnectResponse, GoOnlineResponse, StatusResponse};
use crate::peer::{Accelerator, DeviceType, Hardware, LayerRange, Peer, PeerStatus};
use crate::SwarmError;
use futures::future::{BoxFuture, FutureExt};
use std::sync::Mutex;

pub fn make_mock_peer(
    id: &str,
    status: PeerStatus,
    layers: Option<LayerRange>,
    throughput: f64,
) -> Peer {
    Peer {
        id: String::from(id),
        name: format!("Peer {}", id),
        ip: String::from("10.0.0.1"),
        status,
        hardware: Hardware {
            device_type: DeviceType::Laptop,
            cpu: String::from("Intel Core Ultra 7"),
            ram: 16.0,
            vram: 4.0,
            accelerator: Accelerator::OpenVINO,
        },
        layers,
        latency: 5.0,
        throughput,
        last_seen: None,
    }
}

/// A `SwarmBackend` with canned answers that records which calls were made.
pub struct MockBackend {
    go_online_error: Option<String>,
    connect_response: ConnectResponse,
    status_error: Option<String>,
    peers: Vec<Peer>,
    calls: Mutex<Vec<&'static str>>,
}

impl MockBackend {
    /// Every call succeeds; joins report `peers` and status returns them.
    pub fn healthy(peers: Vec<Peer>) -> Self {
        MockBackend {
            go_online_error: None,
            connect_response: ConnectResponse {
                success: true,
                peers: Some(peers.clone()),
                ..Default::default()
            },
            status_error: None,
            peers,
            calls: Mutex::new(vec![]),
        }
    }

    pub fn failing_go_online(mut self, message: &str) -> Self {
        self.go_online_error = Some(String::from(message));
        self
    }

    pub fn with_connect_response(mut self, response: ConnectResponse) -> Self {
        self.connect_response = response;
        self
    }

    pub fn failing_status(mut self, message: &str) -> Self {
        self.status_error = Some(String::from(message));
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: &'static str) {
        self.calls.lock().unwrap().push(call);
    }
}

impl SwarmBackend for MockBackend {
    fn go_online(&self) -> BoxFuture<'_, crate::Result<GoOnlineResponse>> {
        self.record("go_online");
        let result = match &self.go_online_error {
            Some(message) => Err(SwarmError::Rejected(message.clone())),
            None => Ok(GoOnlineResponse {
                success: Some(true),
                node_id: Some(String::from("mock0001")),
                status: Some(String::from("online")),
            }),
        };
        futures::future::ready(result).boxed()
    }

    fn connect_to_swarm<'a>(&'a self, _ip: &'a str) -> BoxFuture<'a, crate::Result<ConnectResponse>> {
        self.record("connect_to_swarm");
        futures::future::ready(Ok(self.connect_response.clone())).boxed()
    }

    fn get_status(&self) -> BoxFuture<'_, crate::Result<StatusResponse>> {
        self.record("get_status");
        let result = match &self.status_error {
            Some(message) => Err(SwarmError::Transport(message.clone())),
            None => Ok(StatusResponse {
                node_id: String::from("mock0001"),
                online: true,
                connected_server: None,
                peers: self.peers.clone(),
            }),
        };
        futures::future::ready(result).boxed()
    }
}
