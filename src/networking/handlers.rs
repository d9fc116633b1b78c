use crate::generator::TokenGenerator;
use crate::networking::api_message::{
    ChatQuery, ConnectRequest, ConnectResponse, GoOnlineResponse, StatusResponse,
};
use crate::networking::probe::is_peer_reachable;
use crate::networking::socket;
use crate::node::{JoinPolicy, Node};
use crate::peer::PeerStatus;
use crate::peer_registry::PeerRegistry;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};
use warp::http::StatusCode;
use warp::{Rejection, Reply};

pub type Result<T> = std::result::Result<T, Rejection>;

pub const PEER_NOT_REACHABLE: &str = "Peer not reachable";

pub async fn go_online_handler(node_lock: Arc<RwLock<Node>>) -> Result<impl Reply> {
    let mut node = node_lock.write().await;
    node.go_online();
    Ok(warp::reply::json(&GoOnlineResponse {
        success: Some(true),
        node_id: Some(String::from(node.node_id())),
        status: Some(String::from("online")),
    }))
}

pub async fn connect_to_swarm_handler(
    request: ConnectRequest,
    node_lock: Arc<RwLock<Node>>,
    registry_lock: Arc<RwLock<PeerRegistry>>,
    join_policy: JoinPolicy,
) -> Result<impl Reply> {
    let address = request.ip.trim();
    if address.is_empty() {
        return Ok(warp::reply::with_status(
            warp::reply::json(&ConnectResponse::failure("No swarm address provided")),
            StatusCode::BAD_REQUEST,
        ));
    }

    if !is_peer_reachable(address, join_policy.probe_port, join_policy.probe_timeout).await {
        warn!("swarm at {} is not reachable", address);
        registry_lock
            .write()
            .await
            .set_status_by_ip(address, PeerStatus::Offline);
        return Ok(warp::reply::with_status(
            warp::reply::json(&ConnectResponse::failure(PEER_NOT_REACHABLE)),
            StatusCode::OK,
        ));
    }

    node_lock.write().await.join_swarm(address);
    let peers = {
        let mut registry = registry_lock.write().await;
        registry.set_status_by_ip(address, PeerStatus::Online);
        registry.peers()
    };
    Ok(warp::reply::with_status(
        warp::reply::json(&ConnectResponse {
            success: true,
            error: None,
            connected_to: Some(String::from(address)),
            peers: Some(peers),
        }),
        StatusCode::OK,
    ))
}

pub async fn status_handler(
    node_lock: Arc<RwLock<Node>>,
    registry_lock: Arc<RwLock<PeerRegistry>>,
) -> Result<impl Reply> {
    let node = node_lock.read().await;
    let peers = registry_lock.read().await.peers();
    Ok(warp::reply::json(&StatusResponse {
        node_id: String::from(node.node_id()),
        online: node.is_online(),
        connected_server: node.connected_server().map(String::from),
        peers,
    }))
}

pub async fn chat_upgrade_handler(
    ws: warp::ws::Ws,
    query: ChatQuery,
    node_lock: Arc<RwLock<Node>>,
    generator: Arc<dyn TokenGenerator>,
) -> Result<impl Reply> {
    let framing = query.framing.unwrap_or_default();
    info!("chat upgrade requested with {:?} framing", framing);
    Ok(ws.on_upgrade(move |socket| socket::chat_connection(socket, framing, node_lock, generator)))
}

/// Turns every rejection into the `{ "success": false, "error": .. }` body clients already parse.
pub async fn handle_rejection(rejection: Rejection) -> std::result::Result<impl Reply, Infallible> {
    let (code, message) = if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, String::from("Not found"))
    } else if let Some(error) = rejection.find::<warp::filters::body::BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, error.to_string())
    } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, String::from("Payload too large"))
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, String::from("Method not allowed"))
    } else {
        warn!("unhandled rejection: {:?}", rejection);
        (StatusCode::BAD_REQUEST, String::from("Bad request"))
    };
    Ok(warp::reply::with_status(
        warp::reply::json(&ConnectResponse::failure(&message)),
        code,
    ))
}
