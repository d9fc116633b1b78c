use crate::generator::TokenGenerator;
use crate::networking::api_message::{ChatQuery, ConnectRequest};
use crate::node::{JoinPolicy, Node, NodeContext};
use crate::peer_registry::PeerRegistry;
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::RwLock;
use warp::{Filter, Rejection, Reply};

use super::handlers::{
    chat_upgrade_handler, connect_to_swarm_handler, go_online_handler, handle_rejection,
    status_handler,
};

/// Largest accepted `/connect-to-swarm` body.
const MAX_JSON_BODY: u64 = 16 * 1024;

/// Every node route, with json errors and permissive CORS for browser clients.
pub fn routes(
    context: NodeContext,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "POST"])
        .allow_headers(vec!["content-type"]);

    go_online_route_filter(context.node_lock.clone())
        .or(connect_to_swarm_route_filter(
            context.node_lock.clone(),
            context.registry_lock.clone(),
            context.join_policy,
        ))
        .or(status_route_filter(
            context.node_lock.clone(),
            context.registry_lock.clone(),
        ))
        .or(chat_route_filter(context.node_lock, context.generator))
        .recover(handle_rejection)
        .with(cors)
}

/// POST go-online filter.
pub fn go_online_route_filter(
    node_lock: Arc<RwLock<Node>>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path("go-online")
        .and(warp::path::end())
        .and(warp::post())
        .and(with_node(node_lock))
        .and_then(go_online_handler)
}

/// POST connect-to-swarm filter.
pub fn connect_to_swarm_route_filter(
    node_lock: Arc<RwLock<Node>>,
    registry_lock: Arc<RwLock<PeerRegistry>>,
    join_policy: JoinPolicy,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path("connect-to-swarm")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_JSON_BODY))
        .and(warp::body::json::<ConnectRequest>())
        .and(with_node(node_lock))
        .and(with_registry(registry_lock))
        .and(warp::any().map(move || join_policy))
        .and_then(connect_to_swarm_handler)
}

/// GET status filter.
pub fn status_route_filter(
    node_lock: Arc<RwLock<Node>>,
    registry_lock: Arc<RwLock<PeerRegistry>>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path("status")
        .and(warp::path::end())
        .and(warp::get())
        .and(with_node(node_lock))
        .and(with_registry(registry_lock))
        .and_then(status_handler)
}

/// websocket upgrade filter for the chat stream.
pub fn chat_route_filter(
    node_lock: Arc<RwLock<Node>>,
    generator: Arc<dyn TokenGenerator>,
) -> impl Filter<Extract = (impl Reply,), Error = Rejection> + Clone {
    warp::path("chat")
        .and(warp::path::end())
        .and(warp::ws())
        .and(warp::query::<ChatQuery>())
        .and(with_node(node_lock))
        .and(with_generator(generator))
        .and_then(chat_upgrade_handler)
}

/// inject node lock
fn with_node(
    node_lock: Arc<RwLock<Node>>,
) -> impl Filter<Extract = (Arc<RwLock<Node>>,), Error = Infallible> + Clone {
    warp::any().map(move || node_lock.clone())
}
/// inject peer registry lock
fn with_registry(
    registry_lock: Arc<RwLock<PeerRegistry>>,
) -> impl Filter<Extract = (Arc<RwLock<PeerRegistry>>,), Error = Infallible> + Clone {
    warp::any().map(move || registry_lock.clone())
}
/// inject token generator
fn with_generator(
    generator: Arc<dyn TokenGenerator>,
) -> impl Filter<Extract = (Arc<dyn TokenGenerator>,), Error = Infallible> + Clone {
    warp::any().map(move || generator.clone())
}
