use crate::networking::api_message::{
    ConnectRequest, ConnectResponse, GoOnlineResponse, StatusResponse,
};
use crate::util::endpoint_url;
use crate::SwarmError;
use futures::future::{BoxFuture, FutureExt};
use reqwest::Client;
use tracing::debug;

/// Used when a join fails without the node saying why.
pub const CONNECT_FALLBACK_ERROR: &str = "Failed to connect";

/// The three bootstrap calls a client makes against its node.
pub trait SwarmBackend: Send + Sync {
    /// Succeeds on any 2xx that does not carry `success: false`.
    fn go_online(&self) -> BoxFuture<'_, crate::Result<GoOnlineResponse>>;
    /// Succeeds only on a 2xx with `success: true`; otherwise the node's `error` is surfaced.
    fn connect_to_swarm<'a>(&'a self, ip: &'a str) -> BoxFuture<'a, crate::Result<ConnectResponse>>;
    fn get_status(&self) -> BoxFuture<'_, crate::Result<StatusResponse>>;
}

/// HTTP implementation of `SwarmBackend`.
#[derive(Debug, Clone)]
pub struct SwarmApi {
    api_base: String,
    http: Client,
}

impl SwarmApi {
    pub fn new(api_base: &str) -> Self {
        SwarmApi {
            api_base: String::from(api_base.trim_end_matches('/')),
            http: Client::new(),
        }
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    async fn post_go_online(&self) -> crate::Result<GoOnlineResponse> {
        let url = endpoint_url(&self.api_base, "/go-online")?;
        let response = self.http.post(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SwarmError::Rejected(format!(
                "go-online failed with status {}",
                status
            )));
        }
        let body: GoOnlineResponse = response.json().await.unwrap_or_default();
        if body.success == Some(false) {
            return Err(SwarmError::Rejected(String::from("node refused to go online")));
        }
        debug!("node {:?} is online", body.node_id);
        Ok(body)
    }

    async fn post_connect_to_swarm(&self, ip: &str) -> crate::Result<ConnectResponse> {
        let url = endpoint_url(&self.api_base, "/connect-to-swarm")?;
        let response = self
            .http
            .post(url)
            .json(&ConnectRequest { ip: String::from(ip) })
            .send()
            .await?;
        let status = response.status();
        let body: Option<ConnectResponse> = response.json().await.ok();
        match body {
            Some(body) if status.is_success() && body.success => Ok(body),
            Some(body) => Err(SwarmError::Rejected(
                body.error
                    .filter(|error| !error.is_empty())
                    .unwrap_or_else(|| String::from(CONNECT_FALLBACK_ERROR)),
            )),
            None => Err(SwarmError::Rejected(String::from(CONNECT_FALLBACK_ERROR))),
        }
    }

    async fn fetch_status(&self) -> crate::Result<StatusResponse> {
        let url = endpoint_url(&self.api_base, "/status")?;
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SwarmError::Rejected(format!(
                "status failed with status {}",
                status
            )));
        }
        let body = response.json::<StatusResponse>().await.map_err(|error| {
            SwarmError::Protocol(format!("malformed status body: {}", error))
        })?;
        Ok(body)
    }
}

impl SwarmBackend for SwarmApi {
    fn go_online(&self) -> BoxFuture<'_, crate::Result<GoOnlineResponse>> {
        self.post_go_online().boxed()
    }

    fn connect_to_swarm<'a>(&'a self, ip: &'a str) -> BoxFuture<'a, crate::Result<ConnectResponse>> {
        self.post_connect_to_swarm(ip).boxed()
    }

    fn get_status(&self) -> BoxFuture<'_, crate::Result<StatusResponse>> {
        self.fetch_status().boxed()
    }
}
