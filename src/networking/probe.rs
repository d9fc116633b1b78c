use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// Checks that something accepts TCP connections at the swarm address. `address` may be a
/// bare host (the probe port is appended) or a full `host:port`.
pub async fn is_peer_reachable(address: &str, probe_port: u16, probe_timeout: Duration) -> bool {
    let target = match address.parse::<SocketAddr>() {
        Ok(socket_addr) => socket_addr.to_string(),
        Err(_) => format!("{}:{}", address, probe_port),
    };
    match timeout(probe_timeout, TcpStream::connect(&target)).await {
        Ok(Ok(_stream)) => true,
        Ok(Err(error)) => {
            debug!("probe of {} failed: {}", target, error);
            false
        }
        Err(_) => {
            debug!("probe of {} timed out after {:?}", target, probe_timeout);
            false
        }
    }
}
