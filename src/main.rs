/*!
# Aura Swarm Node

Serves the bootstrap REST endpoints and the `/chat` stream for one swarm node.

## Help

```bash
aura_swarm --help
```

## Example Usage

```bash
aura_swarm --config config --port 8000
RUST_LOG=aura_swarm=debug aura_swarm
```

Every setting can also be overridden from the environment, e.g. `AURA_NETWORK__PORT=9000`.

## Dev

To run from source:

```bash
cargo run -- --help
cargo run -- --host 127.0.0.1 --port 8000
```
*/

use aura_swarm::networking::signals::signal_for_shutdown;
use aura_swarm::settings::{Settings, DEFAULT_CONFIG_NAME};
use aura_swarm::{node, SwarmError};
use clap::{App, Arg};
use std::net::Ipv4Addr;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
pub async fn main() -> aura_swarm::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let matches = App::new("Aura Swarm Node")
        .about("Runs an Aura Swarm node")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .takes_value(true)
                .help("config file name"),
        )
        .arg(
            Arg::with_name("host")
                .long("host")
                .takes_value(true)
                .help("ipv4 address to listen on"),
        )
        .arg(
            Arg::with_name("port")
                .short("p")
                .long("port")
                .takes_value(true)
                .help("port to listen on"),
        )
        .get_matches();

    let config_name = matches.value_of("config").unwrap_or(DEFAULT_CONFIG_NAME);
    let mut settings = Settings::load(config_name)?;

    if let Some(host) = matches.value_of("host") {
        let host: Ipv4Addr = host
            .parse()
            .map_err(|_| SwarmError::Config(format!("invalid host {}", host)))?;
        settings.network.host = host.octets();
    }
    if let Some(port) = matches.value_of("port") {
        settings.network.port = port
            .parse()
            .map_err(|_| SwarmError::Config(format!("invalid port {}", port)))?;
    }

    info!("starting node on {}", settings.listen_address());
    node::run(settings, signal_for_shutdown()).await
}
