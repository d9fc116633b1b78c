/*!
# Aura Swarm Command Line Client

Brings a node online, joins a swarm and chats with it from the terminal.

## Usage

```bash
auracli --api-base http://localhost:8000 --swarm 192.168.0.111
```

Anything typed at the prompt is sent to the swarm and the answer is streamed back token by
token. Lines starting with `/` are commands:

`/status` connection state and swarm statistics

`/peers` refresh and list the swarm's peers

`/connect [address]` join a swarm (again), e.g. after a failure

`/disconnect` close the chat channel and reset the connection

`/clear` clear the transcript

`/quit` exit

## Dev

To run from source:

```bash
cargo run --bin auracli -- --swarm 127.0.0.1 --envelope
```
*/
use aura_swarm::client::{SessionEvent, SubmitOutcome, SwarmClient};
use aura_swarm::networking::api_message::Framing;
use aura_swarm::settings::{Settings, DEFAULT_CONFIG_NAME};
use aura_swarm::time::format_timestamp;
use aura_swarm::{client::api::SwarmApi, SwarmError};
use clap::{App, Arg};
use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[tokio::main]
pub async fn main() -> aura_swarm::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let matches = App::new("Aura Swarm Client")
        .about("Chat with an Aura Swarm through the command line")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .takes_value(true)
                .help("config file name"),
        )
        .arg(
            Arg::with_name("api_base")
                .short("a")
                .long("api-base")
                .takes_value(true)
                .help("http address of the node, e.g. http://localhost:8000"),
        )
        .arg(
            Arg::with_name("swarm")
                .short("s")
                .long("swarm")
                .takes_value(true)
                .help("address of the swarm to join"),
        )
        .arg(
            Arg::with_name("envelope")
                .short("e")
                .long("envelope")
                .help("use typed json frames on the chat channel"),
        )
        .get_matches();

    let config_name = matches.value_of("config").unwrap_or(DEFAULT_CONFIG_NAME);
    let settings = Settings::load(config_name)?;
    let mut client_settings = settings.client.clone();
    if let Some(api_base) = matches.value_of("api_base") {
        client_settings.api_base = String::from(api_base);
    }
    if matches.is_present("envelope") {
        client_settings.framing = Framing::Envelope;
    }
    let swarm_address = matches
        .value_of("swarm")
        .unwrap_or(&settings.swarm.default_address);

    let mut client = SwarmClient::from_settings(&client_settings, swarm_address)?;
    println!(
        "connecting to swarm at {} via {} ({:?} framing)",
        swarm_address,
        client.backend().api_base(),
        client.session().framing()
    );
    connect(&mut client, None).await;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let line = match lines.next_line().await? {
            Some(line) => line,
            None => break,
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(command) = line.strip_prefix('/') {
            let mut parts = command.split_whitespace();
            match parts.next() {
                Some("quit") | Some("exit") => break,
                Some("status") => print_status(&client),
                Some("peers") => {
                    if let Err(e) = client.refresh_status().await {
                        println!("peer refresh failed: {}", e);
                    }
                    print_peers(&client);
                }
                Some("connect") => connect(&mut client, parts.next()).await,
                Some("disconnect") => {
                    client.disconnect().await;
                    println!("disconnected");
                }
                Some("clear") => {
                    client.clear_transcript();
                    println!("transcript cleared");
                }
                _ => println!("commands: /status /peers /connect [address] /disconnect /clear /quit"),
            }
            continue;
        }
        chat(&mut client, line).await?;
    }

    client.disconnect().await;
    Ok(())
}

async fn connect(client: &mut SwarmClient<SwarmApi>, address: Option<&str>) {
    let address = String::from(address.unwrap_or(client.swarm_address()));
    match client.connect(&address).await {
        Ok(Some(report)) => println!(
            "node {} joined swarm at {} ({} peers)",
            report.node_id.as_deref().unwrap_or("?"),
            report.connected_to,
            report.peers
        ),
        Ok(None) => println!("already {}", client.state()),
        Err(e) => {
            println!("connection failed: {}", e);
            return;
        }
    }
    if let Err(e) = client.open_session().await {
        println!("could not open chat channel: {}", e);
    }
}

async fn chat(client: &mut SwarmClient<SwarmApi>, prompt: &str) -> aura_swarm::Result<()> {
    let outcome = match client.submit_prompt(prompt).await {
        Ok(outcome) => outcome,
        Err(SwarmError::ChannelNotOpen) => {
            if let Err(e) = client.open_session().await {
                println!("could not open chat channel: {}", e);
                return Ok(());
            }
            match client.submit_prompt(prompt).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    println!("could not send prompt: {}", e);
                    return Ok(());
                }
            }
        }
        Err(e) => {
            println!("could not send prompt: {}", e);
            return Ok(());
        }
    };
    match outcome {
        SubmitOutcome::Sent => {}
        SubmitOutcome::LocalReply => {
            if let Some(reply) = client.session().transcript().last() {
                println!("{}", reply.content());
            }
            return Ok(());
        }
        SubmitOutcome::Ignored => return Ok(()),
    }

    let mut stdout = std::io::stdout();
    while let Some(event) = client.next_event().await {
        match event {
            SessionEvent::Token(text) => {
                write!(stdout, "{}", text)?;
                stdout.flush()?;
            }
            SessionEvent::ServerError(message) => {
                write!(stdout, "[ERROR] {}", message)?;
            }
            SessionEvent::Completed => break,
            SessionEvent::ChannelLost(reason) => {
                match reason {
                    Some(reason) => warn!("chat channel lost: {}", reason),
                    None => warn!("chat channel closed by node"),
                }
                println!();
                println!("chat channel lost, use /connect to reconnect");
                return Ok(());
            }
            SessionEvent::Dropped => {}
        }
    }
    println!();
    if let Some(rate) = client
        .session()
        .transcript()
        .last()
        .and_then(|message| message.tokens_per_second())
    {
        println!("({:.1} tokens/s)", rate);
    }
    Ok(())
}

fn print_status(client: &SwarmClient<SwarmApi>) {
    let status = client.status();
    println!("state: {}", client.state());
    println!("online: {}  connected: {}", status.online, status.connected_to_swarm);
    if let Some(error) = status.last_error {
        println!("last error: {}", error);
    }
    let stats = client.peer_cache().stats();
    println!(
        "peers: {}/{} active  ram: {} GB  vram: {} GB  throughput: {:.1} tok/s  latency: {:.0} ms",
        stats.active_peers,
        stats.total_peers,
        stats.total_ram,
        stats.total_vram,
        stats.current_throughput,
        stats.average_latency
    );
    if let Some(refreshed_at) = client.peer_cache().refreshed_at() {
        println!("peers refreshed at {}", format_timestamp(refreshed_at));
    }
}

fn print_peers(client: &SwarmClient<SwarmApi>) {
    for peer in client.peer_cache().peers() {
        let layers = match peer.layers {
            Some(range) => format!("{}-{}", range.start, range.end),
            None => String::from("-"),
        };
        println!(
            "{:<12} {:<16} {:<8} layers {:<6} {:.1} tok/s",
            peer.name,
            peer.ip,
            format!("{:?}", peer.status).to_lowercase(),
            layers,
            peer.throughput
        );
    }
}
