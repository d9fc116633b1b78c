/*!
# Welcome to Aura Swarm

Aura Swarm is the node and client side of a **peer-to-peer inference swarm**. A node is brought
online, joins a swarm of peers that each hold a slice of a model's layers, and then streams
generated text back to its client token by token.

This crate implements both ends of that contract:

* the **node** (`node`, `networking`) serves the REST bootstrap endpoints (`/go-online`,
  `/connect-to-swarm`, `/status`) and the `/chat` websocket stream, and
* the **client** (`client`) runs the bootstrap sequence, tracks the connection state machine,
  caches the peer list and drives a single streaming chat session.

# Usage

```bash
aura_swarm --config config
auracli --swarm 192.168.0.111
```

*/
pub mod client;
pub mod error;
pub mod generator;
pub mod networking;
pub mod node;
pub mod peer;
pub mod peer_registry;
pub mod settings;
pub mod time;
pub mod util;

#[cfg(test)]
mod test_setup;
#[cfg(test)]
pub mod test_utilities;

pub use error::SwarmError;

pub type Result<T> = std::result::Result<T, SwarmError>;
