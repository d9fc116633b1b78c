/*!

# Swarm Client

The client half of the protocol. A [`bootstrap::SwarmClient`] brings its node online, joins a
swarm, keeps a cached copy of the peer list and drives one streaming chat session:

```text
go-online ──▶ connect-to-swarm ──▶ status
                                     │
open_session ──▶ submit_prompt ──▶ next_event* ──▶ Completed
```

Connection progress is tracked by [`connection::ConnectionMachine`]. Nothing reconnects on its
own; after a failure the caller runs `connect` again.

*/

pub mod api;
pub mod bootstrap;
pub mod channel;
pub mod connection;
pub mod peer_cache;
pub mod session;
pub mod transcript;

pub use bootstrap::{BootstrapReport, SwarmClient};
pub use session::{SessionEvent, SubmitOutcome};
