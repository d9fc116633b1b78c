use crate::SwarmError;
use std::fmt;
use tracing::{info, warn};

/// Where the client is in bringing its node online and into a swarm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    GoingOnline,
    Online,
    JoiningSwarm,
    Connected,
    Failed(String),
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::GoingOnline => write!(f, "going online"),
            Self::Online => write!(f, "online"),
            Self::JoiningSwarm => write!(f, "joining swarm"),
            Self::Connected => write!(f, "connected"),
            Self::Failed(reason) => write!(f, "failed ({})", reason),
        }
    }
}

/// The flattened view of the connection the rest of the client reads.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionStatus {
    pub online: bool,
    pub connected_to_swarm: bool,
    pub last_error: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConnectionMachine {
    state: ConnectionState,
    online: bool,
    last_error: Option<String>,
}

impl ConnectionMachine {
    pub fn new() -> Self {
        ConnectionMachine {
            state: ConnectionState::Disconnected,
            online: false,
            last_error: None,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    pub fn status(&self) -> ConnectionStatus {
        ConnectionStatus {
            online: self.online,
            connected_to_swarm: self.is_connected(),
            last_error: self.last_error.clone(),
        }
    }

    /// Starts a connect attempt. Returns false when the attempt is a no-op because the
    /// client is already connected or an attempt is in flight.
    pub fn begin_connect(&mut self) -> bool {
        match self.state {
            ConnectionState::Disconnected | ConnectionState::Failed(_) => {
                self.last_error = None;
                self.online = false;
                self.move_to(ConnectionState::GoingOnline);
                true
            }
            _ => false,
        }
    }

    pub fn online_acknowledged(&mut self) -> crate::Result<()> {
        self.expect(ConnectionState::GoingOnline, "online acknowledged")?;
        self.online = true;
        self.move_to(ConnectionState::Online);
        Ok(())
    }

    pub fn begin_join(&mut self) -> crate::Result<()> {
        self.expect(ConnectionState::Online, "join swarm")?;
        self.move_to(ConnectionState::JoiningSwarm);
        Ok(())
    }

    pub fn join_succeeded(&mut self) -> crate::Result<()> {
        self.expect(ConnectionState::JoiningSwarm, "join succeeded")?;
        self.move_to(ConnectionState::Connected);
        Ok(())
    }

    /// Records a failure from any state. The reason is kept verbatim for display; the
    /// online flag survives only if the node had acknowledged going online.
    pub fn fail(&mut self, reason: &str) {
        match self.state {
            ConnectionState::Online | ConnectionState::JoiningSwarm | ConnectionState::Connected => {}
            _ => self.online = false,
        }
        warn!("connection failed: {}", reason);
        self.last_error = Some(String::from(reason));
        self.move_to(ConnectionState::Failed(String::from(reason)));
    }

    /// Explicit disconnect, or the chat channel died under a connected client.
    pub fn reset(&mut self, reason: Option<&str>) {
        self.online = false;
        if let Some(reason) = reason {
            self.last_error = Some(String::from(reason));
        }
        self.move_to(ConnectionState::Disconnected);
    }

    fn expect(&self, expected: ConnectionState, event: &'static str) -> crate::Result<()> {
        if self.state == expected {
            Ok(())
        } else {
            Err(SwarmError::InvalidTransition {
                from: self.state.to_string(),
                event,
            })
        }
    }

    fn move_to(&mut self, next: ConnectionState) {
        info!("connection {} -> {}", self.state, next);
        self.state = next;
    }
}

impl Default for ConnectionMachine {
    fn default() -> Self {
        ConnectionMachine::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_invariant(machine: &ConnectionMachine) {
        let status = machine.status();
        assert!(!status.connected_to_swarm || status.online);
    }

    #[test]
    fn happy_path_test() {
        let mut machine = ConnectionMachine::new();
        assert_eq!(machine.status(), ConnectionStatus::default());

        assert!(machine.begin_connect());
        assert_eq!(machine.state(), &ConnectionState::GoingOnline);
        machine.online_acknowledged().unwrap();
        assert!(machine.status().online);
        machine.begin_join().unwrap();
        machine.join_succeeded().unwrap();
        assert!(machine.is_connected());
        assert_invariant(&machine);

        // sticky
        assert!(!machine.begin_connect());
        assert!(machine.is_connected());
    }

    #[test]
    fn go_online_failure_test() {
        let mut machine = ConnectionMachine::new();
        machine.begin_connect();
        machine.fail("go-online failed with status 500");
        let status = machine.status();
        assert!(!status.online);
        assert!(!status.connected_to_swarm);
        assert_eq!(status.last_error.as_deref(), Some("go-online failed with status 500"));
        assert!(matches!(machine.state(), ConnectionState::Failed(_)));
    }

    #[test]
    fn join_failure_keeps_online_test() {
        let mut machine = ConnectionMachine::new();
        machine.begin_connect();
        machine.online_acknowledged().unwrap();
        machine.begin_join().unwrap();
        machine.fail("peer unreachable");
        let status = machine.status();
        assert!(status.online);
        assert!(!status.connected_to_swarm);
        assert_eq!(machine.state(), &ConnectionState::Failed(String::from("peer unreachable")));
        assert_invariant(&machine);

        // a retry restarts at GoingOnline and clears the error
        assert!(machine.begin_connect());
        assert_eq!(machine.state(), &ConnectionState::GoingOnline);
        assert_eq!(machine.status().last_error, None);
    }

    #[test]
    fn invalid_transitions_test() {
        let mut machine = ConnectionMachine::new();
        assert!(machine.online_acknowledged().is_err());
        assert!(machine.begin_join().is_err());
        assert!(machine.join_succeeded().is_err());
        assert_eq!(machine.state(), &ConnectionState::Disconnected);

        machine.begin_connect();
        assert!(!machine.begin_connect());
        assert!(machine.join_succeeded().is_err());
        assert_eq!(machine.state(), &ConnectionState::GoingOnline);
    }

    #[test]
    fn reset_test() {
        let mut machine = ConnectionMachine::new();
        machine.begin_connect();
        machine.online_acknowledged().unwrap();
        machine.begin_join().unwrap();
        machine.join_succeeded().unwrap();

        machine.reset(Some("chat channel lost"));
        assert_eq!(machine.state(), &ConnectionState::Disconnected);
        let status = machine.status();
        assert!(!status.online);
        assert!(!status.connected_to_swarm);
        assert_eq!(status.last_error.as_deref(), Some("chat channel lost"));
    }
}
