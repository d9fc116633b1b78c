use std::fmt;

/// All errors that can occur on either side of the swarm protocol.
#[derive(Debug)]
pub enum SwarmError {
    /// The request or socket never produced a usable response.
    Transport(String),
    /// The backend answered but refused the operation. Displayed verbatim.
    Rejected(String),
    /// A frame or body did not match the wire format.
    Protocol(String),
    /// The node has not joined a swarm yet.
    NotConnected,
    /// No chat channel is open.
    ChannelNotOpen,
    /// The connection state machine was asked for a transition it does not allow.
    InvalidTransition { from: String, event: &'static str },
    /// A peer entry violates the layer range invariant.
    InvalidPeer(String),
    /// Settings could not be loaded or are inconsistent.
    Config(String),
    /// An underlying I/O error not covered by the above variants.
    Io(std::io::Error),
}

impl fmt::Display for SwarmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(msg) => write!(f, "transport error: {}", msg),
            Self::Rejected(msg) => write!(f, "{}", msg),
            Self::Protocol(msg) => write!(f, "protocol error: {}", msg),
            Self::NotConnected => write!(f, "Not connected to swarm"),
            Self::ChannelNotOpen => write!(f, "chat channel is not open"),
            Self::InvalidTransition { from, event } => {
                write!(f, "invalid transition: {} while {}", event, from)
            }
            Self::InvalidPeer(msg) => write!(f, "invalid peer: {}", msg),
            Self::Config(msg) => write!(f, "invalid config: {}", msg),
            Self::Io(e) => write!(f, "io error: {}", e),
        }
    }
}

impl std::error::Error for SwarmError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl SwarmError {
    /// Transport failures reset the connection, everything else leaves it alone.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Io(_))
    }
}

impl From<std::io::Error> for SwarmError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<reqwest::Error> for SwarmError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for SwarmError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        Self::Transport(e.to_string())
    }
}

impl From<serde_json::Error> for SwarmError {
    fn from(e: serde_json::Error) -> Self {
        Self::Protocol(e.to_string())
    }
}

impl From<config::ConfigError> for SwarmError {
    fn from(e: config::ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

impl From<url::ParseError> for SwarmError {
    fn from(e: url::ParseError) -> Self {
        Self::Config(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_message_is_shown_verbatim() {
        let err = SwarmError::Rejected(String::from("peer unreachable"));
        assert_eq!(err.to_string(), "peer unreachable");
        assert!(!err.is_transport());
    }

    #[test]
    fn io_errors_count_as_transport() {
        let err: SwarmError =
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused").into();
        assert!(err.is_transport());
        assert!(std::error::Error::source(&err).is_some());
    }
}
