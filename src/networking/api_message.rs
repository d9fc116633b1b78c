use crate::peer::Peer;
use serde::{Deserialize, Serialize};

/// Reserved legacy frame marking the end of a generation. Never sent as content.
pub const DONE_SENTINEL: &str = "__DONE__";
/// Legacy error frames are plain text with this prefix.
pub const ERROR_PREFIX: &str = "[ERROR] ";

//
// REST bodies
//
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct GoOnlineResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ConnectRequest {
    pub ip: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct ConnectResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub peers: Option<Vec<Peer>>,
}

impl ConnectResponse {
    pub fn failure(error: &str) -> Self {
        ConnectResponse {
            success: false,
            error: Some(String::from(error)),
            ..Default::default()
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct StatusResponse {
    #[serde(default)]
    pub node_id: String,
    #[serde(default)]
    pub online: bool,
    #[serde(default)]
    pub connected_server: Option<String>,
    pub peers: Vec<Peer>,
}

//
// Chat channel
//
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ChatRequest {
    #[serde(default)]
    pub prompt: Option<String>,
}

impl ChatRequest {
    pub fn new(prompt: &str) -> Self {
        ChatRequest {
            prompt: Some(String::from(prompt)),
        }
    }

    pub fn serialize(&self) -> String {
        // a struct of one optional string cannot fail to serialize
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn deserialize(text: &str) -> crate::Result<ChatRequest> {
        Ok(serde_json::from_str(text)?)
    }

    /// The prompt, if present and not blank.
    pub fn prompt(&self) -> Option<&str> {
        self.prompt
            .as_deref()
            .filter(|prompt| !prompt.trim().is_empty())
    }
}

/// How server frames are laid out on the chat socket.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Framing {
    /// Raw text fragments plus the `__DONE__` sentinel.
    Legacy,
    /// Tagged json envelopes separating control frames from content.
    Envelope,
}

impl Default for Framing {
    fn default() -> Self {
        Framing::Legacy
    }
}

#[derive(Deserialize, Debug, Default)]
pub struct ChatQuery {
    #[serde(default)]
    pub framing: Option<Framing>,
}

/// One server to client frame, independent of framing.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerFrame {
    Token { text: String },
    Done,
    Error { message: String },
}

impl ServerFrame {
    pub fn token(text: &str) -> Self {
        ServerFrame::Token {
            text: String::from(text),
        }
    }

    pub fn error(message: &str) -> Self {
        ServerFrame::Error {
            message: String::from(message),
        }
    }

    /// Encodes the frame into websocket text payloads. A legacy token equal to the sentinel
    /// is split in two so the client still concatenates the original text.
    pub fn encode(&self, framing: Framing) -> Vec<String> {
        match framing {
            Framing::Legacy => match self {
                ServerFrame::Token { text } if text.is_empty() => vec![],
                ServerFrame::Token { text } if text == DONE_SENTINEL => {
                    let (head, tail) = text.split_at(text.len() - 2);
                    vec![String::from(head), String::from(tail)]
                }
                ServerFrame::Token { text } => vec![text.clone()],
                ServerFrame::Done => vec![String::from(DONE_SENTINEL)],
                ServerFrame::Error { message } => vec![format!("{}{}", ERROR_PREFIX, message)],
            },
            Framing::Envelope => match self {
                ServerFrame::Token { text } if text.is_empty() => vec![],
                _ => vec![serde_json::to_string(self).unwrap_or_default()],
            },
        }
    }

    /// Decodes one websocket text payload. Legacy framing has no error frame on the wire,
    /// so `[ERROR] …` text decodes as an ordinary token, as a legacy client would show it.
    pub fn decode(payload: &str, framing: Framing) -> crate::Result<ServerFrame> {
        match framing {
            Framing::Legacy => {
                if payload == DONE_SENTINEL {
                    Ok(ServerFrame::Done)
                } else {
                    Ok(ServerFrame::token(payload))
                }
            }
            Framing::Envelope => Ok(serde_json::from_str(payload)?),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_request_wire_format_test() {
        assert_eq!(ChatRequest::new("X").serialize(), r#"{"prompt":"X"}"#);
        let request = ChatRequest::deserialize(r#"{"prompt":"  "}"#).unwrap();
        assert_eq!(request.prompt(), None);
        let request = ChatRequest::deserialize("{}").unwrap();
        assert_eq!(request.prompt(), None);
        assert!(ChatRequest::deserialize("not json").is_err());
    }

    #[test]
    fn legacy_encoding_test() {
        assert_eq!(ServerFrame::token("Hel").encode(Framing::Legacy), vec!["Hel"]);
        assert_eq!(ServerFrame::Done.encode(Framing::Legacy), vec!["__DONE__"]);
        assert_eq!(
            ServerFrame::error("Not connected to swarm").encode(Framing::Legacy),
            vec!["[ERROR] Not connected to swarm"]
        );
        assert!(ServerFrame::token("").encode(Framing::Legacy).is_empty());
    }

    #[test]
    fn legacy_sentinel_content_is_split() {
        let frames = ServerFrame::token(DONE_SENTINEL).encode(Framing::Legacy);
        assert_eq!(frames, vec!["__DONE", "__"]);
        assert!(frames.iter().all(|frame| frame != DONE_SENTINEL));
        assert_eq!(frames.concat(), DONE_SENTINEL);
    }

    #[test]
    fn legacy_decoding_test() {
        assert_eq!(
            ServerFrame::decode("__DONE__", Framing::Legacy).unwrap(),
            ServerFrame::Done
        );
        assert_eq!(
            ServerFrame::decode("[ERROR] boom", Framing::Legacy).unwrap(),
            ServerFrame::token("[ERROR] boom")
        );
    }

    #[test]
    fn envelope_framing_test() {
        let frames = ServerFrame::token("__DONE__").encode(Framing::Envelope);
        assert_eq!(frames, vec![r#"{"type":"token","text":"__DONE__"}"#]);
        assert_eq!(
            ServerFrame::decode(&frames[0], Framing::Envelope).unwrap(),
            ServerFrame::token("__DONE__")
        );
        assert_eq!(
            ServerFrame::decode(r#"{"type":"done"}"#, Framing::Envelope).unwrap(),
            ServerFrame::Done
        );
        assert_eq!(
            ServerFrame::decode(r#"{"type":"error","message":"x"}"#, Framing::Envelope).unwrap(),
            ServerFrame::error("x")
        );
        assert!(ServerFrame::decode("Hel", Framing::Envelope).is_err());
    }

    #[test]
    fn connect_response_test() {
        let response: ConnectResponse =
            serde_json::from_str(r#"{"success":false,"error":"peer unreachable"}"#).unwrap();
        assert!(!response.success);
        assert_eq!(response.error.as_deref(), Some("peer unreachable"));
        let value = serde_json::to_value(ConnectResponse::failure("Peer not reachable")).unwrap();
        assert_eq!(value, serde_json::json!({"success": false, "error": "Peer not reachable"}));
    }
}
