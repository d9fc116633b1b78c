use crate::time::create_timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Shown in place of an answer when a prompt is submitted before joining a swarm.
pub const NOT_CONNECTED_REPLY: &str = "⚠️ Connection failed. Please connect to the swarm network first with /connect, then try again.";

#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    id: String,
    role: Role,
    content: String,
    timestamp: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tokens_per_second: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    peers_used: Option<Vec<String>>,
    /// Open assistant messages still accept fragments.
    #[serde(skip)]
    open: bool,
    #[serde(skip)]
    fragments: usize,
}

impl ChatMessage {
    fn new(role: Role, content: &str, open: bool) -> Self {
        ChatMessage {
            id: Uuid::new_v4().to_string(),
            role,
            content: String::from(content),
            timestamp: create_timestamp(),
            tokens_per_second: None,
            peers_used: None,
            open,
            fragments: 0,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn tokens_per_second(&self) -> Option<f64> {
        self.tokens_per_second
    }

    pub fn peers_used(&self) -> Option<&[String]> {
        self.peers_used.as_deref()
    }

    pub fn is_open(&self) -> bool {
        self.open
    }
}

/// Ordered chat history of one session. Only the trailing open assistant message can change.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    messages: Vec<ChatMessage>,
}

impl Transcript {
    pub fn new() -> Self {
        Transcript { messages: vec![] }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn push_user(&mut self, content: &str) -> &ChatMessage {
        self.push(ChatMessage::new(Role::User, content, false))
    }

    /// A complete assistant message produced locally, never streamed.
    pub fn push_local_reply(&mut self, content: &str) -> &ChatMessage {
        self.push(ChatMessage::new(Role::Assistant, content, false))
    }

    /// The empty assistant message fragments will be appended to.
    pub fn open_assistant(&mut self, peers_used: Vec<String>) -> &ChatMessage {
        let mut message = ChatMessage::new(Role::Assistant, "", true);
        if !peers_used.is_empty() {
            message.peers_used = Some(peers_used);
        }
        self.push(message)
    }

    /// Appends to the trailing message iff it is an open assistant message. Returns whether
    /// the fragment was kept.
    pub fn append_fragment(&mut self, fragment: &str) -> bool {
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Assistant && last.open => {
                last.content.push_str(fragment);
                last.fragments += 1;
                true
            }
            _ => false,
        }
    }

    /// Seals the trailing open assistant message and annotates its throughput.
    pub fn seal(&mut self, finished_at: u64) {
        if let Some(last) = self.messages.last_mut() {
            if last.role == Role::Assistant && last.open {
                last.open = false;
                let elapsed_ms = finished_at.saturating_sub(last.timestamp);
                if last.fragments > 0 && elapsed_ms > 0 {
                    last.tokens_per_second =
                        Some(last.fragments as f64 * 1000.0 / elapsed_ms as f64);
                }
            }
        }
    }

    fn push(&mut self, message: ChatMessage) -> &ChatMessage {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }
}
