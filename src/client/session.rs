use crate::client::channel::{ChannelEvent, ChatChannel};
use crate::client::transcript::{Transcript, NOT_CONNECTED_REPLY};
use crate::networking::api_message::{Framing, ServerFrame, ERROR_PREFIX};
use crate::time::create_timestamp;
use crate::SwarmError;
use tracing::{debug, info, warn};
use url::Url;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The prompt went out on the channel and an assistant message is streaming.
    Sent,
    /// Not in a swarm: answered locally, nothing transmitted.
    LocalReply,
    /// Blank prompt, or a generation is still streaming.
    Ignored,
}

/// What one channel event did to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    Token(String),
    ServerError(String),
    Completed,
    /// The channel is gone. Carries the transport error, `None` on a clean close.
    ChannelLost(Option<String>),
    /// The frame had nowhere to go and was dropped.
    Dropped,
}

/// A single streaming chat: one channel, one transcript and at most one prompt in flight.
pub struct ChatSession {
    chat_url: Url,
    framing: Framing,
    channel: Option<ChatChannel>,
    transcript: Transcript,
    generating: bool,
}

impl ChatSession {
    pub fn new(chat_url: Url, framing: Framing) -> Self {
        ChatSession {
            chat_url,
            framing,
            channel: None,
            transcript: Transcript::new(),
            generating: false,
        }
    }

    pub fn is_open(&self) -> bool {
        self.channel.is_some()
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    /// Opens the chat channel unless one is already open. A failed attempt retains nothing.
    pub async fn open(&mut self) -> crate::Result<()> {
        if self.channel.is_some() {
            return Ok(());
        }
        let channel = ChatChannel::open(self.chat_url.clone(), self.framing).await?;
        info!("chat channel open at {}", self.chat_url);
        self.channel = Some(channel);
        Ok(())
    }

    pub async fn close(&mut self) {
        if let Some(channel) = self.channel.take() {
            channel.close().await;
            info!("chat channel closed");
        }
        self.finish_stream();
    }

    pub async fn submit_prompt(
        &mut self,
        text: &str,
        connected_to_swarm: bool,
        peers_used: Vec<String>,
    ) -> crate::Result<SubmitOutcome> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(SubmitOutcome::Ignored);
        }
        if self.generating {
            debug!("prompt ignored, a generation is still streaming");
            return Ok(SubmitOutcome::Ignored);
        }
        if !connected_to_swarm {
            self.transcript.push_user(text);
            self.transcript.push_local_reply(NOT_CONNECTED_REPLY);
            return Ok(SubmitOutcome::LocalReply);
        }
        let channel = self.channel.as_mut().ok_or(SwarmError::ChannelNotOpen)?;
        if let Err(e) = channel.send_prompt(text).await {
            warn!("failed to send prompt: {}", e);
            self.channel = None;
            return Err(e);
        }
        self.transcript.push_user(text);
        self.transcript.open_assistant(peers_used);
        self.generating = true;
        Ok(SubmitOutcome::Sent)
    }

    #[cfg(test)]
    pub(crate) async fn close_write_half(&mut self) {
        if let Some(channel) = self.channel.as_mut() {
            channel.close_write_half().await;
        }
    }

    /// Waits for the next channel event and applies it. `None` when no channel is open.
    pub async fn next_event(&mut self) -> Option<SessionEvent> {
        let event = self.channel.as_mut()?.next_event().await;
        Some(self.apply(event))
    }

    pub fn apply(&mut self, event: ChannelEvent) -> SessionEvent {
        match event {
            ChannelEvent::Frame(ServerFrame::Token { text }) => {
                if self.transcript.append_fragment(&text) {
                    SessionEvent::Token(text)
                } else {
                    debug!("dropping stray fragment");
                    SessionEvent::Dropped
                }
            }
            ChannelEvent::Frame(ServerFrame::Error { message }) => {
                // rendered the way legacy framing shows it
                let rendered = format!("{}{}", ERROR_PREFIX, message);
                if self.transcript.append_fragment(&rendered) {
                    SessionEvent::ServerError(message)
                } else {
                    SessionEvent::Dropped
                }
            }
            ChannelEvent::Frame(ServerFrame::Done) => {
                if self.generating {
                    self.finish_stream();
                    SessionEvent::Completed
                } else {
                    SessionEvent::Dropped
                }
            }
            ChannelEvent::Error(reason) => {
                warn!("chat channel error: {}", reason);
                self.channel = None;
                self.finish_stream();
                SessionEvent::ChannelLost(Some(reason))
            }
            ChannelEvent::Closed => {
                info!("chat channel closed by node");
                self.channel = None;
                self.finish_stream();
                SessionEvent::ChannelLost(None)
            }
        }
    }

    fn finish_stream(&mut self) {
        if self.generating {
            self.generating = false;
            self.transcript.seal(create_timestamp());
        }
    }
}
