use crate::networking::api_message::{ChatRequest, Framing, ServerFrame};
use futures::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use tokio::net::TcpStream;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};
use url::Url;

type ChatSocket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// What the chat socket produced next.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    Frame(ServerFrame),
    Error(String),
    Closed,
}

/// One persistent websocket to a node's `/chat` endpoint.
pub struct ChatChannel {
    write_sink: SplitSink<ChatSocket, Message>,
    read_stream: SplitStream<ChatSocket>,
    framing: Framing,
}

impl ChatChannel {
    pub async fn open(url: Url, framing: Framing) -> crate::Result<Self> {
        debug!("opening chat channel to {}", url);
        let (ws_stream, _) = connect_async(url).await?;
        let (write_sink, read_stream) = ws_stream.split();
        Ok(ChatChannel {
            write_sink,
            read_stream,
            framing,
        })
    }

    /// Sends exactly one text frame, `{"prompt": <text>}`.
    pub async fn send_prompt(&mut self, prompt: &str) -> crate::Result<()> {
        let payload = ChatRequest::new(prompt).serialize();
        self.write_sink.send(Message::text(payload)).await?;
        Ok(())
    }

    /// Waits for the next frame. Control and binary frames are skipped, as are envelopes
    /// that do not decode.
    pub async fn next_event(&mut self) -> ChannelEvent {
        loop {
            match self.read_stream.next().await {
                Some(Ok(Message::Text(payload))) => {
                    match ServerFrame::decode(&payload, self.framing) {
                        Ok(frame) => return ChannelEvent::Frame(frame),
                        Err(e) => warn!("dropping undecodable chat frame: {}", e),
                    }
                }
                Some(Ok(Message::Close(_))) | None => return ChannelEvent::Closed,
                Some(Ok(_)) => continue,
                Some(Err(e)) => return ChannelEvent::Error(e.to_string()),
            }
        }
    }

    #[cfg(test)]
    pub(crate) async fn close_write_half(&mut self) {
        if let Err(e) = self.write_sink.close().await {
            debug!("chat channel close: {}", e);
        }
    }

    pub async fn close(mut self) {
        if let Err(e) = self.write_sink.close().await {
            debug!("chat channel close: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utilities::{spawn_test_node, unused_port, ScriptedGenerator};
    use crate::util::chat_url;
    use std::sync::Arc;

    #[tokio::test]
    async fn prompt_round_trip_test() {
        let (address, context) =
            spawn_test_node(Arc::new(ScriptedGenerator::new(&["Hel", "lo"])), 1).await;
        context.node_lock.write().await.join_swarm("127.0.0.1");
        let url = chat_url(&format!("http://{}", address), true).unwrap();
        let mut channel = ChatChannel::open(url, Framing::Envelope).await.unwrap();

        channel.send_prompt("hi").await.unwrap();
        assert_eq!(channel.next_event().await, ChannelEvent::Frame(ServerFrame::token("Hel")));
        assert_eq!(channel.next_event().await, ChannelEvent::Frame(ServerFrame::token("lo")));
        assert_eq!(channel.next_event().await, ChannelEvent::Frame(ServerFrame::Done));
        channel.close().await;
    }

    #[tokio::test]
    async fn open_without_node_fails_test() {
        let url = chat_url(&format!("http://127.0.0.1:{}", unused_port().await), false).unwrap();
        let error = ChatChannel::open(url, Framing::Legacy).await.err().unwrap();
        assert!(error.is_transport());
    }
}
