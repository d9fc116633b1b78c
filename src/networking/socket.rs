use crate::generator::{TokenGenerator, TokenStream};
use crate::networking::api_message::{ChatRequest, Framing, ServerFrame};
use crate::node::Node;
use futures::{FutureExt, StreamExt};
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};
use uuid::Uuid;
use warp::ws::{Message, WebSocket};

type FrameSender = mpsc::UnboundedSender<std::result::Result<Message, warp::Error>>;

/// Serves one chat socket until the client leaves. Prompts are handled one at a time; the
/// running generation is dropped (and its worker killed) when the socket goes away.
pub async fn chat_connection(
    ws: WebSocket,
    framing: Framing,
    node_lock: Arc<RwLock<Node>>,
    generator: Arc<dyn TokenGenerator>,
) {
    let connection_id = Uuid::new_v4();
    let (ws_sender, mut ws_rcv) = ws.split();
    let (sender, rcv) = mpsc::unbounded_channel();
    let rcv = UnboundedReceiverStream::new(rcv);
    tokio::task::spawn(rcv.forward(ws_sender).map(|result| {
        if let Err(e) = result {
            warn!("error sending websocket msg: {}", e);
        }
    }));
    info!("{} chat channel connected", connection_id);

    let mut generation: Option<TokenStream> = None;
    loop {
        tokio::select! {
            incoming = ws_rcv.next() => {
                let msg = match incoming {
                    Some(Ok(msg)) => msg,
                    Some(Err(e)) => {
                        warn!("error receiving ws message for {}: {}", connection_id, e);
                        break;
                    }
                    None => break,
                };
                if msg.is_close() {
                    break;
                }
                let text = match msg.to_str() {
                    Ok(text) => text,
                    Err(_) => {
                        debug!("{} ignoring non-text frame", connection_id);
                        continue;
                    }
                };
                if generation.is_some() {
                    warn!("{} sent a prompt while generating, dropping it", connection_id);
                    continue;
                }
                match start_generation(text, &node_lock, generator.as_ref()).await {
                    Ok(stream) => generation = Some(stream),
                    Err(message) => {
                        send_frame(&sender, &ServerFrame::error(&message), framing);
                        send_frame(&sender, &ServerFrame::Done, framing);
                    }
                }
            },
            fragment = next_fragment(&mut generation) => {
                match fragment {
                    Some(Ok(text)) => send_frame(&sender, &ServerFrame::Token { text }, framing),
                    Some(Err(e)) => {
                        warn!("{} generation failed: {}", connection_id, e);
                        send_frame(&sender, &ServerFrame::error(&e.to_string()), framing);
                        send_frame(&sender, &ServerFrame::Done, framing);
                        generation = None;
                    }
                    None => {
                        send_frame(&sender, &ServerFrame::Done, framing);
                        generation = None;
                        info!("{} generation complete", connection_id);
                    }
                }
            },
        }
    }

    if generation.is_some() {
        info!("{} disconnected during streaming", connection_id);
    }
    info!("{} chat channel disconnected", connection_id);
}

/// Validates a prompt frame and starts generating. The error string is what the client sees.
async fn start_generation(
    text: &str,
    node_lock: &Arc<RwLock<Node>>,
    generator: &dyn TokenGenerator,
) -> std::result::Result<TokenStream, String> {
    let prompt = match ChatRequest::deserialize(text) {
        Ok(request) => request.prompt().map(String::from),
        Err(_) => None,
    };
    let prompt = prompt.ok_or_else(|| String::from("No prompt provided"))?;
    if !node_lock.read().await.is_connected() {
        return Err(String::from("Not connected to swarm"));
    }
    info!("prompt received ({} chars)", prompt.chars().count());
    Ok(generator.generate(prompt))
}

async fn next_fragment(generation: &mut Option<TokenStream>) -> Option<crate::Result<String>> {
    match generation {
        Some(stream) => stream.next().await,
        None => futures::future::pending().await,
    }
}

fn send_frame(sender: &FrameSender, frame: &ServerFrame, framing: Framing) {
    for payload in frame.encode(framing) {
        if sender.send(Ok(Message::text(payload))).is_err() {
            debug!("chat socket writer is gone");
            return;
        }
    }
}
