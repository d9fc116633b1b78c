use crate::settings::GeneratorSettings;
use crate::SwarmError;
use futures::stream::{BoxStream, StreamExt};
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info, warn};

pub type TokenStream = BoxStream<'static, crate::Result<String>>;

/// Produces the text fragments of one generation. The stream ends when the generation does;
/// dropping it abandons the generation.
pub trait TokenGenerator: Send + Sync {
    fn generate(&self, prompt: String) -> TokenStream;
}

/// Runs an external worker with the prompt as its last argument and streams its stdout.
#[derive(Debug, Clone)]
pub struct ProcessGenerator {
    program: String,
    args: Vec<String>,
}

const READ_CHUNK_SIZE: usize = 64;

impl ProcessGenerator {
    pub fn new(program: &str, args: Vec<String>) -> Self {
        ProcessGenerator {
            program: String::from(program),
            args,
        }
    }

    pub fn from_settings(settings: &GeneratorSettings) -> Self {
        ProcessGenerator::new(&settings.program, settings.args.clone())
    }
}

impl TokenGenerator for ProcessGenerator {
    fn generate(&self, prompt: String) -> TokenStream {
        let (sender, receiver) = mpsc::unbounded_channel();
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(&prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);

        tokio::spawn(async move {
            let mut child = match command.spawn() {
                Ok(child) => child,
                Err(error) => {
                    let _ = sender.send(Err(SwarmError::Io(error)));
                    return;
                }
            };
            info!("spawned prompt worker");
            let mut stdout = match child.stdout.take() {
                Some(stdout) => stdout,
                None => {
                    let _ = sender.send(Err(SwarmError::Protocol(String::from(
                        "worker stdout was not captured",
                    ))));
                    return;
                }
            };

            let mut pending: Vec<u8> = vec![];
            let mut buffer = [0u8; READ_CHUNK_SIZE];
            loop {
                let read = match stdout.read(&mut buffer).await {
                    Ok(0) => break,
                    Ok(read) => read,
                    Err(error) => {
                        let _ = sender.send(Err(SwarmError::Io(error)));
                        return;
                    }
                };
                pending.extend_from_slice(&buffer[..read]);
                if let Some(text) = drain_utf8(&mut pending, false) {
                    if sender.send(Ok(text)).is_err() {
                        debug!("generation abandoned, killing worker");
                        return;
                    }
                }
            }
            if let Some(text) = drain_utf8(&mut pending, true) {
                let _ = sender.send(Ok(text));
            }

            match child.wait().await {
                Ok(status) if status.success() => info!("worker finished"),
                Ok(status) => warn!("worker exited with {}", status),
                Err(error) => warn!("could not reap worker: {}", error),
            }
        });

        UnboundedReceiverStream::new(receiver).boxed()
    }
}

/// Takes the longest valid UTF-8 prefix out of `pending`. Each invalid sequence becomes one
/// U+FFFD. An incomplete trailing sequence is kept for the next read unless `flush` is set.
pub fn drain_utf8(pending: &mut Vec<u8>, flush: bool) -> Option<String> {
    let mut text = String::new();
    loop {
        match std::str::from_utf8(pending) {
            Ok(valid) => {
                text.push_str(valid);
                pending.clear();
                break;
            }
            Err(error) => {
                let valid_up_to = error.valid_up_to();
                text.push_str(&String::from_utf8_lossy(&pending[..valid_up_to]));
                match error.error_len() {
                    Some(invalid) => {
                        text.push(char::REPLACEMENT_CHARACTER);
                        pending.drain(..valid_up_to + invalid);
                    }
                    None if flush => {
                        text.push_str(&String::from_utf8_lossy(&pending[valid_up_to..]));
                        pending.clear();
                        break;
                    }
                    None => {
                        pending.drain(..valid_up_to);
                        break;
                    }
                }
            }
        }
    }
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
