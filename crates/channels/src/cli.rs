//! CLI channel: interactive terminal-based chat.
//!
//! Reads lines from stdin and writes replies to stdout.
//! Used for `threadsage chat` interactive mode.

use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use threadsage_core::channel::{Channel, ChannelId, ChannelMessage, MessageKind};
use threadsage_core::error::ChannelError;
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

/// Lines that end an interactive session.
pub const EXIT_COMMANDS: [&str; 5] = ["exit", "quit", "/exit", "/quit", ":q"];

/// Interactive CLI channel for terminal-based chat.
pub struct CliChannel {
    id: ChannelId,
    sequence: Arc<AtomicU64>,
}

impl CliChannel {
    pub fn new() -> Self {
        Self {
            id: ChannelId("cli".into()),
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Turn one typed line into a message. Blank lines and exit commands
    /// yield `None`.
    pub fn parse_line(
        channel_id: &ChannelId,
        sequence: &AtomicU64,
        line: &str,
    ) -> Option<ChannelMessage> {
        let line = line.trim();
        if line.is_empty() || is_exit_command(line) {
            return None;
        }

        let n = sequence.fetch_add(1, Ordering::Relaxed) + 1;
        Some(ChannelMessage {
            channel_id: channel_id.clone(),
            sender_id: "local_user".into(),
            content: line.to_string(),
            chat_id: "cli_session".into(),
            message_id: n.to_string(),
            thread_id: None,
            kind: MessageKind::Direct,
        })
    }
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

pub fn is_exit_command(line: &str) -> bool {
    EXIT_COMMANDS.iter().any(|c| *c == line)
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    fn id(&self) -> &ChannelId {
        &self.id
    }

    async fn start(
        &self,
    ) -> Result<mpsc::Receiver<Result<ChannelMessage, ChannelError>>, ChannelError> {
        let (tx, rx) = mpsc::channel(32);
        let channel_id = self.id.clone();
        let sequence = self.sequence.clone();

        tokio::spawn(async move {
            let stdin = io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if is_exit_command(line.trim()) {
                            break;
                        }
                        let Some(msg) = CliChannel::parse_line(&channel_id, &sequence, &line)
                        else {
                            continue;
                        };
                        if tx.send(Ok(msg)).await.is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF (Ctrl+D)
                    Err(e) => {
                        let _ = tx.send(Err(ChannelError::ConnectionLost(e.to_string()))).await;
                        break;
                    }
                }
            }
        });

        Ok(rx)
    }

    async fn send(
        &self,
        _chat_id: &str,
        content: &str,
        _thread_id: Option<&str>,
    ) -> Result<(), ChannelError> {
        println!("{content}");
        Ok(())
    }

    fn is_allowed(&self, _sender_id: &str) -> bool {
        true // CLI is always allowed (local user)
    }
}
