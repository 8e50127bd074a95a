//! Channel trait: the abstraction over chat platforms.
//!
//! A Channel connects ThreadSage to a messaging platform (Slack, the
//! terminal). It yields inbound messages and knows how to reply in place,
//! mark a message as "being worked on", and reconstruct thread history.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChannelError;
use crate::message::HistoryEntry;

/// Unique identifier for a channel instance.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub String);

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// How the message reached us, which decides how much context to gather.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    /// The bot was addressed directly; answered without thread history.
    Mention,
    /// A reply inside an existing thread; answered with the thread as history.
    ThreadReply,
    /// A plain line typed into an interactive session.
    Direct,
}

/// A message received from a channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelMessage {
    /// The channel this message belongs to
    pub channel_id: ChannelId,

    /// Sender identifier (platform-specific user ID)
    pub sender_id: String,

    /// The text content, with any bot mention already stripped
    pub content: String,

    /// The chat/conversation identifier within the platform
    pub chat_id: String,

    /// Platform identifier of this message (Slack `ts`)
    pub message_id: String,

    /// Root of the thread this message lives in, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,

    pub kind: MessageKind,
}

impl ChannelMessage {
    /// Where the reply should be posted: the existing thread, or a new
    /// thread rooted at this message.
    pub fn reply_thread(&self) -> &str {
        self.thread_id.as_deref().unwrap_or(&self.message_id)
    }
}

/// The core Channel trait.
///
/// Implementations handle platform-specific connection logic, formatting,
/// and authentication. Decorations (reactions) and history default to no-ops
/// for platforms that lack them.
#[async_trait]
pub trait Channel: Send + Sync {
    /// Human-readable channel name (e.g., "slack", "cli").
    fn name(&self) -> &str;

    /// Unique ID for this channel instance.
    fn id(&self) -> &ChannelId;

    /// Start listening for incoming messages.
    async fn start(
        &self,
    ) -> std::result::Result<
        tokio::sync::mpsc::Receiver<std::result::Result<ChannelMessage, ChannelError>>,
        ChannelError,
    >;

    /// Send a reply to a chat, optionally inside a thread.
    async fn send(
        &self,
        chat_id: &str,
        content: &str,
        thread_id: Option<&str>,
    ) -> std::result::Result<(), ChannelError>;

    /// Attach a reaction to a message.
    async fn add_reaction(
        &self,
        _chat_id: &str,
        _message_id: &str,
        _reaction: &str,
    ) -> std::result::Result<(), ChannelError> {
        Ok(())
    }

    /// Remove a reaction previously added with `add_reaction`.
    async fn remove_reaction(
        &self,
        _chat_id: &str,
        _message_id: &str,
        _reaction: &str,
    ) -> std::result::Result<(), ChannelError> {
        Ok(())
    }

    /// Reconstruct a thread as ordered history entries.
    async fn thread_history(
        &self,
        _chat_id: &str,
        _thread_id: &str,
    ) -> std::result::Result<Vec<HistoryEntry>, ChannelError> {
        Ok(Vec::new())
    }

    /// Check if a sender is allowed (allowlist check).
    fn is_allowed(&self, sender_id: &str) -> bool;

    /// Stop the channel gracefully.
    async fn stop(&self) -> std::result::Result<(), ChannelError> {
        Ok(())
    }

    /// Health check: is the channel connected and operational?
    async fn health_check(&self) -> std::result::Result<bool, ChannelError> {
        Ok(true)
    }
}
