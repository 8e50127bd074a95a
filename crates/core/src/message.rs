//! Message and history domain types.
//!
//! These are the value objects that flow through the pipeline:
//! a chat adapter hands over `HistoryEntry` values, the coordinator maps them
//! to role-tagged `Message`s, and providers consume those messages.

use serde::{Deserialize, Serialize};

/// Speaker name reserved for the assistant's own prior turns.
pub const ASSISTANT_SPEAKER: &str = "AI";

/// The role of a message sender in a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System instructions
    System,
    /// The end user
    User,
    /// The AI assistant
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single role-tagged message.
///
/// Messages are plain values: two messages with the same role and content
/// are equal, and nothing mutates a message once it is part of a sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Who sent this message
    pub role: Role,

    /// The text content
    pub content: String,
}

impl Message {
    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// One prior turn as reported by the chat platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Display name of whoever wrote the turn; `"AI"` marks our own turns.
    #[serde(alias = "user")]
    pub speaker: String,

    /// The text of the turn
    pub text: String,
}

impl HistoryEntry {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
        }
    }

    /// An entry written by the assistant itself.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(ASSISTANT_SPEAKER, text)
    }

    /// The role this entry takes in a model conversation.
    pub fn role(&self) -> Role {
        if self.speaker == ASSISTANT_SPEAKER {
            Role::Assistant
        } else {
            Role::User
        }
    }

    pub fn to_message(&self) -> Message {
        Message {
            role: self.role(),
            content: self.text.clone(),
        }
    }
}

/// Map platform history to role-tagged messages, preserving order.
pub fn history_to_messages(history: &[HistoryEntry]) -> Vec<Message> {
    history.iter().map(HistoryEntry::to_message).collect()
}
