//! Slack Events API payloads.
//!
//! Only the fields ThreadSage reads are modelled; everything else in the
//! payload is ignored.

use serde::{Deserialize, Serialize};
use threadsage_core::error::ChannelError;

/// Top-level body POSTed to the events endpoint.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventEnvelope {
    /// Sent once when the endpoint URL is registered.
    UrlVerification { challenge: String },

    EventCallback {
        #[serde(default)]
        event_id: Option<String>,
        event: SlackEvent,
    },

    #[serde(other)]
    Unsupported,
}

impl EventEnvelope {
    pub fn parse(body: &[u8]) -> Result<Self, ChannelError> {
        serde_json::from_slice(body).map_err(|e| ChannelError::InvalidPayload(e.to_string()))
    }
}

/// The inner `event` object of an `event_callback`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SlackEvent {
    /// `app_mention`, `message`, ...
    #[serde(rename = "type")]
    pub kind: String,

    #[serde(default)]
    pub subtype: Option<String>,

    #[serde(default)]
    pub user: Option<String>,

    /// Set on messages posted by bots and integrations.
    #[serde(default)]
    pub bot_id: Option<String>,

    #[serde(default)]
    pub text: Option<String>,

    #[serde(default)]
    pub channel: Option<String>,

    #[serde(default)]
    pub ts: Option<String>,

    #[serde(default)]
    pub thread_ts: Option<String>,
}

/// Response to a `url_verification` request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChallengeResponse {
    pub challenge: String,
}

/// A message as returned by `conversations.replies`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ThreadMessage {
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub bot_id: Option<String>,
    #[serde(default)]
    pub text: String,
}

/// Remove every `<@BOT_ID>` mention and trim.
pub fn strip_mention(text: &str, bot_user_id: Option<&str>) -> String {
    match bot_user_id {
        Some(id) if !id.is_empty() => text.replace(&format!("<@{id}>"), "").trim().to_string(),
        _ => text.trim().to_string(),
    }
}
