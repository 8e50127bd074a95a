//! Channel dispatch: turns inbound channel messages into pipeline runs and
//! posts the replies back.
//!
//! Each message is handled in its own task. Platform failures (reactions,
//! history, delivery) are logged and never stop the handler or the loop.

use std::sync::Arc;
use threadsage_agent::Pipeline;
use threadsage_core::channel::{Channel, ChannelMessage, MessageKind};
use threadsage_core::error::ChannelError;
use threadsage_core::message::HistoryEntry;
use tokio::sync::mpsc;
use tracing::{error, info, warn};

/// Reactions shown on a message while it is being answered.
#[derive(Debug, Clone)]
pub struct Reactions {
    pub mention: String,
    pub thread: String,
}

impl Default for Reactions {
    fn default() -> Self {
        Self {
            mention: "tada".into(),
            thread: "eyes".into(),
        }
    }
}

impl Reactions {
    pub fn from_config(config: &threadsage_config::SlackAppConfig) -> Self {
        Self {
            mention: config.mention_reaction.clone(),
            thread: config.thread_reaction.clone(),
        }
    }

    fn for_kind(&self, kind: MessageKind) -> Option<&str> {
        match kind {
            MessageKind::Mention => Some(self.mention.as_str()),
            MessageKind::ThreadReply => Some(self.thread.as_str()),
            MessageKind::Direct => None,
        }
    }
}

/// Consume a channel's inbound messages until the channel closes.
pub async fn run_dispatch(
    channel: Arc<dyn Channel>,
    mut rx: mpsc::Receiver<Result<ChannelMessage, ChannelError>>,
    pipeline: Arc<Pipeline>,
    reactions: Reactions,
) {
    info!(channel = %channel.name(), "Dispatch loop started");

    while let Some(item) = rx.recv().await {
        match item {
            Ok(msg) => {
                let channel = channel.clone();
                let pipeline = pipeline.clone();
                let reactions = reactions.clone();
                tokio::spawn(async move {
                    handle_message(channel.as_ref(), &pipeline, &reactions, msg).await;
                });
            }
            Err(e) => error!(channel = %channel.name(), error = %e, "Channel error"),
        }
    }

    info!(channel = %channel.name(), "Dispatch loop stopped");
}

/// Answer one inbound message in place.
pub async fn handle_message(
    channel: &dyn Channel,
    pipeline: &Pipeline,
    reactions: &Reactions,
    msg: ChannelMessage,
) {
    if !channel.is_allowed(&msg.sender_id) {
        warn!(channel = %channel.name(), sender = %msg.sender_id, "Sender not allowed, ignoring");
        return;
    }

    info!(
        channel = %channel.name(),
        chat_id = %msg.chat_id,
        kind = ?msg.kind,
        "Handling message"
    );

    let reaction = reactions.for_kind(msg.kind);
    if let Some(reaction) = reaction {
        if let Err(e) = channel
            .add_reaction(&msg.chat_id, &msg.message_id, reaction)
            .await
        {
            error!(error = %e, reaction = %reaction, "Failed to add reaction");
        }
    }

    let history = match (msg.kind, msg.thread_id.as_deref()) {
        (MessageKind::ThreadReply, Some(thread_id)) => {
            fetch_history(channel, &msg.chat_id, thread_id).await
        }
        _ => Vec::new(),
    };

    let response = pipeline.respond(&msg.content, &history).await;

    if let Err(e) = channel
        .send(&msg.chat_id, &response, Some(msg.reply_thread()))
        .await
    {
        error!(error = %e, chat_id = %msg.chat_id, "Failed to post response");
    }

    if let Some(reaction) = reaction {
        if let Err(e) = channel
            .remove_reaction(&msg.chat_id, &msg.message_id, reaction)
            .await
        {
            error!(error = %e, reaction = %reaction, "Failed to remove reaction");
        }
    }
}

async fn fetch_history(channel: &dyn Channel, chat_id: &str, thread_id: &str) -> Vec<HistoryEntry> {
    match channel.thread_history(chat_id, thread_id).await {
        Ok(history) => history,
        Err(e) => {
            error!(error = %e, thread = %thread_id, "Failed to fetch thread history");
            Vec::new()
        }
    }
}
