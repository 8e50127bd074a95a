//! Test doubles shared by the gateway tests.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use threadsage_agent::Pipeline;
use threadsage_core::channel::{Channel, ChannelId, ChannelMessage};
use threadsage_core::error::{ChannelError, ProviderError};
use threadsage_core::message::{HistoryEntry, Message};
use threadsage_core::provider::{Provider, ProviderRequest, ProviderResponse};
use threadsage_knowledge::{InMemoryKnowledgeStore, KeywordIndexBuilder, Synthesizer};
use tokio::sync::mpsc;

/// Returns scripted replies in order and records every request.
pub struct ScriptedProvider {
    replies: Mutex<Vec<String>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn request(&self, n: usize) -> ProviderRequest {
        self.requests.lock().unwrap()[n].clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let mut requests = self.requests.lock().unwrap();
        let replies = self.replies.lock().unwrap();
        let reply = replies.get(requests.len()).cloned().unwrap_or_else(|| {
            panic!("ScriptedProvider: no reply for call #{}", requests.len())
        });
        requests.push(request);
        Ok(ProviderResponse {
            message: Message::assistant(reply),
            usage: None,
            model: "scripted".into(),
        })
    }
}

/// A pipeline over a scripted provider and an empty in-memory store.
pub fn scripted_pipeline(replies: &[&str]) -> (Pipeline, Arc<ScriptedProvider>) {
    let provider = Arc::new(ScriptedProvider::new(replies));
    let pipeline = Pipeline::with_defaults(
        provider.clone(),
        "gpt-test",
        Arc::new(InMemoryKnowledgeStore::new()),
        Arc::new(KeywordIndexBuilder::new(Synthesizer::new(
            provider.clone(),
            "gpt-test",
        ))),
    );
    (pipeline, provider)
}

/// A channel that records every outbound call as a line of text.
pub struct RecordingChannel {
    id: ChannelId,
    calls: Mutex<Vec<String>>,
    history: Vec<HistoryEntry>,
    fail: bool,
    allow: bool,
}

impl RecordingChannel {
    pub fn new() -> Self {
        Self {
            id: ChannelId("recording".into()),
            calls: Mutex::new(Vec::new()),
            history: Vec::new(),
            fail: false,
            allow: true,
        }
    }

    pub fn with_history(mut self, history: Vec<HistoryEntry>) -> Self {
        self.history = history;
        self
    }

    /// Every platform call fails after being recorded.
    pub fn failing(mut self) -> Self {
        self.fail = true;
        self
    }

    pub fn deny_all(mut self) -> Self {
        self.allow = false;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: String) -> Result<(), ChannelError> {
        self.calls.lock().unwrap().push(call);
        if self.fail {
            Err(ChannelError::ApiCall {
                method: "test".into(),
                reason: "ratelimited".into(),
            })
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl Channel for RecordingChannel {
    fn name(&self) -> &str {
        "recording"
    }

    fn id(&self) -> &ChannelId {
        &self.id
    }

    async fn start(
        &self,
    ) -> Result<mpsc::Receiver<Result<ChannelMessage, ChannelError>>, ChannelError> {
        let (_tx, rx) = mpsc::channel(1);
        Ok(rx)
    }

    async fn send(
        &self,
        chat_id: &str,
        content: &str,
        thread_id: Option<&str>,
    ) -> Result<(), ChannelError> {
        self.record(format!(
            "send {chat_id} {} {content}",
            thread_id.unwrap_or("-")
        ))
    }

    async fn add_reaction(
        &self,
        chat_id: &str,
        message_id: &str,
        reaction: &str,
    ) -> Result<(), ChannelError> {
        self.record(format!("add_reaction {chat_id} {message_id} {reaction}"))
    }

    async fn remove_reaction(
        &self,
        chat_id: &str,
        message_id: &str,
        reaction: &str,
    ) -> Result<(), ChannelError> {
        self.record(format!("remove_reaction {chat_id} {message_id} {reaction}"))
    }

    async fn thread_history(
        &self,
        chat_id: &str,
        thread_id: &str,
    ) -> Result<Vec<HistoryEntry>, ChannelError> {
        self.record(format!("thread_history {chat_id} {thread_id}"))?;
        Ok(self.history.clone())
    }

    fn is_allowed(&self, _sender_id: &str) -> bool {
        self.allow
    }
}
