//! DirectAnswer: answers from the conversation alone.

use std::sync::Arc;
use threadsage_core::message::Message;
use threadsage_core::provider::{Provider, ProviderRequest};

pub struct DirectAnswer {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl DirectAnswer {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn build_messages(user_input: &str, history: &[Message]) -> Vec<Message> {
        let mut messages = history.to_vec();
        messages.push(Message::user(format!("New user Input:{user_input}")));
        messages
    }

    /// One model call; the reply content is returned verbatim.
    pub async fn answer(
        &self,
        user_input: &str,
        history: &[Message],
    ) -> threadsage_core::Result<String> {
        let request = ProviderRequest::new(&self.model, Self::build_messages(user_input, history))
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let response = self.provider.complete(request).await?;
        Ok(response.message.content)
    }
}
