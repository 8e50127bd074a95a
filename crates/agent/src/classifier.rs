//! Intent classifier: asks the model which strategy fits the new input.
//!
//! The classifier returns the model's raw label. Validation into an `Intent`
//! happens in the pipeline, which owns the fallback for unknown labels.

use std::sync::Arc;
use threadsage_core::message::Message;
use threadsage_core::provider::{Provider, ProviderRequest};
use tracing::debug;

/// Instruction that defines the three categories and asks for a bare label.
pub const CLASSIFIER_SYSTEM_PROMPT: &str = "\
You are the decision-making core of an assistant. Your goal is to pick the best next action \
based on the user's input and the chat history so far.
Output exactly one of the following category labels, and nothing else:

- can_be_answered: the input can be answered from this conversation alone, without looking \
anything up.
- knowledge_retrieval: answering the input needs knowledge from outside this chat history.
- additional_useful_data: the input carries information that should be saved so it can be \
used in the future.";

pub struct IntentClassifier {
    provider: Arc<dyn Provider>,
    model: String,
}

impl IntentClassifier {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
        }
    }

    /// System instruction, then the history, then the new input.
    pub fn build_messages(user_input: &str, history: &[Message]) -> Vec<Message> {
        let mut messages = Vec::with_capacity(history.len() + 2);
        messages.push(Message::system(CLASSIFIER_SYSTEM_PROMPT));
        messages.extend_from_slice(history);
        messages.push(Message::user(format!("NEW USER INPUT: {user_input}")));
        messages
    }

    /// Classify the input. Returns the trimmed raw label.
    pub async fn classify(
        &self,
        user_input: &str,
        history: &[Message],
    ) -> threadsage_core::Result<String> {
        let request = ProviderRequest::new(&self.model, Self::build_messages(user_input, history))
            .with_temperature(0.0);

        let response = self.provider.complete(request).await?;
        let label = response.message.content.trim().to_string();

        debug!(label = %label, "Classifier decision");
        Ok(label)
    }
}
