//! LearnAndAcknowledge: saves the input to the knowledge store.

use std::sync::Arc;
use threadsage_core::knowledge::KnowledgeStore;
use tracing::info;

pub struct LearnAndAcknowledge {
    store: Arc<dyn KnowledgeStore>,
}

impl LearnAndAcknowledge {
    pub fn new(store: Arc<dyn KnowledgeStore>) -> Self {
        Self { store }
    }

    /// Append `Learned: {input}` and acknowledge. No validation or dedup.
    pub async fn learn(&self, user_input: &str) -> threadsage_core::Result<String> {
        self.store.append(&format!("Learned: {user_input}")).await?;
        info!(store = %self.store.name(), chars = user_input.chars().count(), "Learned new information");
        Ok(format!("I've learned: {user_input}"))
    }
}
