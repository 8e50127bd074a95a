//! In-memory knowledge store: useful for testing and dry runs.

use async_trait::async_trait;
use threadsage_core::error::StoreError;
use threadsage_core::knowledge::KnowledgeStore;
use tokio::sync::RwLock;

/// A knowledge store that keeps the corpus in a String.
#[derive(Default)]
pub struct InMemoryKnowledgeStore {
    content: RwLock<String>,
}

impl InMemoryKnowledgeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from an existing corpus.
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: RwLock::new(content.into()),
        }
    }
}

#[async_trait]
impl KnowledgeStore for InMemoryKnowledgeStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn load(&self) -> Result<String, StoreError> {
        Ok(self.content.read().await.clone())
    }

    async fn append(&self, record: &str) -> Result<(), StoreError> {
        let mut content = self.content.write().await;
        content.push_str(record);
        content.push('\n');
        Ok(())
    }
}
