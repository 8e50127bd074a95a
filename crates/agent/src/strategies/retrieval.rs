//! RetrievalAnswer: answers from the knowledge store.
//!
//! The whole store is loaded and indexed on every call, so facts learned a
//! moment ago are immediately retrievable. Rebuild cost grows with the corpus.

use std::sync::Arc;
use threadsage_core::knowledge::KnowledgeStore;
use threadsage_knowledge::IndexBuilder;
use tracing::debug;

pub struct RetrievalAnswer {
    store: Arc<dyn KnowledgeStore>,
    index_builder: Arc<dyn IndexBuilder>,
}

impl RetrievalAnswer {
    pub fn new(store: Arc<dyn KnowledgeStore>, index_builder: Arc<dyn IndexBuilder>) -> Self {
        Self {
            store,
            index_builder,
        }
    }

    pub async fn retrieve(&self, query: &str) -> threadsage_core::Result<String> {
        let corpus = self.store.load().await?;
        debug!(
            store = %self.store.name(),
            index = %self.index_builder.name(),
            bytes = corpus.len(),
            "Building retrieval index"
        );

        let index = self.index_builder.build(&corpus).await?;
        index.query(query).await
    }
}
