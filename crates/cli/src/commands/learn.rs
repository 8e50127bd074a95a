//! `threadsage learn`: Append a fact without going through the classifier.

use std::sync::Arc;
use threadsage_agent::LearnAndAcknowledge;
use threadsage_knowledge::FileKnowledgeStore;
use tracing::info;

pub async fn run(text: String) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config()?;

    // No model call is involved, so no provider is built.
    let store = Arc::new(FileKnowledgeStore::new(config.knowledge_path()));
    let learner = LearnAndAcknowledge::new(store);

    let ack = learner.learn(&text).await?;
    info!(path = %config.knowledge_path().display(), chars = text.len(), "Fact appended");
    println!("{ack}");

    Ok(())
}
