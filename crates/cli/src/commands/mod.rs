pub mod chat;
pub mod knowledge;
pub mod learn;
pub mod serve;
pub mod status;

use std::sync::Arc;
use threadsage_agent::Pipeline;
use threadsage_config::AppConfig;
use threadsage_knowledge::FileKnowledgeStore;

pub(crate) fn load_config() -> Result<AppConfig, Box<dyn std::error::Error>> {
    Ok(AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?)
}

/// Build the full pipeline against the configured file store.
pub(crate) fn build_pipeline(config: &AppConfig) -> Result<Pipeline, Box<dyn std::error::Error>> {
    let providers = threadsage_providers::build_from_config(config)?;
    let store = Arc::new(FileKnowledgeStore::new(config.knowledge_path()));
    Ok(Pipeline::from_config(config, &providers, store))
}
