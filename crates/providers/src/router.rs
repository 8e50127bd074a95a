//! Provider router: builds the chat and embedding providers from config.
//!
//! Every provider handed out here is wrapped in a `RetryProvider` using the
//! configured retry policy.

use std::sync::Arc;
use threadsage_config::AppConfig;
use threadsage_core::error::ProviderError;
use threadsage_core::provider::Provider;
use tracing::info;

use crate::openai_compat::OpenAiCompatProvider;
use crate::retry::{RetryPolicy, RetryProvider};

/// The providers and model names the assistant talks to.
#[derive(Clone)]
pub struct ProviderSet {
    /// Used for classification, direct answers and synthesis.
    pub chat: Arc<dyn Provider>,
    pub chat_model: String,

    /// `None` when embeddings are disabled and retrieval ranks by keywords.
    pub embedding: Option<Arc<dyn Provider>>,
    pub embedding_model: String,
}

/// Build providers from configuration.
pub fn build_from_config(config: &AppConfig) -> Result<ProviderSet, ProviderError> {
    let policy = RetryPolicy::from_config(&config.retry);

    let chat_base = build_provider(config, &config.default_provider)?;
    let chat: Arc<dyn Provider> = Arc::new(RetryProvider::new(chat_base.clone(), policy.clone()));

    let embedding: Option<Arc<dyn Provider>> = if config.embedding.is_disabled() {
        None
    } else {
        let base = match config.embedding.provider.as_str() {
            "default" => chat_base,
            name => build_provider(config, name)?,
        };
        Some(Arc::new(RetryProvider::new(base, policy)))
    };

    let embedding_model = embedding_model_for(config);

    info!(
        provider = %config.default_provider,
        model = %config.chat_model(),
        embeddings = embedding.is_some(),
        "Providers configured"
    );

    Ok(ProviderSet {
        chat,
        chat_model: config.chat_model().to_string(),
        embedding,
        embedding_model,
    })
}

/// Build a single, unwrapped provider by name.
pub fn build_provider(
    config: &AppConfig,
    name: &str,
) -> Result<Arc<dyn Provider>, ProviderError> {
    let provider_config = config.providers.get(name);

    let api_key = provider_config
        .and_then(|p| p.api_key.clone())
        .or_else(|| config.api_key.clone())
        .unwrap_or_default();

    if name == "azure" {
        let endpoint = provider_config
            .and_then(|p| p.api_url.clone())
            .or_else(|| config.azure.endpoint.clone())
            .ok_or_else(|| {
                ProviderError::NotConfigured(
                    "Azure provider needs an endpoint (set AZURE_OPENAI_ENDPOINT)".into(),
                )
            })?;
        return Ok(Arc::new(OpenAiCompatProvider::azure(
            endpoint,
            api_key,
            &config.azure.api_version,
        )));
    }

    let base_url = provider_config
        .and_then(|p| p.api_url.clone())
        .map(Ok)
        .unwrap_or_else(|| default_base_url(name))?;

    Ok(Arc::new(OpenAiCompatProvider::new(name, base_url, api_key)))
}

/// Embedding model name; Azure addresses it by deployment.
fn embedding_model_for(config: &AppConfig) -> String {
    let provider = match config.embedding.provider.as_str() {
        "default" => config.default_provider.as_str(),
        other => other,
    };
    if provider == "azure" {
        if let Some(deployment) = &config.azure.embedding_deployment {
            return deployment.clone();
        }
    }
    config.embedding.model.clone()
}

/// Get the default base URL for well-known providers.
fn default_base_url(provider_name: &str) -> Result<String, ProviderError> {
    let url = match provider_name {
        "openai" => "https://api.openai.com/v1",
        "openrouter" => "https://openrouter.ai/api/v1",
        "ollama" => "http://localhost:11434/v1",
        "groq" => "https://api.groq.com/openai/v1",
        "together" => "https://api.together.xyz/v1",
        "vllm" => "http://localhost:8000/v1",
        "llamacpp" | "llama.cpp" => "http://localhost:8080/v1",
        other => {
            return Err(ProviderError::NotConfigured(format!(
                "Unknown provider '{other}': set providers.{other}.api_url"
            )));
        }
    };
    Ok(url.into())
}
