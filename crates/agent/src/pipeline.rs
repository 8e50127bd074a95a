//! Pipeline coordinator: classify, dispatch, and always produce a reply.

use std::sync::Arc;
use threadsage_config::AppConfig;
use threadsage_core::intent::{Classification, Intent};
use threadsage_core::knowledge::KnowledgeStore;
use threadsage_core::message::{HistoryEntry, history_to_messages};
use threadsage_core::provider::Provider;
use threadsage_knowledge::{IndexBuilder, KeywordIndexBuilder, Synthesizer, VectorIndexBuilder};
use threadsage_providers::ProviderSet;
use tracing::{error, info, warn};

use crate::classifier::IntentClassifier;
use crate::strategies::{DirectAnswer, LearnAndAcknowledge, RetrievalAnswer};

/// Returned when the classifier produces a label outside the known set.
pub const FALLBACK_RESPONSE: &str =
    "I'm not sure how to respond to that. Can you please rephrase your question?";

/// Returned when a strategy fails (model unreachable, store unreadable).
pub const APOLOGY_RESPONSE: &str =
    "Sorry, something went wrong while preparing a response. Please try again in a moment.";

/// Characters of the response included in the completion log line.
const PREVIEW_CHARS: usize = 50;

/// One pipeline outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub classification: Classification,
    pub content: String,
}

pub struct Pipeline {
    classifier: IntentClassifier,
    direct: DirectAnswer,
    retrieval: RetrievalAnswer,
    learn: LearnAndAcknowledge,
}

impl Pipeline {
    pub fn new(
        classifier: IntentClassifier,
        direct: DirectAnswer,
        retrieval: RetrievalAnswer,
        learn: LearnAndAcknowledge,
    ) -> Self {
        Self {
            classifier,
            direct,
            retrieval,
            learn,
        }
    }

    /// Wire every component against one chat provider and one store.
    pub fn with_defaults(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        store: Arc<dyn KnowledgeStore>,
        index_builder: Arc<dyn IndexBuilder>,
    ) -> Self {
        let model = model.into();
        Self::new(
            IntentClassifier::new(provider.clone(), &model),
            DirectAnswer::new(provider, &model),
            RetrievalAnswer::new(store.clone(), index_builder),
            LearnAndAcknowledge::new(store),
        )
    }

    /// Build the pipeline from configuration and already-built providers.
    ///
    /// Retrieval uses the vector index when an embedding provider exists,
    /// otherwise the keyword index.
    pub fn from_config(
        config: &AppConfig,
        providers: &ProviderSet,
        store: Arc<dyn KnowledgeStore>,
    ) -> Self {
        let max_tokens = Some(config.default_max_tokens);
        let synthesizer = Synthesizer::new(providers.chat.clone(), &providers.chat_model)
            .with_temperature(config.default_temperature)
            .with_max_tokens(max_tokens);

        let index_builder: Arc<dyn IndexBuilder> = match &providers.embedding {
            Some(embedder) => Arc::new(
                VectorIndexBuilder::new(embedder.clone(), &providers.embedding_model, synthesizer)
                    .with_chunk_chars(config.embedding.chunk_chars)
                    .with_top_k(config.embedding.top_k),
            ),
            None => Arc::new(
                KeywordIndexBuilder::new(synthesizer)
                    .with_chunk_chars(config.embedding.chunk_chars)
                    .with_top_k(config.embedding.top_k),
            ),
        };

        info!(index = %index_builder.name(), store = %store.name(), "Pipeline ready");

        Self::new(
            IntentClassifier::new(providers.chat.clone(), &providers.chat_model),
            DirectAnswer::new(providers.chat.clone(), &providers.chat_model)
                .with_temperature(config.default_temperature)
                .with_max_tokens(max_tokens),
            RetrievalAnswer::new(store.clone(), index_builder),
            LearnAndAcknowledge::new(store),
        )
    }

    /// Direct access to the learn strategy, bypassing classification.
    pub fn learner(&self) -> &LearnAndAcknowledge {
        &self.learn
    }

    /// Run the pipeline and surface any failure to the caller.
    ///
    /// Unknown classifier labels are not failures; they produce the fallback.
    pub async fn try_respond(
        &self,
        user_input: &str,
        history: &[HistoryEntry],
    ) -> threadsage_core::Result<Reply> {
        let messages = history_to_messages(history);

        let raw = self.classifier.classify(user_input, &messages).await?;
        let classification = Classification::parse(&raw);

        let content = match &classification {
            Classification::Recognized(Intent::CanBeAnswered) => {
                self.direct.answer(user_input, &messages).await?
            }
            Classification::Recognized(Intent::KnowledgeRetrieval) => {
                self.retrieval.retrieve(user_input).await?
            }
            Classification::Recognized(Intent::AdditionalUsefulData) => {
                self.learn.learn(user_input).await?
            }
            Classification::Unrecognized(raw) => {
                warn!(raw = %raw, "Unexpected classifier output");
                FALLBACK_RESPONSE.to_string()
            }
        };

        info!(
            category = %classification.label(),
            history = history.len(),
            preview = %preview(&content),
            "Response generated"
        );

        Ok(Reply {
            classification,
            content,
        })
    }

    /// Run the pipeline; never fails. Errors become the apology text.
    pub async fn respond(&self, user_input: &str, history: &[HistoryEntry]) -> String {
        match self.try_respond(user_input, history).await {
            Ok(reply) => reply.content,
            Err(e) => {
                error!(error = %e, "Failed to prepare response");
                APOLOGY_RESPONSE.to_string()
            }
        }
    }
}

fn preview(content: &str) -> String {
    content.chars().take(PREVIEW_CHARS).collect()
}
