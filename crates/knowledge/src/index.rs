//! Retrieval index: ranks corpus chunks against a query and asks the model
//! to answer from the best ones.
//!
//! An index is built fresh from the full corpus for every retrieval; nothing
//! is cached between calls.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use threadsage_core::error::{Error, StoreError};
use threadsage_core::message::Message;
use threadsage_core::provider::{EmbeddingRequest, Provider, ProviderRequest};
use tracing::debug;

use crate::chunk::chunk_lines;
use crate::vector::top_k_by_similarity;

/// Instruction for grounded answers.
pub const SYNTHESIS_SYSTEM_PROMPT: &str = "You answer questions using only the context \
information provided with each query, not prior knowledge. If the context does not \
contain the answer, say that you don't know.";

/// A queryable index over one corpus.
#[async_trait]
pub trait RetrievalIndex: Send + Sync {
    /// Answer a query from the indexed corpus.
    async fn query(&self, text: &str) -> threadsage_core::Result<String>;
}

/// Builds a `RetrievalIndex` from a corpus.
#[async_trait]
pub trait IndexBuilder: Send + Sync {
    fn name(&self) -> &str;

    async fn build(&self, corpus: &str) -> threadsage_core::Result<Box<dyn RetrievalIndex>>;
}

/// Turns retrieved passages plus a query into one grounded answer.
#[derive(Clone)]
pub struct Synthesizer {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
}

impl Synthesizer {
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

    /// The user message carrying the context block and the query.
    pub fn prompt(passages: &[&str], query: &str) -> String {
        format!(
            "Context information is below.\n\
             ---------------------\n\
             {}\n\
             ---------------------\n\
             Given the context information and not prior knowledge, answer the query.\n\
             Query: {}\n\
             Answer:",
            passages.join("\n\n"),
            query
        )
    }

    pub async fn synthesize(
        &self,
        passages: &[&str],
        query: &str,
    ) -> threadsage_core::Result<String> {
        let messages = vec![
            Message::system(SYNTHESIS_SYSTEM_PROMPT),
            Message::user(Self::prompt(passages, query)),
        ];
        let request = ProviderRequest::new(&self.model, messages)
            .with_temperature(self.temperature)
            .with_max_tokens(self.max_tokens);

        let response = self.provider.complete(request).await?;
        Ok(response.message.content)
    }
}

// --- Vector index ---

/// Builds embedding-backed indexes: chunks are embedded once per build and
/// ranked by cosine similarity against the embedded query.
pub struct VectorIndexBuilder {
    embedder: Arc<dyn Provider>,
    embedding_model: String,
    synthesizer: Synthesizer,
    chunk_chars: usize,
    top_k: usize,
}

impl VectorIndexBuilder {
    pub fn new(
        embedder: Arc<dyn Provider>,
        embedding_model: impl Into<String>,
        synthesizer: Synthesizer,
    ) -> Self {
        Self {
            embedder,
            embedding_model: embedding_model.into(),
            synthesizer,
            chunk_chars: 1024,
            top_k: 2,
        }
    }

    pub fn with_chunk_chars(mut self, chunk_chars: usize) -> Self {
        self.chunk_chars = chunk_chars.max(1);
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }

    async fn embed(&self, inputs: Vec<String>) -> threadsage_core::Result<Vec<Vec<f32>>> {
        let expected = inputs.len();
        let response = self
            .embedder
            .embed(EmbeddingRequest {
                model: self.embedding_model.clone(),
                inputs,
            })
            .await?;

        if response.embeddings.len() != expected {
            return Err(StoreError::Index(format!(
                "expected {expected} embeddings, got {}",
                response.embeddings.len()
            ))
            .into());
        }
        Ok(response.embeddings)
    }
}

#[async_trait]
impl IndexBuilder for VectorIndexBuilder {
    fn name(&self) -> &str {
        "vector"
    }

    async fn build(&self, corpus: &str) -> threadsage_core::Result<Box<dyn RetrievalIndex>> {
        let chunks = chunk_lines(corpus, self.chunk_chars);
        let embeddings = if chunks.is_empty() {
            Vec::new()
        } else {
            self.embed(chunks.clone()).await?
        };

        debug!(chunks = chunks.len(), model = %self.embedding_model, "Vector index built");

        Ok(Box::new(VectorIndex {
            chunks,
            embeddings,
            embedder: self.embedder.clone(),
            embedding_model: self.embedding_model.clone(),
            synthesizer: self.synthesizer.clone(),
            top_k: self.top_k,
        }))
    }
}

struct VectorIndex {
    chunks: Vec<String>,
    embeddings: Vec<Vec<f32>>,
    embedder: Arc<dyn Provider>,
    embedding_model: String,
    synthesizer: Synthesizer,
    top_k: usize,
}

#[async_trait]
impl RetrievalIndex for VectorIndex {
    async fn query(&self, text: &str) -> threadsage_core::Result<String> {
        if self.chunks.is_empty() {
            return self.synthesizer.synthesize(&[], text).await;
        }

        let response = self
            .embedder
            .embed(EmbeddingRequest {
                model: self.embedding_model.clone(),
                inputs: vec![text.to_string()],
            })
            .await?;
        let query_embedding = response
            .embeddings
            .into_iter()
            .next()
            .ok_or_else(|| Error::from(StoreError::Index("no embedding for query".into())))?;

        let ranked = top_k_by_similarity(&self.embeddings, &query_embedding, self.top_k);
        debug!(
            candidates = self.chunks.len(),
            selected = ranked.len(),
            best_score = ranked.first().map(|(_, s)| *s).unwrap_or(0.0),
            "Vector retrieval"
        );

        let passages: Vec<&str> = ranked
            .iter()
            .map(|(i, _)| self.chunks[*i].as_str())
            .collect();
        self.synthesizer.synthesize(&passages, text).await
    }
}

// --- Keyword index ---

/// Builds indexes that rank chunks by shared words with the query.
/// Used when no embedding provider is configured.
pub struct KeywordIndexBuilder {
    synthesizer: Synthesizer,
    chunk_chars: usize,
    top_k: usize,
}

impl KeywordIndexBuilder {
    pub fn new(synthesizer: Synthesizer) -> Self {
        Self {
            synthesizer,
            chunk_chars: 1024,
            top_k: 2,
        }
    }

    pub fn with_chunk_chars(mut self, chunk_chars: usize) -> Self {
        self.chunk_chars = chunk_chars.max(1);
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k.max(1);
        self
    }
}

#[async_trait]
impl IndexBuilder for KeywordIndexBuilder {
    fn name(&self) -> &str {
        "keyword"
    }

    async fn build(&self, corpus: &str) -> threadsage_core::Result<Box<dyn RetrievalIndex>> {
        let chunks = chunk_lines(corpus, self.chunk_chars);
        let tokens = chunks.iter().map(|c| tokenize(c)).collect();
        Ok(Box::new(KeywordIndex {
            chunks,
            tokens,
            synthesizer: self.synthesizer.clone(),
            top_k: self.top_k,
        }))
    }
}

struct KeywordIndex {
    chunks: Vec<String>,
    tokens: Vec<HashSet<String>>,
    synthesizer: Synthesizer,
    top_k: usize,
}

#[async_trait]
impl RetrievalIndex for KeywordIndex {
    async fn query(&self, text: &str) -> threadsage_core::Result<String> {
        let query_tokens = tokenize(text);

        let mut scored: Vec<(usize, usize)> = self
            .tokens
            .iter()
            .enumerate()
            .map(|(i, chunk_tokens)| (i, chunk_tokens.intersection(&query_tokens).count()))
            .collect();
        // Stable: equal scores keep corpus order
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.truncate(self.top_k);

        debug!(
            candidates = self.chunks.len(),
            selected = scored.len(),
            "Keyword retrieval"
        );

        let passages: Vec<&str> = scored
            .iter()
            .map(|(i, _)| self.chunks[*i].as_str())
            .collect();
        self.synthesizer.synthesize(&passages, text).await
    }
}

/// Lowercase alphanumeric word tokens.
fn tokenize(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use threadsage_core::error::ProviderError;
    use threadsage_core::provider::{EmbeddingResponse, ProviderResponse};

    const VOCAB: [&str; 4] = ["rust", "slack", "coffee", "lisbon"];

    /// Embeds text as word counts over a tiny vocabulary and echoes the
    /// synthesis prompt back as the answer.
    #[derive(Default)]
    struct StubProvider {
        embed_calls: Mutex<Vec<Vec<String>>>,
        complete_calls: Mutex<Vec<ProviderRequest>>,
    }

    impl StubProvider {
        fn embed_calls(&self) -> usize {
            self.embed_calls.lock().unwrap().len()
        }

        fn last_prompt(&self) -> String {
            let calls = self.complete_calls.lock().unwrap();
            calls.last().unwrap().messages[1].content.clone()
        }
    }

    #[async_trait]
    impl Provider for StubProvider {
        fn name(&self) -> &str {
            "stub"
        }

        async fn complete(&self, request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
            let content = request.messages[1].content.clone();
            self.complete_calls.lock().unwrap().push(request);
            Ok(ProviderResponse {
                message: Message::assistant(content),
                usage: None,
                model: "stub".into(),
            })
        }

        async fn embed(
            &self,
            request: EmbeddingRequest,
        ) -> Result<EmbeddingResponse, ProviderError> {
            self.embed_calls.lock().unwrap().push(request.inputs.clone());
            let embeddings = request
                .inputs
                .iter()
                .map(|text| {
                    let tokens = tokenize(text);
                    VOCAB
                        .iter()
                        .map(|w| if tokens.contains(*w) { 1.0 } else { 0.0 })
                        .collect()
                })
                .collect();
            Ok(EmbeddingResponse {
                embeddings,
                model: request.model,
                usage: None,
            })
        }
    }

    const CORPUS: &str = "Learned: the team writes Rust\n\
                          Learned: standup happens in Slack\n\
                          Learned: the coffee machine is on floor two\n";

    fn vector_builder(stub: Arc<StubProvider>) -> VectorIndexBuilder {
        let synthesizer = Synthesizer::new(stub.clone(), "chat-model");
        VectorIndexBuilder::new(stub, "embed-model", synthesizer)
            .with_chunk_chars(40)
            .with_top_k(1)
    }

    #[test]
    fn prompt_contains_context_and_query() {
        let prompt = Synthesizer::prompt(&["alpha", "beta"], "what?");
        assert!(prompt.contains("alpha\n\nbeta"));
        assert!(prompt.contains("Query: what?"));
    }

    #[test]
    fn tokenize_lowercases_and_splits() {
        let tokens = tokenize("Hello, World! hello-again");
        assert!(tokens.contains("hello"));
        assert!(tokens.contains("world"));
        assert!(tokens.contains("again"));
        assert_eq!(tokens.len(), 3);
    }

    #[tokio::test]
    async fn vector_index_selects_most_similar_chunk() {
        let stub = Arc::new(StubProvider::default());
        let index = vector_builder(stub.clone()).build(CORPUS).await.unwrap();

        let answer = index.query("where is the coffee?").await.unwrap();
        assert!(answer.contains("coffee machine"));
        assert!(!answer.contains("Rust"));
        // One call for the chunks, one for the query
        assert_eq!(stub.embed_calls(), 2);
    }

    #[tokio::test]
    async fn vector_index_embeds_all_chunks_in_one_call() {
        let stub = Arc::new(StubProvider::default());
        vector_builder(stub.clone()).build(CORPUS).await.unwrap();

        let calls = stub.embed_calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].len(), 3);
    }

    #[tokio::test]
    async fn empty_corpus_skips_embedding_and_still_answers() {
        let stub = Arc::new(StubProvider::default());
        let index = vector_builder(stub.clone()).build("").await.unwrap();

        let answer = index.query("anything?").await.unwrap();
        assert!(answer.contains("Query: anything?"));
        assert_eq!(stub.embed_calls(), 0);
        assert_eq!(stub.complete_calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn synthesis_uses_grounding_prompt() {
        let stub = Arc::new(StubProvider::default());
        let index = vector_builder(stub.clone()).build(CORPUS).await.unwrap();
        index.query("slack?").await.unwrap();

        let calls = stub.complete_calls.lock().unwrap();
        assert_eq!(calls[0].model, "chat-model");
        assert_eq!(calls[0].messages[0], Message::system(SYNTHESIS_SYSTEM_PROMPT));
    }

    #[tokio::test]
    async fn embedding_count_mismatch_is_an_index_error() {
        struct ShortEmbedder;

        #[async_trait]
        impl Provider for ShortEmbedder {
            fn name(&self) -> &str {
                "short"
            }
            async fn complete(
                &self,
                _request: ProviderRequest,
            ) -> Result<ProviderResponse, ProviderError> {
                unreachable!()
            }
            async fn embed(
                &self,
                request: EmbeddingRequest,
            ) -> Result<EmbeddingResponse, ProviderError> {
                Ok(EmbeddingResponse {
                    embeddings: vec![vec![1.0]],
                    model: request.model,
                    usage: None,
                })
            }
        }

        let embedder: Arc<dyn Provider> = Arc::new(ShortEmbedder);
        let builder = VectorIndexBuilder::new(
            embedder.clone(),
            "embed",
            Synthesizer::new(embedder, "chat"),
        )
        .with_chunk_chars(10);

        match builder.build("first line\nsecond line\n").await {
            Err(Error::Store(StoreError::Index(_))) => {}
            Err(other) => panic!("Expected index error, got: {other:?}"),
            Ok(_) => panic!("Expected index error"),
        }
    }

    #[tokio::test]
    async fn keyword_index_ranks_by_shared_words() {
        let stub = Arc::new(StubProvider::default());
        let builder = KeywordIndexBuilder::new(Synthesizer::new(stub.clone(), "chat"))
            .with_chunk_chars(40)
            .with_top_k(1);
        let index = builder.build(CORPUS).await.unwrap();

        index.query("Which floor has the COFFEE machine?").await.unwrap();
        let prompt = stub.last_prompt();
        assert!(prompt.contains("coffee machine is on floor two"));
        assert!(!prompt.contains("standup"));
        assert_eq!(stub.embed_calls(), 0);
    }

    #[tokio::test]
    async fn repeated_queries_give_same_answer() {
        let stub = Arc::new(StubProvider::default());
        let builder = vector_builder(stub.clone());

        let first = builder.build(CORPUS).await.unwrap().query("rust?").await.unwrap();
        let second = builder.build(CORPUS).await.unwrap().query("rust?").await.unwrap();
        assert_eq!(first, second);
    }
}
