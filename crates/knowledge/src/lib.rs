//! Knowledge store and retrieval index implementations for ThreadSage.

pub mod chunk;
pub mod file;
pub mod in_memory;
pub mod index;
pub mod vector;

pub use chunk::chunk_lines;
pub use file::FileKnowledgeStore;
pub use in_memory::InMemoryKnowledgeStore;
pub use index::{
    IndexBuilder, KeywordIndexBuilder, RetrievalIndex, Synthesizer, VectorIndexBuilder,
};
pub use vector::{cosine_similarity, top_k_by_similarity};
