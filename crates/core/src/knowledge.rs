//! Knowledge store trait: the append-only corpus behind retrieval.
//!
//! The store has no record identity: it is a text log that is appended one
//! line at a time and read back whole.

use async_trait::async_trait;

use crate::error::StoreError;

#[async_trait]
pub trait KnowledgeStore: Send + Sync {
    /// The backend name (e.g., "file", "memory").
    fn name(&self) -> &str;

    /// Read the full corpus. A store that does not exist yet is empty.
    async fn load(&self) -> std::result::Result<String, StoreError>;

    /// Append one record, newline-terminated. Creates the store if absent.
    async fn append(&self, record: &str) -> std::result::Result<(), StoreError>;
}
