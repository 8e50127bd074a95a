//! # ThreadSage Core
//!
//! Domain types, traits, and error definitions for the ThreadSage assistant.
//! This crate has **no framework dependencies**: it defines the domain model
//! that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (language model, knowledge store, chat
//! platform) is a trait here. Implementations live in their respective
//! crates and are injected explicitly, which keeps the pipeline testable
//! with stub implementations.

pub mod channel;
pub mod error;
pub mod intent;
pub mod knowledge;
pub mod message;
pub mod provider;

// Re-export key types at crate root for ergonomics
pub use channel::{Channel, ChannelId, ChannelMessage, MessageKind};
pub use error::{Error, Result};
pub use intent::{Classification, Intent};
pub use knowledge::KnowledgeStore;
pub use message::{HistoryEntry, Message, Role, history_to_messages};
pub use provider::{Provider, ProviderRequest, ProviderResponse};
