//! Language model provider implementations for ThreadSage.
//!
//! All providers implement the `threadsage_core::Provider` trait.
//! The router builds the chat and embedding providers from configuration,
//! each wrapped in a bounded retry.

pub mod openai_compat;
pub mod retry;
pub mod router;

pub use openai_compat::{AuthStyle, OpenAiCompatProvider};
pub use retry::{RetryPolicy, RetryProvider};
pub use router::{ProviderSet, build_from_config};
