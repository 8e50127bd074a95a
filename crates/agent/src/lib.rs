//! The response pipeline: the heart of ThreadSage.
//!
//! Every inbound message goes through one **classify → act** step:
//!
//! 1. **Map** the caller's thread history to role-tagged messages
//! 2. **Classify** the new input into one of three intents via the model
//! 3. **Dispatch** to the matching strategy:
//!    - `can_be_answered` → answer from the conversation alone
//!    - `knowledge_retrieval` → answer from the knowledge store
//!    - `additional_useful_data` → append the input to the knowledge store
//! 4. **Return** the strategy's text; unknown labels get a fixed fallback and
//!    failures get a fixed apology, so callers always have something to post.

pub mod classifier;
pub mod pipeline;
pub mod strategies;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use classifier::IntentClassifier;
pub use pipeline::{APOLOGY_RESPONSE, FALLBACK_RESPONSE, Pipeline, Reply};
pub use strategies::{DirectAnswer, LearnAndAcknowledge, RetrievalAnswer};
