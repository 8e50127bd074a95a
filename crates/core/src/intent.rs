//! Intent categories produced by the classifier.
//!
//! The classifier is a general-purpose language model, so its output is free
//! text. `Classification::parse` is the single place where that text is
//! checked against the closed set of categories.

use serde::{Deserialize, Serialize};

/// The three response strategies a message can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    /// Answerable from the conversation alone.
    CanBeAnswered,
    /// Needs facts from the knowledge store.
    KnowledgeRetrieval,
    /// Carries information worth saving for later.
    AdditionalUsefulData,
}

impl Intent {
    pub const ALL: [Intent; 3] = [
        Intent::CanBeAnswered,
        Intent::KnowledgeRetrieval,
        Intent::AdditionalUsefulData,
    ];

    /// The exact label the classifier is asked to emit.
    pub fn label(&self) -> &'static str {
        match self {
            Intent::CanBeAnswered => "can_be_answered",
            Intent::KnowledgeRetrieval => "knowledge_retrieval",
            Intent::AdditionalUsefulData => "additional_useful_data",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of validating raw classifier output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Recognized(Intent),
    /// Anything outside the closed set, kept verbatim for logging.
    Unrecognized(String),
}

impl Classification {
    /// Validate a raw label. Matching is exact and case-sensitive.
    pub fn parse(raw: &str) -> Self {
        Intent::ALL
            .into_iter()
            .find(|intent| intent.label() == raw)
            .map(Classification::Recognized)
            .unwrap_or_else(|| Classification::Unrecognized(raw.to_string()))
    }

    /// Label used in logs.
    pub fn label(&self) -> &str {
        match self {
            Classification::Recognized(intent) => intent.label(),
            Classification::Unrecognized(raw) => raw,
        }
    }
}
