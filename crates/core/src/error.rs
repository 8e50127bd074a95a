//! Error types for the ThreadSage domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant.

use thiserror::Error;

/// The top-level error type for all ThreadSage operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Language model gateway errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Knowledge store errors ---
    #[error("Knowledge store error: {0}")]
    Store(#[from] StoreError),

    // --- Channel errors ---
    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Gave up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

impl ProviderError {
    /// Whether another attempt could plausibly succeed.
    ///
    /// Credential and configuration problems never fix themselves between
    /// attempts; 4xx API errors other than 408/429 are treated the same way.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RateLimited { .. } | Self::Timeout(_) | Self::Network(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500 || *status_code == 408,
            Self::AuthenticationFailed(_)
            | Self::NotConfigured(_)
            | Self::RetriesExhausted { .. } => false,
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to read knowledge store at {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Failed to write knowledge store at {path}: {reason}")]
    Write { path: String, reason: String },

    #[error("Retrieval index failed: {0}")]
    Index(String),
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("Channel not configured: {0}")]
    NotConfigured(String),

    #[error("Message delivery failed to {channel}: {reason}")]
    DeliveryFailed { channel: String, reason: String },

    #[error("Platform API call {method} failed: {reason}")]
    ApiCall { method: String, reason: String },

    #[error("Channel connection lost: {0}")]
    ConnectionLost(String),

    #[error("Invalid webhook payload: {0}")]
    InvalidPayload(String),

    #[error("Request signature rejected: {0}")]
    InvalidSignature(String),
}
