//! Configuration loading, validation, and management for ThreadSage.
//!
//! Loads configuration from `~/.threadsage/config.toml` with environment
//! variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Dotenv file consulted for environment overrides.
pub const DOTENV_FILE: &str = ".env";

/// The root configuration structure.
///
/// Maps directly to `~/.threadsage/config.toml`.
#[derive(Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// API key (can be overridden per-provider)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Default LLM provider
    #[serde(default = "default_provider")]
    pub default_provider: String,

    /// Default model (or Azure deployment when the provider is "azure")
    #[serde(default = "default_model")]
    pub default_model: String,

    /// Default temperature for answers
    #[serde(default = "default_temperature")]
    pub default_temperature: f32,

    /// Default max tokens per LLM response
    #[serde(default = "default_max_tokens")]
    pub default_max_tokens: u32,

    /// Provider-specific configurations
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,

    /// Azure OpenAI settings
    #[serde(default)]
    pub azure: AzureConfig,

    /// Embedding and retrieval settings
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Knowledge store location
    #[serde(default)]
    pub knowledge: KnowledgeConfig,

    /// Retry policy for model calls
    #[serde(default)]
    pub retry: RetryConfig,

    /// Gateway configuration
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Slack app configuration
    #[serde(default)]
    pub slack: SlackAppConfig,
}

fn default_provider() -> String {
    "openai".into()
}
fn default_model() -> String {
    "gpt-4o-mini".into()
}
fn default_temperature() -> f32 {
    0.7
}
fn default_max_tokens() -> u32 {
    1024
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("api_key", &redact(&self.api_key))
            .field("default_provider", &self.default_provider)
            .field("default_model", &self.default_model)
            .field("default_temperature", &self.default_temperature)
            .field("default_max_tokens", &self.default_max_tokens)
            .field("providers", &self.providers)
            .field("azure", &self.azure)
            .field("embedding", &self.embedding)
            .field("knowledge", &self.knowledge)
            .field("retry", &self.retry)
            .field("gateway", &self.gateway)
            .field("slack", &self.slack)
            .finish()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &redact(&self.api_key))
            .field("api_url", &self.api_url)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AzureConfig {
    /// Resource endpoint, e.g. `https://my-resource.openai.azure.com`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default = "default_azure_api_version")]
    pub api_version: String,

    /// Deployment used for chat; falls back to `default_model`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployment: Option<String>,

    /// Deployment used for embeddings; falls back to `embedding.model`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_deployment: Option<String>,
}

fn default_azure_api_version() -> String {
    "2024-05-01-preview".into()
}

impl Default for AzureConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_version: default_azure_api_version(),
            deployment: None,
            embedding_deployment: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Provider used for embeddings: "default" reuses the chat provider's
    /// endpoint, "none" switches retrieval to keyword ranking.
    #[serde(default = "default_embedding_provider")]
    pub provider: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    /// Upper bound on the size of one retrieval chunk, in characters
    #[serde(default = "default_chunk_chars")]
    pub chunk_chars: usize,

    /// Number of chunks handed to the model when answering
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

fn default_embedding_provider() -> String {
    "default".into()
}
fn default_embedding_model() -> String {
    "text-embedding-3-small".into()
}
fn default_chunk_chars() -> usize {
    1024
}
fn default_top_k() -> usize {
    2
}

impl EmbeddingConfig {
    pub fn is_disabled(&self) -> bool {
        self.provider == "none"
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            model: default_embedding_model(),
            chunk_chars: default_chunk_chars(),
            top_k: default_top_k(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Path of the knowledge file; defaults to `~/.threadsage/data/me.txt`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,

    /// Per-attempt timeout
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_max_attempts() -> u32 {
    3
}
fn default_initial_backoff_ms() -> u64 {
    500
}
fn default_max_backoff_ms() -> u64 {
    8_000
}
fn default_timeout_secs() -> u64 {
    120
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

fn default_port() -> u16 {
    5003
}
fn default_host() -> String {
    "127.0.0.1".into()
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct SlackAppConfig {
    /// Bot token (xoxb-...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,

    /// Signing secret used to verify inbound event requests
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signing_secret: Option<String>,

    /// The bot's own member ID; mentions of it are stripped from input
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_user_id: Option<String>,

    /// Reaction shown while answering a mention
    #[serde(default = "default_mention_reaction")]
    pub mention_reaction: String,

    /// Reaction shown while answering a thread reply
    #[serde(default = "default_thread_reaction")]
    pub thread_reaction: String,

    /// Allowed member IDs. Empty = deny all, ["*"] = allow all.
    #[serde(default = "default_allowed_users")]
    pub allowed_users: Vec<String>,
}

fn default_mention_reaction() -> String {
    "tada".into()
}
fn default_thread_reaction() -> String {
    "eyes".into()
}
fn default_allowed_users() -> Vec<String> {
    vec!["*".into()]
}

impl SlackAppConfig {
    pub fn is_configured(&self) -> bool {
        self.bot_token.as_deref().is_some_and(|t| !t.is_empty())
    }
}

impl Default for SlackAppConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            signing_secret: None,
            bot_user_id: None,
            mention_reaction: default_mention_reaction(),
            thread_reaction: default_thread_reaction(),
            allowed_users: default_allowed_users(),
        }
    }
}

impl std::fmt::Debug for SlackAppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SlackAppConfig")
            .field("bot_token", &redact(&self.bot_token))
            .field("signing_secret", &redact(&self.signing_secret))
            .field("bot_user_id", &self.bot_user_id)
            .field("mention_reaction", &self.mention_reaction)
            .field("thread_reaction", &self.thread_reaction)
            .field("allowed_users", &self.allowed_users)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.threadsage/config.toml),
    /// then apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_dir().join("config.toml");
        Self::load_with_env(&config_path)
    }

    /// Load a specific file, then apply environment overrides from the
    /// process and from `.env` in the working directory.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with_env_file(path, Path::new(DOTENV_FILE))
    }

    /// Like [`AppConfig::load_with_env`] with an explicit dotenv path.
    /// Process variables take precedence over the file; a missing file is
    /// not an error.
    pub fn load_with_env_file(path: &Path, dotenv_path: &Path) -> Result<Self, ConfigError> {
        let dotenv = read_dotenv(dotenv_path)?;
        let mut config = Self::load_from(path)?;
        config.apply_env(|key| {
            std::env::var(key)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .or_else(|| dotenv.get(key).cloned())
        });
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply environment overrides through `lookup`.
    ///
    /// Keys:
    /// - `THREADSAGE_API_KEY`, `AZURE_OPENAI_API_KEY`, `OPENAI_API_KEY` (first hit wins, only if unset)
    /// - `AZURE_OPENAI_ENDPOINT`
    /// - `THREADSAGE_PROVIDER`, `THREADSAGE_MODEL`, `THREADSAGE_KNOWLEDGE_PATH`
    /// - `SLACK_BOT_TOKEN`, `SLACK_SIGNING_SECRET`, `SLACK_BOT_USER_ID`
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if self.api_key.is_none() {
            self.api_key = lookup("THREADSAGE_API_KEY")
                .or_else(|| lookup("AZURE_OPENAI_API_KEY"))
                .or_else(|| lookup("OPENAI_API_KEY"));
        }

        if let Some(endpoint) = lookup("AZURE_OPENAI_ENDPOINT") {
            self.azure.endpoint = Some(endpoint);
        }
        if let Some(provider) = lookup("THREADSAGE_PROVIDER") {
            self.default_provider = provider;
        }
        if let Some(model) = lookup("THREADSAGE_MODEL") {
            self.default_model = model;
        }
        if let Some(path) = lookup("THREADSAGE_KNOWLEDGE_PATH") {
            self.knowledge.path = Some(path);
        }
        if let Some(token) = lookup("SLACK_BOT_TOKEN") {
            self.slack.bot_token = Some(token);
        }
        if let Some(secret) = lookup("SLACK_SIGNING_SECRET") {
            self.slack.signing_secret = Some(secret);
        }
        if let Some(bot_user_id) = lookup("SLACK_BOT_USER_ID") {
            self.slack.bot_user_id = Some(bot_user_id);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".threadsage")
    }

    /// Resolved path of the knowledge file.
    pub fn knowledge_path(&self) -> PathBuf {
        self.knowledge
            .path
            .as_ref()
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::config_dir().join("data").join("me.txt"))
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.default_temperature < 0.0 || self.default_temperature > 2.0 {
            return Err(ConfigError::ValidationError(
                "default_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ConfigError::ValidationError(
                "retry.max_attempts must be at least 1".into(),
            ));
        }

        if self.retry.initial_backoff_ms > self.retry.max_backoff_ms {
            return Err(ConfigError::ValidationError(
                "retry.initial_backoff_ms must not exceed retry.max_backoff_ms".into(),
            ));
        }

        if self.embedding.chunk_chars == 0 || self.embedding.top_k == 0 {
            return Err(ConfigError::ValidationError(
                "embedding.chunk_chars and embedding.top_k must be > 0".into(),
            ));
        }

        if self.default_provider == "azure" && self.azure.endpoint.is_none() {
            return Err(ConfigError::ValidationError(
                "provider \"azure\" requires azure.endpoint or AZURE_OPENAI_ENDPOINT".into(),
            ));
        }

        Ok(())
    }

    /// Model name sent with chat requests; Azure addresses it by deployment.
    pub fn chat_model(&self) -> &str {
        match (&self.azure.deployment, self.default_provider.as_str()) {
            (Some(deployment), "azure") => deployment,
            _ => &self.default_model,
        }
    }

    /// Check if an API key is available (from config or environment).
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some() || self.providers.values().any(|p| p.api_key.is_some())
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            default_provider: default_provider(),
            default_model: default_model(),
            default_temperature: default_temperature(),
            default_max_tokens: default_max_tokens(),
            providers: HashMap::new(),
            azure: AzureConfig::default(),
            embedding: EmbeddingConfig::default(),
            knowledge: KnowledgeConfig::default(),
            retry: RetryConfig::default(),
            gateway: GatewayConfig::default(),
            slack: SlackAppConfig::default(),
        }
    }
}

/// Get the user's home directory.
fn read_dotenv(path: &Path) -> Result<HashMap<String, String>, ConfigError> {
    let iter = match dotenvy::from_path_iter(path) {
        Ok(iter) => iter,
        Err(e) if e.not_found() => return Ok(HashMap::new()),
        Err(e) => {
            return Err(ConfigError::ReadError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
        }
    };

    let vars = iter
        .collect::<Result<HashMap<_, _>, _>>()
        .map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

    tracing::info!(path = %path.display(), vars = vars.len(), "Loaded environment file");
    Ok(vars)
}

fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
