//! Provider retry: bounded exponential backoff with per-attempt timeouts.
//!
//! Wraps any provider. Transient failures (timeouts, rate limits, network
//! errors, 5xx responses) are retried; authentication and configuration
//! errors are returned immediately.

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use threadsage_core::error::ProviderError;
use threadsage_core::provider::*;
use tracing::{debug, warn};

/// Backoff schedule for a `RetryProvider`.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first one.
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub multiplier: u32,
    /// Upper bound on a single attempt.
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(8),
            multiplier: 2,
            timeout: Duration::from_secs(120),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &threadsage_config::RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            initial_backoff: Duration::from_millis(config.initial_backoff_ms),
            max_backoff: Duration::from_millis(config.max_backoff_ms),
            multiplier: 2,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// Delay before retry number `retry` (1-based), honoring a server hint.
    pub fn backoff(&self, retry: u32, error: &ProviderError) -> Duration {
        let factor = self.multiplier.saturating_pow(retry.saturating_sub(1));
        let mut delay = self.initial_backoff.saturating_mul(factor);
        if let ProviderError::RateLimited { retry_after_secs } = error {
            delay = delay.max(Duration::from_secs(*retry_after_secs));
        }
        delay.min(self.max_backoff)
    }
}

/// A provider that retries transient failures of an inner provider.
pub struct RetryProvider {
    inner: Arc<dyn threadsage_core::Provider>,
    policy: RetryPolicy,
}

impl RetryProvider {
    pub fn new(inner: Arc<dyn threadsage_core::Provider>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    async fn run<T, F, Fut>(&self, operation: &str, mut call: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let provider_name = self.inner.name();
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(
                provider = %provider_name,
                operation,
                attempt,
                max_attempts = self.policy.max_attempts,
                "Retry: calling provider"
            );

            let error = match tokio::time::timeout(self.policy.timeout, call()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => e,
                Err(_) => ProviderError::Timeout(format!(
                    "Provider '{}' timed out after {}s",
                    provider_name,
                    self.policy.timeout.as_secs()
                )),
            };

            if !error.is_transient() {
                warn!(
                    provider = %provider_name,
                    operation,
                    error = %error,
                    "Retry: permanent failure, not retrying"
                );
                return Err(error);
            }

            if attempt >= self.policy.max_attempts {
                warn!(
                    provider = %provider_name,
                    operation,
                    attempts = attempt,
                    error = %error,
                    "Retry: attempts exhausted"
                );
                return Err(ProviderError::RetriesExhausted {
                    attempts: attempt,
                    last_error: error.to_string(),
                });
            }

            let delay = self.policy.backoff(attempt, &error);
            warn!(
                provider = %provider_name,
                operation,
                attempt,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Retry: transient failure, backing off"
            );
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl threadsage_core::Provider for RetryProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        self.run("complete", || self.inner.complete(request.clone()))
            .await
    }

    async fn embed(
        &self,
        request: EmbeddingRequest,
    ) -> std::result::Result<EmbeddingResponse, ProviderError> {
        self.run("embed", || self.inner.embed(request.clone())).await
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        self.inner.health_check().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use threadsage_core::message::Message;

    /// Fails with the scripted errors in order, then succeeds.
    struct FlakyProvider {
        failures: Mutex<Vec<ProviderError>>,
        call_count: Mutex<usize>,
    }

    impl FlakyProvider {
        fn new(failures: Vec<ProviderError>) -> Self {
            Self {
                failures: Mutex::new(failures),
                call_count: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.call_count.lock().unwrap()
        }

        fn next_failure(&self) -> Option<ProviderError> {
            *self.call_count.lock().unwrap() += 1;
            let mut failures = self.failures.lock().unwrap();
            if failures.is_empty() {
                None
            } else {
                Some(failures.remove(0))
            }
        }
    }

    #[async_trait]
    impl threadsage_core::Provider for FlakyProvider {
        fn name(&self) -> &str {
            "flaky"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            match self.next_failure() {
                Some(e) => Err(e),
                None => Ok(ProviderResponse {
                    message: Message::assistant("success"),
                    usage: None,
                    model: "test-model".into(),
                }),
            }
        }

        async fn embed(
            &self,
            request: EmbeddingRequest,
        ) -> std::result::Result<EmbeddingResponse, ProviderError> {
            match self.next_failure() {
                Some(e) => Err(e),
                None => Ok(EmbeddingResponse {
                    embeddings: request.inputs.iter().map(|_| vec![1.0, 0.0]).collect(),
                    model: request.model,
                    usage: None,
                }),
            }
        }
    }

    /// A provider that hangs forever (for timeout testing).
    struct HangingProvider {
        call_count: Mutex<usize>,
    }

    #[async_trait]
    impl threadsage_core::Provider for HangingProvider {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            *self.call_count.lock().unwrap() += 1;
            tokio::time::sleep(Duration::from_secs(3600)).await;
            unreachable!()
        }
    }

    fn test_request() -> ProviderRequest {
        ProviderRequest::new("test", vec![Message::user("hello")])
    }

    fn server_error() -> ProviderError {
        ProviderError::ApiError {
            status_code: 503,
            message: "Service Unavailable".into(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_without_retry() {
        let inner = Arc::new(FlakyProvider::new(vec![]));
        let provider = RetryProvider::new(inner.clone(), RetryPolicy::default());

        let response = provider.complete(test_request()).await.unwrap();
        assert_eq!(response.message.content, "success");
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_failures() {
        let inner = Arc::new(FlakyProvider::new(vec![
            server_error(),
            ProviderError::Network("conn reset".into()),
        ]));
        let provider = RetryProvider::new(inner.clone(), RetryPolicy::default());

        let response = provider.complete(test_request()).await.unwrap();
        assert_eq!(response.message.content, "success");
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_max_attempts() {
        let inner = Arc::new(FlakyProvider::new(vec![
            server_error(),
            server_error(),
            server_error(),
            server_error(),
        ]));
        let provider = RetryProvider::new(inner.clone(), RetryPolicy::default());

        match provider.complete(test_request()).await.unwrap_err() {
            ProviderError::RetriesExhausted { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("Expected RetriesExhausted, got: {other:?}"),
        }
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn auth_failure_is_not_retried() {
        let inner = Arc::new(FlakyProvider::new(vec![
            ProviderError::AuthenticationFailed("bad key".into()),
        ]));
        let provider = RetryProvider::new(inner.clone(), RetryPolicy::default());

        match provider.complete(test_request()).await.unwrap_err() {
            ProviderError::AuthenticationFailed(_) => {}
            other => panic!("Expected AuthenticationFailed, got: {other:?}"),
        }
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn not_configured_is_not_retried() {
        let inner = Arc::new(FlakyProvider::new(vec![ProviderError::NotConfigured(
            "no embeddings".into(),
        )]));
        let provider = RetryProvider::new(inner.clone(), RetryPolicy::default());

        assert!(provider.complete(test_request()).await.is_err());
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_counts_as_transient() {
        let inner = Arc::new(HangingProvider {
            call_count: Mutex::new(0),
        });
        let policy = RetryPolicy {
            max_attempts: 2,
            timeout: Duration::from_millis(50),
            ..RetryPolicy::default()
        };
        let provider = RetryProvider::new(inner.clone(), policy);

        match provider.complete(test_request()).await.unwrap_err() {
            ProviderError::RetriesExhausted { attempts, last_error } => {
                assert_eq!(attempts, 2);
                assert!(last_error.contains("timed out"));
            }
            other => panic!("Expected RetriesExhausted, got: {other:?}"),
        }
        assert_eq!(*inner.call_count.lock().unwrap(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn embed_is_retried_too() {
        let inner = Arc::new(FlakyProvider::new(vec![ProviderError::RateLimited {
            retry_after_secs: 1,
        }]));
        let provider = RetryProvider::new(inner.clone(), RetryPolicy::default());

        let response = provider
            .embed(EmbeddingRequest {
                model: "embed".into(),
                inputs: vec!["a".into(), "b".into()],
            })
            .await
            .unwrap();
        assert_eq!(response.embeddings.len(), 2);
        assert_eq!(inner.calls(), 2);
    }

    #[test]
    fn backoff_grows_and_caps() {
        let policy = RetryPolicy::default();
        let err = server_error();
        assert_eq!(policy.backoff(1, &err), Duration::from_millis(500));
        assert_eq!(policy.backoff(2, &err), Duration::from_millis(1000));
        assert_eq!(policy.backoff(3, &err), Duration::from_millis(2000));
        assert_eq!(policy.backoff(10, &err), Duration::from_secs(8));
    }

    #[test]
    fn backoff_honors_retry_after_within_cap() {
        let policy = RetryPolicy::default();
        let hint = ProviderError::RateLimited {
            retry_after_secs: 5,
        };
        assert_eq!(policy.backoff(1, &hint), Duration::from_secs(5));

        let long_hint = ProviderError::RateLimited {
            retry_after_secs: 60,
        };
        assert_eq!(policy.backoff(1, &long_hint), Duration::from_secs(8));
    }

    #[test]
    fn policy_from_config() {
        let config = threadsage_config::RetryConfig {
            max_attempts: 5,
            initial_backoff_ms: 100,
            max_backoff_ms: 1000,
            timeout_secs: 30,
        };
        let policy = RetryPolicy::from_config(&config);
        assert_eq!(policy.max_attempts, 5);
        assert_eq!(policy.initial_backoff, Duration::from_millis(100));
        assert_eq!(policy.max_backoff, Duration::from_secs(1));
        assert_eq!(policy.timeout, Duration::from_secs(30));
    }
}
