/*!
 * Provider implementations for different LLM services.
 *
 * This module contains client implementations for various LLM providers:
 * - Ollama: Local LLM server
 * - OpenAI: OpenAI API integration (also used for LM Studio)
 * - Anthropic: Anthropic API integration
 *
 * Retry with exponential backoff and client-side rate limiting live here,
 * below the translation pipeline, which never retries on its own.
 */

use async_trait::async_trait;
use log::warn;
use parking_lot::Mutex;
use reqwest::StatusCode;
use std::fmt::Debug;
use std::future::Future;
use std::time::{Duration, Instant};

use crate::errors::ProviderError;

/// Common trait for all LLM providers
///
/// This trait defines the interface that all provider implementations must follow,
/// allowing them to be used interchangeably in the translation service.
#[async_trait]
pub trait Provider: Send + Sync + Debug {
    /// The request type for this provider
    type Request: Send + Sync;

    /// The response type for this provider
    type Response: Send + Sync;

    /// Complete a request using this provider
    ///
    /// # Arguments
    /// * `request` - The request to complete
    ///
    /// # Returns
    /// * `Result<Self::Response, ProviderError>` - The response from the provider or an error
    async fn complete(&self, request: Self::Request) -> Result<Self::Response, ProviderError>;

    /// Test the connection to the provider
    async fn test_connection(&self) -> Result<(), ProviderError>;

    /// Extract text from the provider response
    fn extract_text(response: &Self::Response) -> String;
}

/// Retry and pacing settings shared by the HTTP clients
#[derive(Debug)]
pub struct RetryPolicy {
    /// Maximum number of retry attempts after the first one
    max_retries: u32,
    /// Base backoff time in milliseconds, doubled on each retry
    backoff_base_ms: u64,
    /// Minimum spacing between two requests, derived from a requests-per-minute limit
    min_interval: Option<Duration>,
    /// When the previous request was sent
    last_request: Mutex<Option<Instant>>,
}

impl RetryPolicy {
    /// Create a policy; a rate limit of `None` or `Some(0)` disables pacing
    pub fn new(max_retries: u32, backoff_base_ms: u64, rate_limit: Option<u32>) -> Self {
        Self {
            max_retries,
            backoff_base_ms,
            min_interval: rate_limit
                .filter(|rpm| *rpm > 0)
                .map(|rpm| Duration::from_millis(60_000 / rpm as u64)),
            last_request: Mutex::new(None),
        }
    }

    /// Backoff before retry number `attempt` (1-based; 0 counts as the first retry)
    pub fn backoff_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        Duration::from_millis(self.backoff_base_ms.saturating_mul(1u64 << exponent))
    }

    /// Sleep until the rate limit allows another request
    async fn pace(&self) {
        let Some(interval) = self.min_interval else {
            return;
        };

        let wait = {
            let mut last = self.last_request.lock();
            let now = Instant::now();
            let wait = last
                .map(|previous| interval.saturating_sub(now.duration_since(previous)))
                .unwrap_or_default();
            *last = Some(now + wait);
            wait
        };

        if !wait.is_zero() {
            tokio::time::sleep(wait).await;
        }
    }

    /// Run `operation` until it succeeds, fails with a non-retryable error, or retries run out
    pub async fn run<T, F, Fut>(&self, label: &str, mut operation: F) -> Result<T, ProviderError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ProviderError>>,
    {
        let mut attempt = 0;

        loop {
            self.pace().await;

            match operation().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!("{} request failed: {} - attempt {}/{}", label, e, attempt, self.max_retries + 1);
                    tokio::time::sleep(self.backoff_for(attempt)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Map a non-success HTTP status and body to a provider error
pub fn error_for_status(status: StatusCode, body: String) -> ProviderError {
    match status.as_u16() {
        401 | 403 => ProviderError::AuthenticationError(body),
        429 => ProviderError::RateLimitExceeded(body),
        code => ProviderError::ApiError { status_code: code, message: body },
    }
}

/// Map a reqwest transport error to a provider error
pub fn error_for_transport(error: reqwest::Error) -> ProviderError {
    if error.is_connect() || error.is_timeout() {
        ProviderError::ConnectionError(error.to_string())
    } else {
        ProviderError::RequestFailed(error.to_string())
    }
}

/// Send a prepared request and decode a JSON body, classifying failures
pub async fn send_json<T: serde::de::DeserializeOwned>(
    request: reqwest::RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request.send().await.map_err(error_for_transport)?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await
            .unwrap_or_else(|_| "Failed to get error response text".to_string());
        return Err(error_for_status(status, body));
    }

    response.json::<T>().await
        .map_err(|e| ProviderError::ParseError(e.to_string()))
}

pub mod anthropic;
pub mod mock;
pub mod ollama;
pub mod openai;
