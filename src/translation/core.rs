/*!
 * Core translation service implementation.
 *
 * This module contains the `TranslationService`, the factory that resolves the
 * configured provider once and exposes a single completion call to the
 * translation, review and preprocessing capabilities.
 */

use anyhow::{Result, anyhow};
use log::debug;
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use url::Url;

use crate::app_config::{TranslationConfig, TranslationProvider as ConfigTranslationProvider};
use crate::errors::ProviderError;
use crate::providers::anthropic::{Anthropic, AnthropicRequest};
use crate::providers::mock::{MockProvider, MockRequest};
use crate::providers::ollama::{ChatRequest, Ollama};
use crate::providers::openai::{OpenAI, OpenAIRequest};
use crate::providers::{Provider, RetryPolicy};

/// Token usage statistics for tracking API consumption
#[derive(Clone, Debug)]
pub struct TokenUsageStats {
    /// Number of prompt tokens
    pub prompt_tokens: u64,

    /// Number of completion tokens
    pub completion_tokens: u64,

    /// Total number of tokens
    pub total_tokens: u64,

    /// Number of completed requests
    pub requests: u64,

    /// Start time of token tracking
    pub start_time: Instant,

    /// Total time spent on API requests
    pub api_duration: Duration,

    /// Provider name
    pub provider: String,

    /// Model name
    pub model: String,
}

impl Default for TokenUsageStats {
    fn default() -> Self {
        Self::with_provider_info(String::new(), String::new())
    }
}

impl TokenUsageStats {
    /// Create new token usage stats with provider info
    pub fn with_provider_info(provider: String, model: String) -> Self {
        Self {
            prompt_tokens: 0,
            completion_tokens: 0,
            total_tokens: 0,
            requests: 0,
            start_time: Instant::now(),
            api_duration: Duration::from_secs(0),
            provider,
            model,
        }
    }

    /// Add token usage numbers; providers that do not report usage pass `None`
    pub fn add_token_usage(&mut self, prompt_tokens: Option<u64>, completion_tokens: Option<u64>) {
        if let Some(pt) = prompt_tokens {
            self.prompt_tokens += pt;
            self.total_tokens += pt;
        }

        if let Some(ct) = completion_tokens {
            self.completion_tokens += ct;
            self.total_tokens += ct;
        }
    }

    /// Record one completed request
    pub fn record(&mut self, completion: &Completion) {
        self.add_token_usage(completion.prompt_tokens, completion.completion_tokens);
        self.api_duration += completion.duration;
        self.requests += 1;
    }

    /// Calculate tokens per minute rate
    pub fn tokens_per_minute(&self) -> f64 {
        // Use the API duration for rate calculation, with fallback to elapsed time
        let duration_minutes = if self.api_duration.as_secs_f64() > 0.0 {
            self.api_duration.as_secs_f64() / 60.0
        } else {
            self.start_time.elapsed().as_secs_f64() / 60.0
        };

        if duration_minutes > 0.0 {
            self.total_tokens as f64 / duration_minutes
        } else {
            0.0
        }
    }

    /// Generate a summary of token usage
    pub fn summary(&self) -> String {
        let elapsed_minutes = self.start_time.elapsed().as_secs_f64() / 60.0;
        let api_minutes = self.api_duration.as_secs_f64() / 60.0;

        format!(
            "Token Usage Summary:\n\
             Provider: {}\n\
             Model: {}\n\
             Requests: {}\n\
             Prompt tokens: {}\n\
             Completion tokens: {}\n\
             Total tokens: {}\n\
             Elapsed time: {:.2} minutes\n\
             API request time: {:.2} minutes\n\
             Tokens per minute: {:.2}",
            self.provider,
            self.model,
            self.requests,
            self.prompt_tokens,
            self.completion_tokens,
            self.total_tokens,
            elapsed_minutes,
            api_minutes,
            self.tokens_per_minute()
        )
    }
}

/// Result of a single completion call
#[derive(Debug, Clone)]
pub struct Completion {
    /// Generated text, trimmed
    pub text: String,
    /// Prompt tokens reported by the provider
    pub prompt_tokens: Option<u64>,
    /// Completion tokens reported by the provider
    pub completion_tokens: Option<u64>,
    /// Wall-clock time of the request, retries included
    pub duration: Duration,
}

/// Parse an endpoint string into host and port
pub fn parse_endpoint(endpoint: &str) -> Result<(String, u16)> {
    if endpoint.is_empty() {
        return Err(anyhow!("Endpoint cannot be empty"));
    }

    let url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
        Url::parse(endpoint)?
    } else {
        Url::parse(&format!("http://{}", endpoint))?
    };

    let host = url.host_str()
        .ok_or_else(|| anyhow!("Invalid host in endpoint: {}", endpoint))?
        .to_string();

    let port = url.port().unwrap_or(if url.scheme() == "https" { 443 } else { 80 });

    // Keep the scheme so https endpoints are not downgraded
    let host = if url.scheme() == "https" { format!("https://{}", host) } else { host };

    Ok((host, port))
}

/// Translation provider implementation variants
#[derive(Debug)]
enum TranslationProviderImpl {
    /// Ollama LLM service
    Ollama {
        /// Client instance
        client: Ollama,
    },

    /// OpenAI API service
    OpenAI {
        /// Client instance
        client: OpenAI,
    },

    /// LM Studio local server (OpenAI-compatible)
    LMStudio {
        /// Client instance (OpenAI-compatible)
        client: OpenAI,
    },

    /// Anthropic API service
    Anthropic {
        /// Client instance
        client: Anthropic,
    },

    /// In-process mock, used by tests
    Mock {
        /// Client instance
        client: MockProvider,
    },
}

/// Completion service shared by every model-backed capability
#[derive(Debug)]
pub struct TranslationService {
    /// Provider implementation
    provider: TranslationProviderImpl,

    /// Configuration for the translation service
    pub config: TranslationConfig,

    /// Accumulated token usage
    usage: Mutex<TokenUsageStats>,
}

impl TranslationService {
    /// Create a new translation service with the given configuration
    pub fn new(config: TranslationConfig) -> Result<Self> {
        let retry = || RetryPolicy::new(
            config.common.retry_count,
            config.common.retry_backoff_ms,
            config.get_rate_limit(),
        );
        let timeout_secs = config.get_timeout_secs();

        let provider = match config.provider {
            ConfigTranslationProvider::Ollama => {
                let (host, port) = parse_endpoint(&config.get_endpoint())?;

                TranslationProviderImpl::Ollama {
                    client: Ollama::new_with_config(host, port, retry(), timeout_secs),
                }
            },
            ConfigTranslationProvider::OpenAI => {
                TranslationProviderImpl::OpenAI {
                    client: OpenAI::new_with_config(
                        config.get_api_key(),
                        config.get_endpoint(),
                        retry(),
                        timeout_secs,
                    ),
                }
            },
            ConfigTranslationProvider::LMStudio => {
                // LM Studio often doesn't require an API key; use a default if empty
                let api_key = {
                    let k = config.get_api_key();
                    if k.is_empty() { "lm-studio".to_string() } else { k }
                };

                TranslationProviderImpl::LMStudio {
                    client: OpenAI::new_with_config(api_key, config.get_endpoint(), retry(), timeout_secs),
                }
            },
            ConfigTranslationProvider::Anthropic => {
                TranslationProviderImpl::Anthropic {
                    client: Anthropic::new_with_config(
                        config.get_api_key(),
                        config.get_endpoint(),
                        retry(),
                        timeout_secs,
                    ),
                }
            },
        };

        let usage = TokenUsageStats::with_provider_info(
            config.provider.display_name().to_string(),
            config.get_model(),
        );

        Ok(Self {
            provider,
            config,
            usage: Mutex::new(usage),
        })
    }

    /// Create a service backed by a mock provider
    pub fn with_mock_provider(config: TranslationConfig, client: MockProvider) -> Self {
        let usage = TokenUsageStats::with_provider_info("Mock".to_string(), config.get_model());

        Self {
            provider: TranslationProviderImpl::Mock { client },
            config,
            usage: Mutex::new(usage),
        }
    }

    /// Test the connection to the translation provider
    pub async fn test_connection(&self) -> Result<()> {
        debug!(
            "Testing connection to {} with model {}",
            self.config.provider.display_name(),
            self.config.get_model()
        );

        let result = match &self.provider {
            TranslationProviderImpl::Ollama { client } => client.test_connection().await,
            TranslationProviderImpl::OpenAI { client } | TranslationProviderImpl::LMStudio { client } => {
                client.test_connection().await
            }
            TranslationProviderImpl::Anthropic { client } => client.test_connection().await,
            TranslationProviderImpl::Mock { client } => client.test_connection().await,
        };

        result.map_err(|e| anyhow!("Failed to connect to {}: {}", self.config.provider.display_name(), e))
    }

    /// Send one system + user prompt pair to the active provider
    pub async fn complete(&self, system: &str, prompt: &str) -> Result<Completion, ProviderError> {
        let start_time = Instant::now();
        let model = self.config.get_model();
        let temperature = self.config.common.temperature;
        let max_tokens = self.config.get_max_output_tokens();

        let (text, prompt_tokens, completion_tokens) = match &self.provider {
            TranslationProviderImpl::Ollama { client } => {
                let request = ChatRequest::new(model)
                    .system(system)
                    .add_message("user", prompt)
                    .temperature(temperature)
                    .max_tokens(max_tokens)
                    .context_size(context_size_for(system, prompt, max_tokens));

                let response = client.complete(request).await?;
                (Ollama::extract_text(&response), response.prompt_eval_count, response.eval_count)
            },
            TranslationProviderImpl::OpenAI { client } | TranslationProviderImpl::LMStudio { client } => {
                let request = OpenAIRequest::new(model)
                    .add_message("system", system)
                    .add_message("user", prompt)
                    .temperature(temperature)
                    .max_tokens(max_tokens);

                let response = client.complete(request).await?;
                let usage = response.usage.as_ref()
                    .map(|u| (Some(u.prompt_tokens as u64), Some(u.completion_tokens as u64)))
                    .unwrap_or((None, None));
                (OpenAI::extract_text(&response), usage.0, usage.1)
            },
            TranslationProviderImpl::Anthropic { client } => {
                let request = AnthropicRequest::new(model, max_tokens)
                    .system(system)
                    .add_message("user", prompt)
                    .temperature(temperature);

                let response = client.complete(request).await?;
                (
                    Anthropic::extract_text(&response),
                    Some(response.usage.input_tokens as u64),
                    Some(response.usage.output_tokens as u64),
                )
            },
            TranslationProviderImpl::Mock { client } => {
                let request = MockRequest {
                    system: system.to_string(),
                    prompt: prompt.to_string(),
                };

                let response = client.complete(request).await?;
                (MockProvider::extract_text(&response), response.prompt_tokens, response.completion_tokens)
            },
        };

        let completion = Completion {
            text: text.trim().to_string(),
            prompt_tokens,
            completion_tokens,
            duration: start_time.elapsed(),
        };

        debug!(
            "{} completion in {:?} ({} chars)",
            self.config.provider.display_name(),
            completion.duration,
            completion.text.len()
        );

        self.usage.lock().record(&completion);
        Ok(completion)
    }

    /// Snapshot of the accumulated token usage
    pub fn token_usage(&self) -> TokenUsageStats {
        self.usage.lock().clone()
    }
}

/// Context window large enough for the prompt plus the answer, rounded up to 1024
fn context_size_for(system: &str, prompt: &str, max_tokens: u32) -> u32 {
    let prompt_tokens = ((system.len() + prompt.len()) / 3) as u32;
    let needed = prompt_tokens.saturating_add(max_tokens);
    needed.div_ceil(1024).max(4) * 1024
}
