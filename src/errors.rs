/*!
 * Error types for the yadtwai application.
 *
 * This module contains custom error types for different parts of the application,
 * using the thiserror crate for ergonomic error definitions.
 */

use thiserror::Error;

/// Errors that can occur when working with provider APIs
#[derive(Error, Debug)]
pub enum ProviderError {
    /// Error when making an API request fails
    #[error("API request failed: {0}")]
    RequestFailed(String),

    /// Error when parsing an API response fails
    #[error("Failed to parse API response: {0}")]
    ParseError(String),

    /// Error returned by the API itself
    #[error("API responded with error: {status_code} - {message}")]
    ApiError {
        /// HTTP status code
        status_code: u16,
        /// Error message from the API
        message: String
    },

    /// Error establishing or maintaining a connection
    #[error("Connection error: {0}")]
    ConnectionError(String),

    /// Error related to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimitExceeded(String),

    /// Error with authentication
    #[error("Authentication error: {0}")]
    AuthenticationError(String),
}

impl ProviderError {
    /// Whether a retry of the same request may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::ConnectionError(_) | Self::RateLimitExceeded(_) | Self::RequestFailed(_) => true,
            Self::ApiError { status_code, .. } => *status_code >= 500,
            Self::ParseError(_) | Self::AuthenticationError(_) => false,
        }
    }
}

/// Errors that can occur while running the translation pipeline
#[derive(Error, Debug)]
pub enum TranslationError {
    /// Invalid pipeline or provider configuration, raised before any work starts
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The translation capability failed for a block
    #[error("Translation of block {index} failed: {source}")]
    BlockTranslation {
        /// Index of the block that failed
        index: usize,
        /// Underlying provider error
        #[source]
        source: ProviderError,
    },

    /// The translation capability returned nothing for a block
    #[error("Translation of block {index} returned an empty response")]
    EmptyTranslation {
        /// Index of the block
        index: usize,
    },

    /// The review capability failed for a batch
    #[error("Review of batch {batch} (blocks {start}..{end}) failed: {source}")]
    BatchReview {
        /// Batch index in emission order
        batch: usize,
        /// First translated unit of the batch
        start: usize,
        /// One past the last translated unit of the batch
        end: usize,
        /// Underlying provider error
        #[source]
        source: ProviderError,
    },

    /// The review capability returned nothing for a batch
    #[error("Review of batch {batch} (blocks {start}..{end}) returned an empty response")]
    EmptyReview {
        /// Batch index in emission order
        batch: usize,
        /// First translated unit of the batch
        start: usize,
        /// One past the last translated unit of the batch
        end: usize,
    },

    /// Reading or writing intermediate units failed
    #[error("Checkpoint error: {0}")]
    Checkpoint(String),
}
