//! Unified error type for the LLM service.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors produced by [`crate::OllamaService`] and the health probes.
#[derive(Debug, Error)]
pub enum LlmError {
    /// Invalid endpoint (empty or missing http/https).
    #[error("[LLM Service] invalid Ollama endpoint: {0}")]
    InvalidEndpoint(String),

    /// Transport/HTTP client error.
    #[error("[LLM Service] transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-successful HTTP status from upstream.
    #[error("[LLM Service] unexpected HTTP status {status} from {url}: {snippet}")]
    HttpStatus {
        /// Numeric HTTP status code.
        status: StatusCode,
        /// Request URL.
        url: String,
        /// Short snippet of the response body.
        snippet: String,
    },

    /// Unexpected/invalid JSON payload (batch body or a streamed line).
    #[error("[LLM Service] failed to decode response: {0}")]
    Decode(String),
}

/// Result alias for LLM service operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Clamp an upstream body to a short, log-friendly snippet.
pub(crate) fn make_snippet(text: &str) -> String {
    text.chars().take(240).collect()
}
