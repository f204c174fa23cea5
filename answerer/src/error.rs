//! Typed error for the answer pipeline.

use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnswerError {
    /// Both retrieval sides failed; a single side failing only degrades.
    #[error("retrieval unavailable: {0}")]
    RetrievalUnavailable(String),

    /// The generation service exceeded the configured answer timeout.
    /// Always surfaced to the caller, never a silent partial success.
    #[error("generation timed out after {0:?}")]
    GenerationTimeout(Duration),

    /// The generation service is unreachable or returned an error.
    #[error("generation unavailable: {0}")]
    GenerationUnavailable(String),

    /// Errors from the retrieval indexes.
    #[error("index error: {0}")]
    Index(#[from] doc_index::IndexError),

    /// HTTP/decoding errors from the LLM service outside generation calls.
    #[error("LLM error: {0}")]
    Llm(#[from] llm_service::LlmError),
}

/// Maps a generation-call failure onto the pipeline taxonomy.
///
/// A transport timeout becomes [`AnswerError::GenerationTimeout`]; anything
/// else from the service is [`AnswerError::GenerationUnavailable`].
pub(crate) fn map_generation_error(
    e: llm_service::LlmError,
    deadline: Duration,
) -> AnswerError {
    match &e {
        llm_service::LlmError::Transport(t) if t.is_timeout() => {
            AnswerError::GenerationTimeout(deadline)
        }
        _ => AnswerError::GenerationUnavailable(e.to_string()),
    }
}
