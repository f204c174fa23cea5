//! Unified error types for the crate.

use thiserror::Error;

/// Top-level error for doc-index operations.
#[derive(Debug, Error)]
pub enum IndexError {
    /// I/O or filesystem errors.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// JSONL parsing / serialization errors.
    #[error("parse error: {0}")]
    Parse(String),

    /// Mismatch in vector dimensionality across records.
    #[error("vector size mismatch: got {got}, want {want}")]
    VectorSizeMismatch { got: usize, want: usize },

    /// Embedding backend failures (wrapped).
    #[error("embedding error: {0}")]
    Embedding(#[from] llm_service::LlmError),
}
