//! Embedding provider trait and the Ollama-backed implementation.

use std::sync::Arc;
use std::{future::Future, pin::Pin};

use crate::errors::IndexError;
use llm_service::OllamaService;

/// Provider interface for embedding generation.
///
/// Async is required because real providers perform HTTP requests.
/// Implement this trait to plug in another embedding backend.
pub trait EmbeddingsProvider: Send + Sync {
    /// Async embedding function.
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, IndexError>> + Send + 'a>>;
}

/// Ollama embedding provider (async).
#[derive(Clone)]
pub struct OllamaEmbedder {
    svc: Arc<OllamaService>,
    dim: usize,
}

impl OllamaEmbedder {
    /// Construct a new embedder around a shared service, enforcing the
    /// dimension the index was built with.
    pub fn new(svc: Arc<OllamaService>, dim: usize) -> Self {
        Self { svc, dim }
    }
}

impl EmbeddingsProvider for OllamaEmbedder {
    fn embed<'a>(
        &'a self,
        text: &'a str,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, IndexError>> + Send + 'a>> {
        Box::pin(async move {
            let vec = self.svc.embeddings(text).await?;

            if vec.len() != self.dim {
                return Err(IndexError::VectorSizeMismatch {
                    got: vec.len(),
                    want: self.dim,
                });
            }

            Ok(vec)
        })
    }
}
