//! Retrieval backends for the hybrid document Q&A pipeline.
//!
//! This crate provides the two independent retrieval signals the answer
//! pipeline fuses:
//! - Dense: [`VectorIndex`] — cosine similarity over an embedded JSONL
//!   chunk dump, queries embedded via an [`EmbeddingsProvider`].
//! - Sparse: [`Bm25Index`] — BM25+ term matching over the same chunks.
//!
//! Both are exposed through narrow object-safe traits ([`VectorSearch`],
//! [`LexicalSearch`]) so the pipeline never depends on how candidates are
//! produced. Indexes are read-only after construction; concurrent queries
//! need no locking.

mod bm25;
mod embed;
mod errors;
mod io_jsonl;
mod record;
mod vector;

pub use bm25::Bm25Index;
pub use embed::{EmbeddingsProvider, OllamaEmbedder};
pub use errors::IndexError;
pub use io_jsonl::read_chunks;
pub use record::{ChunkRecord, Origin, ScoredCandidate};
pub use vector::VectorIndex;

use std::sync::Arc;
use std::{future::Future, pin::Pin};

/// Dense retrieval contract consumed by the answer pipeline.
///
/// Scores are similarities in a known range (cosine for the bundled
/// implementation).
pub trait VectorSearch: Send + Sync {
    fn search<'a>(
        &'a self,
        query: &'a str,
        top_k: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ScoredCandidate>, IndexError>> + Send + 'a>>;
}

/// Sparse retrieval contract consumed by the answer pipeline.
///
/// Scores are BM25+-family weights: unbounded, non-negative.
pub trait LexicalSearch: Send + Sync {
    fn search<'a>(
        &'a self,
        query: &'a str,
        top_k: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ScoredCandidate>, IndexError>> + Send + 'a>>;
}

/// [`VectorIndex`] paired with the embedder used for queries.
///
/// The embedder must match the model the dump was embedded with; the pair
/// is what implements [`VectorSearch`].
pub struct VectorRetriever {
    index: VectorIndex,
    provider: Arc<dyn EmbeddingsProvider>,
}

impl VectorRetriever {
    pub fn new(index: VectorIndex, provider: Arc<dyn EmbeddingsProvider>) -> Self {
        Self { index, provider }
    }
}

impl VectorSearch for VectorRetriever {
    fn search<'a>(
        &'a self,
        query: &'a str,
        top_k: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ScoredCandidate>, IndexError>> + Send + 'a>> {
        Box::pin(self.index.search(self.provider.as_ref(), query, top_k))
    }
}

impl LexicalSearch for Bm25Index {
    fn search<'a>(
        &'a self,
        query: &'a str,
        top_k: usize,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<ScoredCandidate>, IndexError>> + Send + 'a>> {
        let hits = Bm25Index::search(self, query, top_k);
        Box::pin(async move { Ok(hits) })
    }
}
