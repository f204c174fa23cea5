//! In-process dense retrieval over an embedded chunk dump.
//!
//! The index holds every chunk embedding in memory and scores queries by
//! cosine similarity. Scores land in `[-1, 1]`; for normalized embedding
//! models the practical range is `[0, 1]`. Corpora here are per-project
//! document sets, so a linear scan is the honest choice over an ANN
//! structure.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::embed::EmbeddingsProvider;
use crate::errors::IndexError;
use crate::io_jsonl::read_chunks;
use crate::record::{ChunkRecord, Origin, ScoredCandidate};

/// Read-only dense index over embedded chunks.
#[derive(Debug)]
pub struct VectorIndex {
    records: Vec<ChunkRecord>,
}

impl VectorIndex {
    /// Builds the index from a JSONL chunk dump.
    ///
    /// # Errors
    /// - [`IndexError::Io`] if the dump cannot be read.
    /// - [`IndexError::VectorSizeMismatch`] if embeddings disagree in size.
    pub fn load(jsonl_path: impl AsRef<Path>) -> Result<Self, IndexError> {
        Self::from_records(read_chunks(jsonl_path)?)
    }

    /// Builds the index from in-memory records.
    ///
    /// Records without a precomputed embedding are logged and dropped;
    /// computing embeddings is the ingestion step's job, not ours. A
    /// lexical-only dump (no embeddings at all) yields an empty index.
    ///
    /// # Errors
    /// - [`IndexError::VectorSizeMismatch`] if embeddings disagree in size;
    ///   cosine over mixed dimensions would quietly produce wrong scores.
    pub fn from_records(records: Vec<ChunkRecord>) -> Result<Self, IndexError> {
        let mut kept = Vec::with_capacity(records.len());
        let mut dim: Option<usize> = None;

        for record in records {
            match record.embedding.as_ref().map(Vec::len) {
                None => warn!("chunk `{}` has no embedding, dropped", record.id),
                Some(n) => {
                    let want = *dim.get_or_insert(n);
                    if n != want {
                        return Err(IndexError::VectorSizeMismatch { got: n, want });
                    }
                    kept.push(record);
                }
            }
        }

        info!("VectorIndex ready: {} embedded chunks", kept.len());
        Ok(Self { records: kept })
    }

    /// Embedding dimension of the loaded corpus, if any chunks were kept.
    pub fn dim(&self) -> Option<usize> {
        self.records
            .first()
            .and_then(|r| r.embedding.as_ref())
            .map(Vec::len)
    }

    /// Scores all chunks against the embedded query and returns the top-k
    /// candidates, best first.
    ///
    /// # Errors
    /// Propagates embedding failures from the provider.
    pub async fn search(
        &self,
        provider: &dyn EmbeddingsProvider,
        query: &str,
        top_k: usize,
    ) -> Result<Vec<ScoredCandidate>, IndexError> {
        if self.records.is_empty() {
            return Ok(Vec::new());
        }

        let qvec = provider.embed(query).await?;
        debug!("vector search: {} chunks, top_k={top_k}", self.records.len());

        let mut hits: Vec<ScoredCandidate> = self
            .records
            .iter()
            .map(|r| {
                // `from_records`/`load` guarantee the embedding is present.
                let emb = r.embedding.as_deref().unwrap_or(&[]);
                ScoredCandidate::from_record(r, cosine(&qvec, emb), Origin::Vector)
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score));
        hits.truncate(top_k);
        Ok(hits)
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let (mut dot, mut na, mut nb) = (0.0f32, 0.0f32, 0.0f32);
    let len = a.len().min(b.len());
    for i in 0..len {
        dot += a[i] * b[i];
        na += a[i] * a[i];
        nb += b[i] * b[i];
    }
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na.sqrt() * nb.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::future::Future;
    use std::pin::Pin;

    struct FixedEmbedder(Vec<f32>);

    impl EmbeddingsProvider for FixedEmbedder {
        fn embed<'a>(
            &'a self,
            _text: &'a str,
        ) -> Pin<Box<dyn Future<Output = Result<Vec<f32>, IndexError>> + Send + 'a>> {
            let v = self.0.clone();
            Box::pin(async move { Ok(v) })
        }
    }

    fn record(id: &str, page: u32, embedding: Vec<f32>) -> ChunkRecord {
        ChunkRecord {
            id: id.into(),
            source_file: format!("{id}.pdf"),
            page_number: page,
            text: format!("text of {id}"),
            embedding: Some(embedding),
        }
    }

    #[tokio::test]
    async fn ranks_by_cosine_similarity() {
        let index = VectorIndex::from_records(vec![
            record("far", 1, vec![0.0, 1.0]),
            record("near", 2, vec![1.0, 0.0]),
            record("mid", 3, vec![1.0, 1.0]),
        ])
        .unwrap();
        let provider = FixedEmbedder(vec![1.0, 0.0]);

        let hits = index.search(&provider, "q", 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].source_id, "near.pdf");
        assert!(hits[0].score > hits[1].score);
        assert_eq!(hits[0].origin, Origin::Vector);
    }

    #[test]
    fn mixed_embedding_dimensions_are_rejected() {
        let err = VectorIndex::from_records(vec![
            record("a", 1, vec![1.0, 0.0]),
            record("b", 2, vec![1.0, 0.0, 0.5]),
        ])
        .unwrap_err();

        assert!(matches!(
            err,
            IndexError::VectorSizeMismatch { got: 3, want: 2 }
        ));
    }

    #[test]
    fn unembedded_records_are_dropped_not_fatal() {
        let mut no_embedding = record("plain", 1, Vec::new());
        no_embedding.embedding = None;

        let index = VectorIndex::from_records(vec![
            no_embedding,
            record("embedded", 2, vec![1.0, 0.0]),
        ])
        .unwrap();

        assert_eq!(index.dim(), Some(2));
    }

    #[test]
    fn cosine_handles_zero_vectors() {
        assert_eq!(cosine(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
