//! Core data models shared by retrieval backends and the answer pipeline.

use serde::{Deserialize, Serialize};

/// Which retrieval strategy produced a candidate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// Dense nearest-neighbor search over chunk embeddings.
    Vector,
    /// Sparse BM25+ term matching.
    Lexical,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::Vector => f.write_str("vector"),
            Origin::Lexical => f.write_str("lexical"),
        }
    }
}

/// One document chunk as stored in the JSONL dump produced by ingestion.
///
/// `source_file` + `page_number` identify where the chunk came from; the
/// optional `embedding` is precomputed by the ingestion step.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: String,
    pub source_file: String,
    pub page_number: u32,
    pub text: String,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
}

/// A retrieved chunk plus its origin-specific score and provenance.
///
/// `score` is only meaningful within its origin (cosine similarity for
/// [`Origin::Vector`], a BM25+ weight for [`Origin::Lexical`]) and must be
/// normalized before any cross-origin comparison. Candidates are immutable
/// once created.
#[derive(Clone, Debug)]
pub struct ScoredCandidate {
    pub source_id: String,
    pub page: u32,
    pub text: String,
    pub score: f32,
    pub origin: Origin,
}

impl ScoredCandidate {
    /// Builds a candidate from a chunk record and an origin-specific score.
    pub fn from_record(record: &ChunkRecord, score: f32, origin: Origin) -> Self {
        Self {
            source_id: record.source_file.clone(),
            page: record.page_number,
            text: record.text.clone(),
            score,
            origin,
        }
    }
}
