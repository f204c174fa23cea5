//! Fused candidates, the bounded context window, and per-query statistics.

use doc_index::{Origin, ScoredCandidate};
use serde::Serialize;

/// A candidate after fusion: normalized score, final rank, and every origin
/// that retrieved this chunk.
///
/// When both origins return the same `(source_id, page)` chunk, the fused
/// entry keeps the higher-scoring side's score and text and records both
/// origins. Created once per query, discarded when the query completes.
#[derive(Clone, Debug)]
pub struct FusedResult {
    /// The winning candidate; `score` is the normalized fused score.
    pub candidate: ScoredCandidate,
    /// 1-based position in the fused ranking.
    pub fused_rank: usize,
    /// Origins that contributed this chunk, in fixed Vector-first order.
    pub origins: Vec<Origin>,
}

/// Ordered, bounded context selected for prompting.
///
/// Insertion order is rank order. Invariant (enforced by the selector):
/// every entry's score is at or above the configured floor and the length
/// never exceeds `top_k`. An empty window means "no grounding available",
/// which is a valid state, not an error.
#[derive(Clone, Debug, Default)]
pub struct ContextWindow {
    pub entries: Vec<FusedResult>,
}

impl ContextWindow {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FusedResult> {
        self.entries.iter()
    }
}

/// Timing and token accounting for one query.
///
/// Accumulated incrementally while the generation stream runs and finalized
/// when it closes. All timings come from a monotonic clock
/// (`std::time::Instant`). Token counts prefer the generation service's own
/// final-chunk counters; when those are absent they fall back to the
/// documented heuristic in [`crate::stream::approx_tokens`].
#[derive(Clone, Debug, Default, Serialize)]
pub struct GenerationStats {
    /// Combined retrieval call start through fusion completion.
    pub retrieval_seconds: f64,
    /// Generation request start through stream completion.
    pub generation_seconds: f64,
    /// Query start through stream completion.
    pub total_seconds: f64,
    /// Tokens in the constructed prompt.
    pub prompt_tokens: u64,
    /// Tokens generated by the model.
    pub generated_tokens: u64,
}
