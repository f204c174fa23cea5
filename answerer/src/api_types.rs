//! Caller-facing types returned by the answer session.

use serde::Serialize;

use crate::candidate::{FusedResult, GenerationStats};

/// One context match reported back to the caller: provenance, normalized
/// score, and which retrieval origins contributed it (`vector`, `lexical`,
/// or `vector+lexical`).
#[derive(Clone, Debug, Serialize)]
pub struct MatchItem {
    pub source: String,
    pub page: u32,
    pub score: f32,
    pub origin: String,
}

impl MatchItem {
    pub(crate) fn from_fused(f: &FusedResult) -> Self {
        Self {
            source: f.candidate.source_id.clone(),
            page: f.candidate.page,
            score: f.candidate.score,
            origin: f
                .origins
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("+"),
        }
    }
}

/// Complete batch answer: the generated text, the context matches that
/// grounded it, and per-query timing/token statistics.
#[derive(Clone, Debug, Serialize)]
pub struct AnswerOutcome {
    pub answer: String,
    pub matches: Vec<MatchItem>,
    pub stats: GenerationStats,
}

/// Per-query overrides. Zero means "use the environment-driven default".
#[derive(Clone, Copy, Debug, Default)]
pub struct AskOptions {
    /// Context window bound.
    pub top_k: usize,
    /// Token budget for the generated answer.
    pub answer_tokens: u32,
}
