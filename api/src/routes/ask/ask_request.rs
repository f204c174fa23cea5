use answerer::{GenerationStats, MatchItem};
use serde::{Deserialize, Serialize};

/// Request payload for /ask.
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    /// Natural language question.
    pub question: String,
    /// Optional override: context window bound.
    #[serde(default)]
    pub top_k: Option<usize>,
    /// Optional override: token budget for the generated answer.
    #[serde(default)]
    pub answer_tokens: Option<u32>,
    /// Stream the answer as plain-text fragments instead of one JSON body.
    /// Falls back to the `STREAM_OUTPUT` default when omitted.
    #[serde(default)]
    pub stream: Option<bool>,
}

/// Response payload for /ask in batch mode.
#[derive(Debug, Serialize)]
pub struct AskResponse {
    /// Final model answer (plain text).
    pub answer: String,
    /// Context chunks the answer was grounded on, rank order.
    pub matches: Vec<MatchItem>,
    /// Timing and token accounting for this query.
    pub stats: GenerationStats,
}
