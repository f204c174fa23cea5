//! Context Selector: score floor, then count bound.

use crate::candidate::{ContextWindow, FusedResult};

/// Trims the fused list to a bounded context window.
///
/// Applies the `min_score` floor first, then truncates to the first `top_k`
/// surviving entries in rank order. An empty result means "no grounding
/// available" and is handed to the prompt builder as such, never treated as
/// an error. Deterministic for identical inputs and parameters.
pub fn select(fused: Vec<FusedResult>, top_k: usize, min_score: f32) -> ContextWindow {
    let mut entries: Vec<FusedResult> = fused
        .into_iter()
        .filter(|f| f.candidate.score >= min_score)
        .collect();
    entries.truncate(top_k);
    ContextWindow { entries }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doc_index::{Origin, ScoredCandidate};

    fn fused(source: &str, score: f32, rank: usize) -> FusedResult {
        FusedResult {
            candidate: ScoredCandidate {
                source_id: source.into(),
                page: 1,
                text: source.into(),
                score,
                origin: Origin::Vector,
            },
            fused_rank: rank,
            origins: vec![Origin::Vector],
        }
    }

    #[test]
    fn floor_then_truncate() {
        let input = vec![
            fused("a", 0.9, 1),
            fused("b", 0.7, 2),
            fused("c", 0.4, 3),
            fused("d", 0.1, 4),
        ];

        let window = select(input, 2, 0.25);
        assert_eq!(window.len(), 2);
        assert!(window.iter().all(|f| f.candidate.score >= 0.25));
        assert_eq!(window.entries[0].candidate.source_id, "a");
        assert_eq!(window.entries[1].candidate.source_id, "b");
    }

    #[test]
    fn floor_removing_everything_yields_empty_window() {
        let input = vec![fused("a", 0.1, 1)];
        let window = select(input, 4, 0.5);
        assert!(window.is_empty());
    }

    #[test]
    fn empty_input_is_fine() {
        let window = select(Vec::new(), 4, 0.25);
        assert!(window.is_empty());
    }
}
