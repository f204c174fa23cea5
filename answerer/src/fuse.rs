//! Fusion Engine: merge two origin-ranked candidate lists into one.
//!
//! Cosine similarities and BM25+ weights live on different scales, so each
//! origin's scores are normalized independently before any comparison. The
//! normalization rule is an explicit, swappable strategy so the fusion
//! policy can be tested in isolation.
//!
//! `fuse` is a pure function: no I/O, and identical inputs always produce
//! the identical sequence regardless of which retrieval finished first.

use std::collections::HashMap;

use doc_index::{Origin, ScoredCandidate};

use crate::candidate::FusedResult;

/// Per-origin score normalization strategy.
///
/// Every strategy first clamps non-finite or negative input scores to
/// `0.0`; retrieval sources are trusted but not assumed well-formed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScoreNormalizer {
    /// `(s - min) / (max - min)` within the origin's list.
    MinMax,
    /// `s / max` within the origin's list. The default policy.
    ReferenceMax,
    /// Reference-max scaling multiplied by a fixed per-origin weight.
    WeightedSum { vector: f32, lexical: f32 },
}

impl Default for ScoreNormalizer {
    fn default() -> Self {
        ScoreNormalizer::ReferenceMax
    }
}

impl ScoreNormalizer {
    /// Normalizes one origin's scores, preserving list order.
    fn normalized_scores(&self, origin: Origin, list: &[ScoredCandidate]) -> Vec<f32> {
        let scores: Vec<f32> = list.iter().map(|c| sanitize(c.score)).collect();
        let max = scores.iter().copied().fold(0.0f32, f32::max);

        match self {
            ScoreNormalizer::MinMax => {
                let min = scores.iter().copied().fold(f32::INFINITY, f32::min);
                scores
                    .iter()
                    .map(|&s| {
                        if max > min {
                            (s - min) / (max - min)
                        } else if max > 0.0 {
                            // Degenerate list: every score equal and positive.
                            1.0
                        } else {
                            0.0
                        }
                    })
                    .collect()
            }
            ScoreNormalizer::ReferenceMax => scores
                .iter()
                .map(|&s| if max > 0.0 { s / max } else { 0.0 })
                .collect(),
            ScoreNormalizer::WeightedSum { vector, lexical } => {
                let weight = match origin {
                    Origin::Vector => sanitize(*vector),
                    Origin::Lexical => sanitize(*lexical),
                };
                scores
                    .iter()
                    .map(|&s| if max > 0.0 { weight * s / max } else { 0.0 })
                    .collect()
            }
        }
    }
}

fn sanitize(score: f32) -> f32 {
    if score.is_finite() && score > 0.0 {
        score
    } else {
        0.0
    }
}

/// Merges vector and lexical results into one deduplicated, ranked list.
///
/// - Dedup key is `(source_id, page)`; chunk-text truncation differences do
///   not affect identity. On a key collision the higher normalized score
///   wins and its text is kept, with both origins recorded.
/// - Output is sorted by normalized score descending; ties break by origin
///   priority (Vector before Lexical), then by the winner's original rank
///   within its origin list.
pub fn fuse(
    vector_results: &[ScoredCandidate],
    lexical_results: &[ScoredCandidate],
    normalizer: &ScoreNormalizer,
) -> Vec<FusedResult> {
    struct Slot {
        candidate: ScoredCandidate,
        origins: Vec<Origin>,
        best_origin: Origin,
        best_rank: usize,
    }

    let mut slots: Vec<Slot> = Vec::new();
    let mut by_key: HashMap<(String, u32), usize> = HashMap::new();

    // Fixed processing order (Vector first) keeps the result independent of
    // retrieval arrival order.
    for (origin, list) in [
        (Origin::Vector, vector_results),
        (Origin::Lexical, lexical_results),
    ] {
        let scores = normalizer.normalized_scores(origin, list);
        for (rank, (cand, score)) in list.iter().zip(scores).enumerate() {
            let key = (cand.source_id.clone(), cand.page);
            match by_key.get(&key) {
                Some(&i) => {
                    let slot = &mut slots[i];
                    if score > slot.candidate.score {
                        slot.candidate.score = score;
                        slot.candidate.text = cand.text.clone();
                        slot.candidate.origin = origin;
                        slot.best_origin = origin;
                        slot.best_rank = rank;
                    }
                    if !slot.origins.contains(&origin) {
                        slot.origins.push(origin);
                    }
                }
                None => {
                    by_key.insert(key, slots.len());
                    let mut candidate = cand.clone();
                    candidate.score = score;
                    slots.push(Slot {
                        candidate,
                        origins: vec![origin],
                        best_origin: origin,
                        best_rank: rank,
                    });
                }
            }
        }
    }

    slots.sort_by(|a, b| {
        b.candidate
            .score
            .total_cmp(&a.candidate.score)
            .then_with(|| a.best_origin.cmp(&b.best_origin))
            .then_with(|| a.best_rank.cmp(&b.best_rank))
    });

    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| FusedResult {
            candidate: slot.candidate,
            fused_rank: i + 1,
            origins: slot.origins,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(source: &str, page: u32, score: f32, origin: Origin) -> ScoredCandidate {
        ScoredCandidate {
            source_id: source.into(),
            page,
            text: format!("{source} p{page} via {origin} at {score}"),
            score,
            origin,
        }
    }

    #[test]
    fn empty_inputs_produce_empty_output() {
        assert!(fuse(&[], &[], &ScoreNormalizer::default()).is_empty());
    }

    #[test]
    fn duplicate_chunk_is_merged_keeping_higher_score_and_both_origins() {
        // Doc A found by both sides, doc B lexical-only.
        let vector = vec![cand("docA.pdf", 1, 0.81, Origin::Vector)];
        let lexical = vec![
            cand("docA.pdf", 1, 6.2, Origin::Lexical),
            cand("docB.pdf", 3, 3.1, Origin::Lexical),
        ];

        let fused = fuse(&vector, &lexical, &ScoreNormalizer::ReferenceMax);
        assert_eq!(fused.len(), 2);

        let first = &fused[0];
        assert_eq!(first.candidate.source_id, "docA.pdf");
        assert_eq!(first.fused_rank, 1);
        assert_eq!(first.origins, vec![Origin::Vector, Origin::Lexical]);
        assert!((first.candidate.score - 1.0).abs() < 1e-6);

        let second = &fused[1];
        assert_eq!(second.candidate.source_id, "docB.pdf");
        assert_eq!(second.fused_rank, 2);
        assert!((second.candidate.score - 3.1 / 6.2).abs() < 1e-6);
    }

    #[test]
    fn output_is_independent_of_retrieval_arrival_order() {
        // Arguments are positional; fusing the same lists twice must yield
        // the identical sequence (order and scores).
        let vector = vec![
            cand("a.pdf", 1, 0.9, Origin::Vector),
            cand("b.pdf", 2, 0.5, Origin::Vector),
        ];
        let lexical = vec![
            cand("c.pdf", 4, 8.0, Origin::Lexical),
            cand("a.pdf", 1, 4.0, Origin::Lexical),
        ];

        let once = fuse(&vector, &lexical, &ScoreNormalizer::default());
        let twice = fuse(&vector, &lexical, &ScoreNormalizer::default());

        let shape = |fused: &[FusedResult]| {
            fused
                .iter()
                .map(|f| (f.candidate.source_id.clone(), f.candidate.score, f.fused_rank))
                .collect::<Vec<_>>()
        };
        assert_eq!(shape(&once), shape(&twice));
    }

    #[test]
    fn ties_prefer_vector_then_original_rank() {
        // Both lists normalize their top entry to 1.0.
        let vector = vec![cand("v.pdf", 1, 0.7, Origin::Vector)];
        let lexical = vec![cand("l.pdf", 1, 5.0, Origin::Lexical)];

        let fused = fuse(&vector, &lexical, &ScoreNormalizer::ReferenceMax);
        assert_eq!(fused[0].candidate.source_id, "v.pdf");
        assert_eq!(fused[1].candidate.source_id, "l.pdf");
    }

    #[test]
    fn non_finite_and_negative_scores_are_clamped_to_zero() {
        let vector = vec![
            cand("nan.pdf", 1, f32::NAN, Origin::Vector),
            cand("neg.pdf", 2, -0.4, Origin::Vector),
            cand("ok.pdf", 3, 0.6, Origin::Vector),
        ];

        let fused = fuse(&vector, &[], &ScoreNormalizer::ReferenceMax);
        assert_eq!(fused.len(), 3);
        assert_eq!(fused[0].candidate.source_id, "ok.pdf");
        assert_eq!(fused[1].candidate.score, 0.0);
        assert_eq!(fused[2].candidate.score, 0.0);
    }

    #[test]
    fn min_max_handles_degenerate_lists() {
        let all_equal = vec![
            cand("a.pdf", 1, 2.0, Origin::Lexical),
            cand("b.pdf", 2, 2.0, Origin::Lexical),
        ];
        let fused = fuse(&[], &all_equal, &ScoreNormalizer::MinMax);
        assert!(fused.iter().all(|f| f.candidate.score == 1.0));

        let all_zero = vec![cand("z.pdf", 1, 0.0, Origin::Lexical)];
        let fused = fuse(&[], &all_zero, &ScoreNormalizer::MinMax);
        assert_eq!(fused[0].candidate.score, 0.0);
    }

    #[test]
    fn weighted_sum_applies_per_origin_weights() {
        let vector = vec![cand("v.pdf", 1, 0.8, Origin::Vector)];
        let lexical = vec![cand("l.pdf", 2, 4.0, Origin::Lexical)];

        let normalizer = ScoreNormalizer::WeightedSum {
            vector: 1.0,
            lexical: 0.5,
        };
        let fused = fuse(&vector, &lexical, &normalizer);
        assert_eq!(fused[0].candidate.source_id, "v.pdf");
        assert!((fused[0].candidate.score - 1.0).abs() < 1e-6);
        assert!((fused[1].candidate.score - 0.5).abs() < 1e-6);
    }
}
