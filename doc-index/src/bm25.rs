//! In-process BM25+ lexical index.
//!
//! BM25+ adds a floor term (`delta`) to the classic BM25 numerator so long
//! documents that do match a term are never scored to zero. Scores are
//! unbounded and non-negative; they are only comparable to other BM25+
//! scores from the same corpus.

use std::collections::HashMap;

use tracing::{debug, info};

use crate::record::{ChunkRecord, Origin, ScoredCandidate};

/// Standard BM25 saturation parameter.
const K1: f32 = 1.5;
/// Standard BM25 length-normalization parameter.
const B: f32 = 0.75;
/// BM25+ additive floor against length-normalization bias.
const DELTA: f32 = 1.0;

/// Per-document statistics kept by the index.
struct DocEntry {
    source_file: String,
    page_number: u32,
    text: String,
    tf: HashMap<String, u32>,
    len: u32,
}

/// Read-only BM25+ index over document chunks.
pub struct Bm25Index {
    docs: Vec<DocEntry>,
    df: HashMap<String, u32>,
    avgdl: f32,
}

impl Bm25Index {
    /// Builds tf/df/length statistics from chunk records.
    pub fn build(records: &[ChunkRecord]) -> Self {
        let mut docs = Vec::with_capacity(records.len());
        let mut df: HashMap<String, u32> = HashMap::new();
        let mut total_len: u64 = 0;

        for record in records {
            let tokens = tokenize(&record.text);
            let len = tokens.len() as u32;
            total_len += u64::from(len);

            let mut tf: HashMap<String, u32> = HashMap::new();
            for token in tokens {
                *tf.entry(token).or_insert(0) += 1;
            }
            for term in tf.keys() {
                *df.entry(term.clone()).or_insert(0) += 1;
            }

            docs.push(DocEntry {
                source_file: record.source_file.clone(),
                page_number: record.page_number,
                text: record.text.clone(),
                tf,
                len,
            });
        }

        let avgdl = if docs.is_empty() {
            0.0
        } else {
            total_len as f32 / docs.len() as f32
        };

        info!("Bm25Index ready: {} docs, avgdl={avgdl:.1}", docs.len());
        Self { docs, df, avgdl }
    }

    /// Scores the query against every document and returns the top-k
    /// matches with non-zero scores, best first. Ties break by document
    /// position so the output is deterministic.
    pub fn search(&self, query: &str, top_k: usize) -> Vec<ScoredCandidate> {
        let query_tokens = tokenize(query);
        if query_tokens.is_empty() || self.docs.is_empty() {
            return Vec::new();
        }
        debug!(
            "bm25 search: {} docs, {} query terms, top_k={top_k}",
            self.docs.len(),
            query_tokens.len()
        );

        let n = self.docs.len() as f32;
        let mut scored: Vec<(usize, f32)> = Vec::new();

        for (idx, doc) in self.docs.iter().enumerate() {
            let mut score = 0.0f32;
            for term in &query_tokens {
                let Some(&f) = doc.tf.get(term) else {
                    continue;
                };
                let f = f as f32;
                let df_term = self.df.get(term).copied().unwrap_or(0) as f32;
                // Smoothed IDF, never negative.
                let idf = (1.0 + (n - df_term + 0.5) / (df_term + 0.5)).ln();
                // BM25+ numerator uses (f + delta) to lessen length bias.
                let norm = (f + DELTA) * (K1 + 1.0)
                    / (f + K1 * (1.0 - B + B * doc.len as f32 / self.avgdl));
                score += idf * norm;
            }
            if score > 0.0 {
                scored.push((idx, score));
            }
        }

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(top_k);

        scored
            .into_iter()
            .map(|(idx, score)| {
                let doc = &self.docs[idx];
                ScoredCandidate {
                    source_id: doc.source_file.clone(),
                    page: doc.page_number,
                    text: doc.text.clone(),
                    score,
                    origin: Origin::Lexical,
                }
            })
            .collect()
    }
}

/// Lowercased alphanumeric tokens, dropping very short ones.
///
/// Intentionally minimal; stemming and stopword handling belong to a real
/// analyzer, not this index.
fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .filter(|w| w.chars().all(char::is_alphanumeric) && w.len() > 2)
        .map(str::to_lowercase)
        .collect()
}
