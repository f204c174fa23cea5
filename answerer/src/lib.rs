//! Hybrid retrieval + grounded answer generation.
//!
//! Public API: [`AnswerSession`]. One session wraps the two retrieval
//! indexes and the generation client; each query runs both retrievals
//! concurrently, fuses and deduplicates the candidates, selects a bounded
//! context window, builds a grounded prompt, and asks the model — either
//! as one batch call ([`AnswerSession::answer`]) or as an incremental
//! fragment stream ([`AnswerSession::answer_stream`]).
//!
//! Both modes report the same context matches and the same
//! timing/token-accounting semantics; they differ only in delivery.

pub mod cfg;

mod api_types;
mod candidate;
mod error;
mod fuse;
mod prompt;
mod retrieval;
mod select;
mod stream;

pub use api_types::{AnswerOutcome, AskOptions, MatchItem};
pub use candidate::{ContextWindow, FusedResult, GenerationStats};
pub use cfg::AnswerConfig;
pub use error::AnswerError;
pub use fuse::{ScoreNormalizer, fuse};
pub use prompt::{approx_tokens_to_words, build_prompt};
pub use select::select;
pub use stream::{AnswerStream, GenerationBackend, GenerationStreamer, StreamState, approx_tokens};

use std::sync::Arc;
use std::time::Instant;

use doc_index::{Bm25Index, LexicalSearch, OllamaEmbedder, VectorIndex, VectorRetriever, VectorSearch};
use llm_service::OllamaService;
use tracing::{info, instrument};

use crate::error::map_generation_error;
use crate::stream::StatsSeed;

/// One query's prepared state: everything up to the generation call.
struct Prepared {
    matches: Vec<MatchItem>,
    prompt: String,
    retrieval_seconds: f64,
    query_start: Instant,
}

/// Long-lived query facade over the retrieval indexes and the generation
/// client. Sessions are cheap to share behind an `Arc`; all state is
/// read-only after construction.
pub struct AnswerSession {
    vector: Box<dyn VectorSearch>,
    lexical: Box<dyn LexicalSearch>,
    generator: Arc<dyn GenerationBackend>,
    cfg: AnswerConfig,
}

impl AnswerSession {
    /// Assembles a session from explicit parts. Used by tests and by
    /// callers that bring their own retrieval or generation backends.
    pub fn new(
        vector: Box<dyn VectorSearch>,
        lexical: Box<dyn LexicalSearch>,
        generator: Arc<dyn GenerationBackend>,
        cfg: AnswerConfig,
    ) -> Self {
        Self {
            vector,
            lexical,
            generator,
            cfg,
        }
    }

    /// Builds the full Ollama-backed session: loads the JSONL chunk dump
    /// once, constructs both indexes over it, and wires up the embedding
    /// and generation clients.
    ///
    /// # Errors
    /// - [`AnswerError::Index`] if the chunk dump cannot be read or its
    ///   embeddings disagree in size.
    /// - [`AnswerError::Llm`] if an Ollama endpoint is invalid.
    pub fn from_config(cfg: AnswerConfig) -> Result<Self, AnswerError> {
        let records = doc_index::read_chunks(&cfg.chunks_path)?;
        info!("loaded {} chunks from {}", records.len(), cfg.chunks_path);

        let lexical = Bm25Index::build(&records);
        let vector_index = VectorIndex::from_records(records)?;

        let embed_svc = Arc::new(OllamaService::new(cfg.embedding_config())?);
        let dim = vector_index.dim().unwrap_or(cfg.embedding_dim);
        let embedder = Arc::new(OllamaEmbedder::new(embed_svc, dim));
        let vector = VectorRetriever::new(vector_index, embedder);

        let generator = Arc::new(OllamaService::new(cfg.generation_config())?);

        Ok(Self::new(
            Box::new(vector),
            Box::new(lexical),
            generator,
            cfg,
        ))
    }

    /// Convenience constructor using environment-driven defaults.
    pub fn from_env() -> Result<Self, AnswerError> {
        Self::from_config(AnswerConfig::from_env())
    }

    /// Retrieval, fusion, selection, and prompt construction for one
    /// question. Shared verbatim by both answer modes.
    async fn prepare(&self, question: &str, opts: AskOptions) -> Result<Prepared, AnswerError> {
        let query_start = Instant::now();

        let top_k = if opts.top_k == 0 {
            self.cfg.top_k
        } else {
            opts.top_k
        };
        let answer_tokens = if opts.answer_tokens == 0 {
            self.cfg.num_predict
        } else {
            opts.answer_tokens
        };

        let (vector_hits, lexical_hits) = retrieval::gather(
            self.vector.as_ref(),
            self.lexical.as_ref(),
            question,
            top_k,
        )
        .await?;

        let fused = fuse(&vector_hits, &lexical_hits, &self.cfg.normalizer);
        let window = select(fused, top_k, self.cfg.min_score);
        let retrieval_seconds = query_start.elapsed().as_secs_f64();

        let matches = window.iter().map(MatchItem::from_fused).collect();
        let prompt = build_prompt(question, &window, approx_tokens_to_words(answer_tokens));

        Ok(Prepared {
            matches,
            prompt,
            retrieval_seconds,
            query_start,
        })
    }

    /// Answers one question as a single batch call.
    ///
    /// # Errors
    /// - [`AnswerError::RetrievalUnavailable`] when both retrievals fail.
    /// - [`AnswerError::GenerationTimeout`] past the configured deadline.
    /// - [`AnswerError::GenerationUnavailable`] for other service failures.
    #[instrument(skip_all)]
    pub async fn answer(
        &self,
        question: &str,
        opts: AskOptions,
    ) -> Result<AnswerOutcome, AnswerError> {
        let prepared = self.prepare(question, opts).await?;

        let generation_start = Instant::now();
        let generated = self
            .generator
            .generate(&prepared.prompt)
            .await
            .map_err(|e| map_generation_error(e, self.cfg.answer_timeout))?;

        let stats = GenerationStats {
            retrieval_seconds: prepared.retrieval_seconds,
            generation_seconds: generation_start.elapsed().as_secs_f64(),
            total_seconds: prepared.query_start.elapsed().as_secs_f64(),
            prompt_tokens: generated
                .prompt_eval_count
                .unwrap_or_else(|| approx_tokens(&prepared.prompt)),
            generated_tokens: generated
                .eval_count
                .unwrap_or_else(|| approx_tokens(&generated.response)),
        };
        info!(
            matches = prepared.matches.len(),
            retrieval_s = format!("{:.2}", stats.retrieval_seconds),
            generation_s = format!("{:.2}", stats.generation_seconds),
            prompt_tokens = stats.prompt_tokens,
            generated_tokens = stats.generated_tokens,
            "batch answer complete"
        );

        Ok(AnswerOutcome {
            answer: generated.response,
            matches: prepared.matches,
            stats,
        })
    }

    /// Answers one question incrementally.
    ///
    /// The context matches are returned immediately, before the first text
    /// fragment, so callers can render provenance while the model is still
    /// generating. Fragments arrive on the [`AnswerStream`] in production
    /// order; final statistics are logged when the stream closes.
    ///
    /// # Errors
    /// Same taxonomy as [`AnswerSession::answer`] for failures before
    /// streaming starts; failures mid-stream arrive as the stream's last
    /// item.
    #[instrument(skip_all)]
    pub async fn answer_stream(
        &self,
        question: &str,
        opts: AskOptions,
    ) -> Result<(Vec<MatchItem>, AnswerStream), AnswerError> {
        let prepared = self.prepare(question, opts).await?;

        let generation_start = Instant::now();
        let source = self
            .generator
            .generate_stream(&prepared.prompt)
            .await
            .map_err(|e| map_generation_error(e, self.cfg.answer_timeout))?;

        let streamer = GenerationStreamer::new(source, self.cfg.answer_timeout);
        let seed = StatsSeed {
            retrieval_seconds: prepared.retrieval_seconds,
            prompt_tokens_estimate: approx_tokens(&prepared.prompt),
            query_start: prepared.query_start,
            generation_start,
        };

        Ok((prepared.matches, stream::forward(streamer, seed)))
    }
}
