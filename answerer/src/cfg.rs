//! Runtime configuration loaded from environment variables.

use std::time::Duration;

use llm_service::LlmModelConfig;

use crate::fuse::ScoreNormalizer;

/// Config bag for the answer session. All fields have defaults via
/// [`AnswerConfig::from_env`].
#[derive(Clone, Debug)]
pub struct AnswerConfig {
    /// JSONL chunk corpus (text + embeddings) the indexes are built from.
    pub chunks_path: String,

    // Retrieval knobs
    pub top_k: usize,
    pub min_score: f32,
    pub normalizer: ScoreNormalizer,

    // Generation knobs
    pub ollama_url: String,
    pub llm_model: String,
    pub embed_model: String,
    pub embedding_dim: usize,
    pub num_predict: u32,
    pub temperature: f32,
    pub answer_timeout: Duration,

    /// Default delivery mode when the caller does not pick one.
    pub stream_output: bool,
}

impl AnswerConfig {
    /// Build from environment variables with defaults matching a local
    /// Ollama setup.
    pub fn from_env() -> Self {
        Self {
            chunks_path: env("CHUNKS_PATH", "./data/chunks.jsonl"),

            top_k: parse("TOP_K", 4usize),
            min_score: parse("MIN_SCORE", 0.25f32),
            normalizer: normalizer_from_env(),

            ollama_url: env("OLLAMA_URL", "http://localhost:11434"),
            llm_model: env("LLM_MODEL", "gemma:2b"),
            embed_model: env("EMBED_MODEL", "nomic-embed-text"),
            embedding_dim: parse("EMBEDDING_DIM", 768usize),
            num_predict: parse("NUM_PREDICT", 350u32),
            temperature: parse("TEMPERATURE", 0.2f32),
            answer_timeout: Duration::from_secs(parse("ANSWER_TIMEOUT", 600u64)),

            stream_output: env("STREAM_OUTPUT", "false") == "true",
        }
    }

    /// Model profile for generation calls.
    pub fn generation_config(&self) -> LlmModelConfig {
        LlmModelConfig {
            model: self.llm_model.clone(),
            endpoint: self.ollama_url.clone(),
            max_tokens: Some(self.num_predict),
            temperature: Some(self.temperature),
            top_p: None,
            timeout_secs: Some(self.answer_timeout.as_secs()),
        }
    }

    /// Model profile for embedding calls.
    pub fn embedding_config(&self) -> LlmModelConfig {
        LlmModelConfig {
            model: self.embed_model.clone(),
            endpoint: self.ollama_url.clone(),
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: Some(self.answer_timeout.as_secs()),
        }
    }
}

/// `FUSION_STRATEGY`: `minmax`, `refmax` (default), or `weighted`
/// (with `VECTOR_WEIGHT` / `LEXICAL_WEIGHT`, both defaulting to 1.0).
fn normalizer_from_env() -> ScoreNormalizer {
    match env("FUSION_STRATEGY", "refmax").to_ascii_lowercase().as_str() {
        "minmax" => ScoreNormalizer::MinMax,
        "weighted" => ScoreNormalizer::WeightedSum {
            vector: parse("VECTOR_WEIGHT", 1.0f32),
            lexical: parse("LEXICAL_WEIGHT", 1.0f32),
        },
        _ => ScoreNormalizer::ReferenceMax,
    }
}

fn env(k: &str, dflt: &str) -> String {
    std::env::var(k).unwrap_or_else(|_| dflt.to_string())
}

fn parse<T: std::str::FromStr>(k: &str, dflt: T) -> T {
    std::env::var(k)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(dflt)
}
