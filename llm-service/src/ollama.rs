//! Lightweight Ollama client for text generation and embeddings.
//!
//! This module implements a thin client for the local Ollama API:
//! - `POST {endpoint}/api/generate`   — batch generation (`stream=false`)
//! - `POST {endpoint}/api/generate`   — NDJSON streaming (`stream=true`)
//! - `POST {endpoint}/api/embeddings` — embeddings retrieval
//!
//! The streaming variant yields one [`GenChunk`] per NDJSON line as bytes
//! arrive; Ollama reports token counters (`eval_count`,
//! `prompt_eval_count`) on the final line only.
//!
//! # Examples
//!
//! ```no_run
//! use llm_service::{LlmModelConfig, OllamaService};
//! use futures::StreamExt;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = LlmModelConfig {
//!     model: "gemma:2b".into(),
//!     endpoint: "http://localhost:11434".into(),
//!     max_tokens: Some(350),
//!     temperature: Some(0.2),
//!     top_p: None,
//!     timeout_secs: Some(600),
//! };
//!
//! let svc = OllamaService::new(cfg)?;
//!
//! // Batch generation
//! let out = svc.generate("Write a haiku about paper.").await?;
//! println!("{}", out.response);
//!
//! // Streaming generation
//! let mut stream = svc.generate_stream("Write a haiku about paper.").await?;
//! while let Some(chunk) = stream.next().await {
//!     print!("{}", chunk?.response);
//! }
//! # Ok(()) }
//! ```

use std::pin::Pin;
use std::time::Duration;

use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::config::LlmModelConfig;
use crate::error_handler::{LlmError, Result, make_snippet};

/// Pinned, boxed stream of generation chunks.
pub type GenStream = Pin<Box<dyn Stream<Item = Result<GenChunk>> + Send>>;

/// One NDJSON line of a streaming `/api/generate` response.
///
/// Intermediate lines carry incremental `response` text; the final line has
/// `done=true` and the token counters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GenChunk {
    /// Incremental generated text (may be empty on the final line).
    #[serde(default)]
    pub response: String,
    /// True on the terminal line of the stream.
    #[serde(default)]
    pub done: bool,
    /// Number of generated tokens, reported on the final line.
    pub eval_count: Option<u64>,
    /// Number of prompt tokens, reported on the final line.
    pub prompt_eval_count: Option<u64>,
}

/// Result of a batch (non-streaming) generation call.
#[derive(Debug, Clone)]
pub struct Generated {
    /// Full generated text.
    pub response: String,
    /// Number of generated tokens, when the server reports it.
    pub eval_count: Option<u64>,
    /// Number of prompt tokens, when the server reports it.
    pub prompt_eval_count: Option<u64>,
}

/// Thin client for Ollama.
///
/// Initialized with a full [`LlmModelConfig`]. Reuses an HTTP client with
/// a configurable timeout. Provides:
/// - [`OllamaService::generate`]        — batch text generation
/// - [`OllamaService::generate_stream`] — incremental NDJSON generation
/// - [`OllamaService::embeddings`]      — embeddings retrieval
pub struct OllamaService {
    client: reqwest::Client,
    cfg: LlmModelConfig,
    url_generate: String,
    url_embeddings: String,
}

impl OllamaService {
    /// Creates a new [`OllamaService`] from the given config.
    ///
    /// # Errors
    /// - [`LlmError::InvalidEndpoint`] if `cfg.endpoint` is invalid
    /// - [`LlmError::Transport`] if the HTTP client cannot be built
    pub fn new(cfg: LlmModelConfig) -> Result<Self> {
        let endpoint = cfg.endpoint.trim();
        if endpoint.is_empty()
            || !(endpoint.starts_with("http://") || endpoint.starts_with("https://"))
        {
            return Err(LlmError::InvalidEndpoint(cfg.endpoint));
        }

        let timeout = cfg
            .timeout_secs
            .map(Duration::from_secs)
            .unwrap_or_else(|| Duration::from_secs(600));

        let client = reqwest::Client::builder().timeout(timeout).build()?;

        let base = endpoint.trim_end_matches('/').to_string();
        let url_generate = format!("{}/api/generate", base);
        let url_embeddings = format!("{}/api/embeddings", base);

        Ok(Self {
            client,
            cfg,
            url_generate,
            url_embeddings,
        })
    }

    /// Performs a **non-streaming** generation request via `/api/generate`.
    ///
    /// Mapped options:
    /// - `model`        ← `self.cfg.model`
    /// - `prompt`       ← argument
    /// - `num_predict`  ← `self.cfg.max_tokens`
    /// - `temperature`  ← `self.cfg.temperature`
    /// - `top_p`        ← `self.cfg.top_p`
    ///
    /// # Errors
    /// - [`LlmError::HttpStatus`] for non-2xx responses
    /// - [`LlmError::Transport`] for client errors
    /// - [`LlmError::Decode`] if the response cannot be parsed
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn generate(&self, prompt: &str) -> Result<Generated> {
        let body = GenerateRequest::from_cfg(&self.cfg, prompt, false);

        debug!("POST {}", self.url_generate);
        let resp = self
            .client
            .post(&self.url_generate)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_generate.clone();
            let text = resp.text().await.unwrap_or_default();
            return Err(LlmError::HttpStatus {
                status,
                url,
                snippet: make_snippet(&text),
            });
        }

        let out: GenerateResponse = resp.json().await.map_err(|e| {
            LlmError::Decode(format!("serde error: {e}; ensure `stream=false` is used"))
        })?;

        Ok(Generated {
            response: out.response,
            eval_count: out.eval_count,
            prompt_eval_count: out.prompt_eval_count,
        })
    }

    /// Starts a **streaming** generation request via `/api/generate`.
    ///
    /// Returns a stream of [`GenChunk`] items decoded from NDJSON lines in
    /// arrival order. An undecodable line is surfaced as
    /// [`LlmError::Decode`] for that item only; the stream continues with
    /// the next line. Dropping the stream closes the upstream connection.
    ///
    /// # Errors
    /// - [`LlmError::HttpStatus`] for non-2xx responses (before streaming)
    /// - [`LlmError::Transport`] for client errors
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn generate_stream(&self, prompt: &str) -> Result<GenStream> {
        let body = GenerateRequest::from_cfg(&self.cfg, prompt, true);

        debug!("POST {} (stream)", self.url_generate);
        let resp = self
            .client
            .post(&self.url_generate)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_generate.clone();
            let text = resp.text().await.unwrap_or_default();
            return Err(LlmError::HttpStatus {
                status,
                url,
                snippet: make_snippet(&text),
            });
        }

        // Re-frame the byte stream into NDJSON lines. A TCP chunk may carry
        // zero, one, or several lines, so a small carry-over buffer is kept
        // between chunks.
        let stream = resp
            .bytes_stream()
            .scan(Vec::<u8>::new(), |buf, chunk| {
                let items: Vec<Result<GenChunk>> = match chunk {
                    Ok(bytes) => {
                        buf.extend_from_slice(&bytes);
                        drain_lines(buf)
                    }
                    Err(e) => vec![Err(LlmError::Transport(e))],
                };
                futures::future::ready(Some(futures::stream::iter(items)))
            })
            .flatten();

        Ok(Box::pin(stream))
    }

    /// Retrieves embeddings via `/api/embeddings`.
    ///
    /// **Note:** usually a dedicated embedding model is used; create a
    /// separate [`OllamaService`] with the embedding config.
    ///
    /// # Errors
    /// - [`LlmError::HttpStatus`] for non-2xx responses
    /// - [`LlmError::Transport`] for client errors
    /// - [`LlmError::Decode`] if the response cannot be parsed
    #[instrument(skip_all, fields(model = %self.cfg.model))]
    pub async fn embeddings(&self, input: &str) -> Result<Vec<f32>> {
        let body = EmbeddingsRequest {
            model: &self.cfg.model,
            input,
        };

        debug!("POST {}", self.url_embeddings);
        let resp = self
            .client
            .post(&self.url_embeddings)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let url = self.url_embeddings.clone();
            let text = resp.text().await.unwrap_or_default();
            return Err(LlmError::HttpStatus {
                status,
                url,
                snippet: make_snippet(&text),
            });
        }

        let out: EmbeddingsResponse = resp.json().await.map_err(|e| {
            LlmError::Decode(format!(
                "serde error: {e}; expected `{{ embedding: number[] }}`"
            ))
        })?;

        Ok(out.embedding)
    }
}

/// Split complete `\n`-terminated lines out of `buf` and decode each one.
/// Incomplete trailing data stays in `buf` for the next chunk.
fn drain_lines(buf: &mut Vec<u8>) -> Vec<Result<GenChunk>> {
    let mut items = Vec::new();
    while let Some(pos) = buf.iter().position(|&b| b == b'\n') {
        let line: Vec<u8> = buf.drain(..=pos).collect();
        let line = &line[..line.len() - 1];
        if line.is_empty() {
            continue;
        }
        match serde_json::from_slice::<GenChunk>(line) {
            Ok(chunk) => items.push(Ok(chunk)),
            Err(e) => {
                warn!("undecodable stream line ({e})");
                items.push(Err(LlmError::Decode(format!("stream line: {e}"))));
            }
        }
    }
    items
}

/* ==========================
HTTP payloads & options
========================== */

/// Request body for `/api/generate`.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<GenerateOptions>,
}

impl<'a> GenerateRequest<'a> {
    /// Builds a request from config and prompt.
    fn from_cfg(cfg: &'a LlmModelConfig, prompt: &'a str, stream: bool) -> Self {
        let options = GenerateOptions {
            temperature: cfg.temperature,
            top_p: cfg.top_p,
            num_predict: cfg.max_tokens,
        };

        Self {
            model: &cfg.model,
            prompt,
            stream,
            options: Some(options),
        }
    }
}

/// Subset of Ollama `options`.
#[derive(Debug, Default, Serialize)]
struct GenerateOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    num_predict: Option<u32>,
}

/// Response body for `/api/generate` with `stream=false`.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    eval_count: Option<u64>,
    prompt_eval_count: Option<u64>,
}

/// Request body for `/api/embeddings`.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    input: &'a str,
}

/// Response body for `/api/embeddings`.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    #[serde(alias = "embedding")]
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_lines_splits_complete_lines_and_keeps_tail() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"{\"response\":\"Hel\",\"done\":false}\n{\"response\":\"lo\",\"done\":false}\n{\"resp");

        let items = drain_lines(&mut buf);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().response, "Hel");
        assert_eq!(items[1].as_ref().unwrap().response, "lo");
        // Partial line stays buffered.
        assert_eq!(buf, b"{\"resp");
    }

    #[test]
    fn drain_lines_reports_bad_line_and_continues() {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"not json\n{\"response\":\"ok\",\"done\":true,\"eval_count\":7}\n");

        let items = drain_lines(&mut buf);
        assert_eq!(items.len(), 2);
        assert!(matches!(items[0], Err(LlmError::Decode(_))));
        let last = items[1].as_ref().unwrap();
        assert!(last.done);
        assert_eq!(last.eval_count, Some(7));
    }

    #[test]
    fn invalid_endpoint_is_rejected() {
        let cfg = LlmModelConfig {
            model: "gemma:2b".into(),
            endpoint: "localhost:11434".into(),
            max_tokens: None,
            temperature: None,
            top_p: None,
            timeout_secs: None,
        };
        assert!(matches!(
            OllamaService::new(cfg),
            Err(LlmError::InvalidEndpoint(_))
        ));
    }
}
