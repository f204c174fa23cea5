//! Shared LLM service for the document Q&A backend.
//!
//! Wraps the local Ollama HTTP API behind a small typed client:
//! - `POST {endpoint}/api/generate` — batch generation (`stream=false`)
//!   and incremental NDJSON generation (`stream=true`)
//! - `POST {endpoint}/api/embeddings` — query/chunk embeddings
//! - `GET  {endpoint}/api/tags`      — best-effort health probe
//!
//! Construct one [`OllamaService`] per model config and share it behind an
//! `Arc`; the underlying `reqwest::Client` is reused across calls.

pub mod config;
pub mod error_handler;
pub mod health_service;
pub mod ollama;
pub mod telemetry;

pub use config::LlmModelConfig;
pub use error_handler::LlmError;
pub use health_service::{HealthService, HealthStatus};
pub use ollama::{GenChunk, GenStream, Generated, OllamaService};
