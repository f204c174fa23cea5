use std::sync::Arc;

use answerer::{AnswerConfig, AnswerSession};
use llm_service::{HealthService, LlmModelConfig};

use crate::error_handler::AppError;

/// Shared state for all HTTP handlers.
pub struct AppState {
    /// Query facade over the retrieval indexes and the generation client.
    pub session: AnswerSession,
    /// Probe for the Ollama backend, used by `/health`.
    pub health: HealthService,
    /// Generation model profile the probe reports on.
    pub llm_config: LlmModelConfig,
    /// Delivery mode used when a request does not pick one.
    pub stream_default: bool,
}

impl AppState {
    /// Loads the chunk corpus and wires the session from environment
    /// variables.
    pub fn from_env() -> Result<Arc<Self>, AppError> {
        let cfg = AnswerConfig::from_env();
        let llm_config = cfg.generation_config();
        let stream_default = cfg.stream_output;
        let session = AnswerSession::from_config(cfg)?;
        let health = HealthService::new(5)?;

        Ok(Arc::new(Self {
            session,
            health,
            llm_config,
            stream_default,
        }))
    }
}
