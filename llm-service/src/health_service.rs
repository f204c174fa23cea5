//! Health probe for the Ollama backend.
//!
//! Exposes a lightweight check against `GET {endpoint}/api/tags` with a
//! best-effort model-existence verification. The returned [`HealthStatus`]
//! is JSON-serializable and suitable for a `/health` endpoint.
//! [`HealthService::check`] is resilient and never fails (errors are mapped
//! to `ok=false`).

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::LlmModelConfig;
use crate::error_handler::{LlmError, Result, make_snippet};

/// A serializable health snapshot for one endpoint/model pair.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Target endpoint base URL.
    pub endpoint: String,
    /// Model identifier relevant to the probe.
    pub model: String,
    /// Overall health flag.
    pub ok: bool,
    /// Measured HTTP latency in milliseconds for the probe.
    pub latency_ms: u128,
    /// Short human-readable message with details.
    pub message: String,
}

/// Stateless health checker with its own short-timeout HTTP client.
pub struct HealthService {
    client: reqwest::Client,
}

impl HealthService {
    /// Creates a checker with a small probe timeout.
    ///
    /// # Errors
    /// Returns [`LlmError::Transport`] if the HTTP client cannot be built.
    pub fn new(probe_timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(probe_timeout_secs))
            .build()?;
        Ok(Self { client })
    }

    /// Probes the endpoint from `cfg`; never returns an error.
    pub async fn check(&self, cfg: &LlmModelConfig) -> HealthStatus {
        match self.try_probe(cfg).await {
            Ok(status) => status,
            Err(e) => {
                warn!("health probe failed: {e}");
                HealthStatus {
                    endpoint: cfg.endpoint.clone(),
                    model: cfg.model.clone(),
                    ok: false,
                    latency_ms: 0,
                    message: e.to_string(),
                }
            }
        }
    }

    /// Strict probe: `GET /api/tags`, then a best-effort scan for the model.
    ///
    /// # Errors
    /// - [`LlmError::Transport`] on connection failures
    /// - [`LlmError::HttpStatus`] for non-2xx responses
    async fn try_probe(&self, cfg: &LlmModelConfig) -> Result<HealthStatus> {
        let url = format!("{}/api/tags", cfg.endpoint.trim_end_matches('/'));
        debug!("GET {url}");

        let started = Instant::now();
        let resp = self.client.get(&url).send().await?;
        let latency_ms = started.elapsed().as_millis();

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(LlmError::HttpStatus {
                status,
                url,
                snippet: make_snippet(&text),
            });
        }

        // Model presence is advisory only: tags may be paginated or renamed.
        let body = resp.text().await.unwrap_or_default();
        let model_listed = body.contains(&cfg.model);
        let message = if model_listed {
            format!("endpoint reachable, model `{}` listed", cfg.model)
        } else {
            format!("endpoint reachable, model `{}` not listed", cfg.model)
        };

        Ok(HealthStatus {
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            ok: true,
            latency_ms,
            message,
        })
    }
}
