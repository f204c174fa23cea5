//! GET /health — probes the generation backend.

use std::sync::Arc;

use axum::{Json, extract::State};
use llm_service::HealthStatus;

use crate::core::app_state::AppState;

/// Handler: GET /health
///
/// Never fails; an unreachable backend is reported as `ok: false`.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthStatus> {
    Json(state.health.check(&state.llm_config).await)
}
