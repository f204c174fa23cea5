//! POST /ask — answers a question against the document corpus.

use std::sync::Arc;

use answerer::AskOptions;
use axum::{
    Json,
    body::Body,
    extract::State,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};

use crate::{
    core::app_state::AppState,
    error_handler::AppError,
    routes::ask::ask_request::{AskRequest, AskResponse},
};

/// Handler: POST /ask
///
/// Batch mode returns one JSON body with the answer, matches, and stats.
/// With `"stream": true` the answer is delivered as plain-text fragments;
/// the context matches ride ahead of the body in the `x-rag-matches`
/// header so clients can render provenance while text is still arriving.
///
/// # Example
/// ```bash
/// curl -X POST http://127.0.0.1:8080/ask \
///   -H 'content-type: application/json' \
///   -d '{"question":"How is the valve released?","top_k":4}'
/// ```
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(body): Json<AskRequest>,
) -> Result<Response, AppError> {
    if body.question.trim().is_empty() {
        return Err(AppError::BadRequest("question must not be empty".into()));
    }

    // Zero fields mean "use env defaults" downstream.
    let opts = AskOptions {
        top_k: body.top_k.unwrap_or(0),
        answer_tokens: body.answer_tokens.unwrap_or(0),
    };

    if body.stream.unwrap_or(state.stream_default) {
        let (matches, stream) = state.session.answer_stream(&body.question, opts).await?;

        let matches_json = serde_json::to_string(&matches).map_err(internal)?;
        let matches_header = HeaderValue::from_str(&matches_json)
            .map_err(|e| internal(format!("unencodable matches header: {e}")))?;

        let response = Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "text/plain; charset=utf-8")
            .header("x-rag-matches", matches_header)
            .body(Body::from_stream(stream))
            .map_err(internal)?;
        Ok(response)
    } else {
        let out = state.session.answer(&body.question, opts).await?;
        Ok(Json(AskResponse {
            answer: out.answer,
            matches: out.matches,
            stats: out.stats,
        })
        .into_response())
    }
}

fn internal(e: impl ToString) -> AppError {
    AppError::Http {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        code: "INTERNAL",
        message: e.to_string(),
    }
}
