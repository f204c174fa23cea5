use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Public application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // --- IO / network / server ---
    #[error("failed to bind listener")]
    Bind(#[source] std::io::Error),

    #[error("server error")]
    Server(#[source] std::io::Error),

    // --- Request / routing ---
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Rich HTTP error mapped from lower layers with specific status & code.
    #[error("{message}")]
    Http {
        status: StatusCode,
        code: &'static str,
        message: String,
    },
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Http { status, .. } => *status,
            AppError::Bind(_) | AppError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            AppError::Bind(_) => "BIND_ERROR",
            AppError::Server(_) => "SERVER_ERROR",
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Http { code, .. } => code,
        }
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = ErrorBody {
            error: self.error_code(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

/// Handy result alias used across handlers.
pub type AppResult<T> = Result<T, AppError>;

/// Convert common Axum rejections to `AppError`.
impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(err: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(err.to_string())
    }
}

/// Convert pipeline failures to `AppError::Http` with precise status & code.
///
/// A degraded single-origin retrieval never reaches here; only both sides
/// failing surfaces as 503.
impl From<answerer::AnswerError> for AppError {
    fn from(err: answerer::AnswerError) -> Self {
        use answerer::AnswerError;

        match &err {
            AnswerError::RetrievalUnavailable(_) => AppError::Http {
                status: StatusCode::SERVICE_UNAVAILABLE,
                code: "RETRIEVAL_UNAVAILABLE",
                message: err.to_string(),
            },
            AnswerError::GenerationTimeout(_) => AppError::Http {
                status: StatusCode::GATEWAY_TIMEOUT,
                code: "GENERATION_TIMEOUT",
                message: err.to_string(),
            },
            AnswerError::GenerationUnavailable(_) | AnswerError::Llm(_) => AppError::Http {
                status: StatusCode::BAD_GATEWAY,
                code: "GENERATION_UNAVAILABLE",
                message: err.to_string(),
            },
            AnswerError::Index(_) => AppError::Http {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                code: "INDEX_ERROR",
                message: err.to_string(),
            },
        }
    }
}

impl From<llm_service::LlmError> for AppError {
    fn from(err: llm_service::LlmError) -> Self {
        AppError::Http {
            status: StatusCode::BAD_GATEWAY,
            code: "LLM_ERROR",
            message: err.to_string(),
        }
    }
}
