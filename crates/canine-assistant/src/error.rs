use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use canine_common::openai::OpenAiClientError;
use source_router::RouterError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(String),

    #[error(transparent)]
    Router(#[from] RouterError),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("completion failed: {0}")]
    Completion(#[from] OpenAiClientError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            AppError::Completion(e) => {
                error!(error = %e, "completion request failed");
                (
                    StatusCode::BAD_GATEWAY,
                    "the assistant is unavailable right now, please try again".to_string(),
                )
            }
            AppError::Config(_) | AppError::Router(_) => {
                error!(error = %self, "unexpected startup error while serving");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                )
            }
        };
        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
