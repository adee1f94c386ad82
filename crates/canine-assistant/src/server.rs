use std::sync::Arc;

use axum::extract::{DefaultBodyLimit, State};
use axum::routing::{get, post};
use axum::{middleware, Json, Router};
use serde::{Deserialize, Serialize};
use tracing::info;

use canine_common::openai::{ChatCompletionRequest, OpenAiClient};
use source_router::SourceRouter;

use crate::config::AssistantConfig;
use crate::error::AppError;
use crate::guard;
use crate::prompt;
use crate::rate_limit::RateLimiter;
use crate::widget;

const BODY_LIMIT_BYTES: usize = 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub router: Arc<SourceRouter>,
    pub openai: Arc<OpenAiClient>,
    pub limiter: RateLimiter,
    pub config: Arc<AssistantConfig>,
}

impl AppState {
    pub fn new(router: Arc<SourceRouter>, openai: Arc<OpenAiClient>, config: AssistantConfig) -> Self {
        Self {
            router,
            openai,
            limiter: RateLimiter::new(config.rate_limit_max, config.rate_limit_window),
            config: Arc::new(config),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
    pub sources: Vec<String>,
}

/// `/chat` is rate limited first, then checked against the allowed referer.
pub fn app(state: AppState) -> Router {
    let chat = Router::new()
        .route("/chat", post(chat))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::referer_guard,
        ))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::rate_limit_middleware,
        ));

    Router::new()
        .merge(chat)
        .route("/health", get(health))
        .route("/widget.js", get(widget::widget_js))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            guard::cors_middleware,
        ))
        .with_state(state)
}

async fn chat(
    State(state): State<AppState>,
    Json(body): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, AppError> {
    let message = body.message.trim();
    if message.is_empty() {
        return Err(AppError::BadRequest("Missing message".to_string()));
    }

    let grounding = state.router.ground(message, state.config.router.max_notes);
    let request = ChatCompletionRequest {
        model: state.config.model.clone(),
        messages: prompt::build_messages(message, &grounding),
        temperature: state.config.temperature,
        max_tokens: None,
    };
    let reply = state.openai.complete(&request).await?;

    info!(
        links = grounding.links.len(),
        notes = grounding.notes.len(),
        reply_chars = reply.chars().count(),
        "chat answered"
    );
    Ok(Json(ChatResponse {
        reply,
        sources: grounding.links,
    }))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "ok": true,
        "rules_version": state.router.rules().version,
        "notes": state.router.corpus().len(),
    }))
}
