//! HTTP handlers for the chat endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use text_completion::{cancel_pair, ChatMessage, RequestHandler};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{error, info, warn, Level};

use crate::error::{ApiError, ApiResult};

pub const CHAT_PATH: &str = "/chat";
pub const COMPLETION_PATH: &str = "/completion";
pub const HEALTH_PATH: &str = "/health";

/// State shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<dyn RequestHandler>,
    /// Reported by `/health`.
    pub version: String,
}

impl AppState {
    pub fn new(handler: Arc<dyn RequestHandler>, version: impl Into<String>) -> Self {
        Self {
            handler,
            version: version.into(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    /// Oldest first. Only the last entry is sent upstream.
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
pub struct PromptRequest {
    #[serde(default)]
    pub prompt: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatResponse {
    pub response: String,
}

/// All routes, with permissive CORS on every response (preflights included).
/// Every request is logged at INFO with its method and URI.
pub fn create_router(state: AppState) -> Router {
    let trace = TraceLayer::new_for_http()
        .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
        .on_request(DefaultOnRequest::new().level(Level::INFO))
        .on_response(DefaultOnResponse::new().level(Level::INFO));

    Router::new()
        .route(CHAT_PATH, post(chat))
        .route(COMPLETION_PATH, post(completion))
        .route(HEALTH_PATH, get(health))
        .layer(trace)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

fn rejected(rejection: JsonRejection) -> ApiError {
    warn!("Invalid request body: {}", rejection.body_text());
    ApiError::bad_request(rejection.body_text())
}

/// POST /chat - answer the last message of a conversation
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let Json(request) = payload.map_err(rejected)?;

    let last = request.messages.last().ok_or_else(|| {
        warn!("Invalid request body: no messages");
        ApiError::bad_request("Messages array is required and must not be empty")
    })?;
    if last.content.trim().is_empty() {
        warn!("Invalid request body: last message is blank");
        return Err(ApiError::bad_request("Last message content must not be empty"));
    }

    info!(
        "Processing chat request: {} messages, last role {:?}",
        request.messages.len(),
        last.role
    );

    //dropped with this future if the client goes away
    let (_guard, cancel) = cancel_pair();
    let response = state
        .handler
        .answer_request(&last.content, cancel)
        .await
        .map_err(|e| {
            error!("Chat request failed: {}", e);
            ApiError::from(e)
        })?;

    Ok(Json(ChatResponse { response }))
}

/// POST /completion - answer a single prompt without an assistant run
pub async fn completion(
    State(state): State<AppState>,
    payload: Result<Json<PromptRequest>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let Json(request) = payload.map_err(rejected)?;
    if request.prompt.trim().is_empty() {
        warn!("Invalid request body: blank prompt");
        return Err(ApiError::bad_request("Prompt is required and must not be empty"));
    }

    info!("Processing completion request");
    let response = state
        .handler
        .answer_prompt(&request.prompt)
        .await
        .map_err(|e| {
            error!("Completion request failed: {}", e);
            ApiError::from(e)
        })?;

    Ok(Json(ChatResponse { response }))
}

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": state.version,
    }))
}
