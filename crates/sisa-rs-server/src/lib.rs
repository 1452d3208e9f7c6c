//! HTTP surface for the Sisa turn engine.
//!
//! Routes:
//! - `POST /chat/process` runs a routed turn.
//! - `POST /agents/{tag}` runs one handler directly.
//! - `GET  /conversations` lists the caller's conversations.
//! - `GET  /health` liveness probe.
//!
//! The caller is identified by the `X-User-Id` header; requests without
//! one fall back to a per-process demo user.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use log::warn;
use serde_json::json;
use sisa_rs_core::{Engine, SisaCoreError};
use sisa_rs_protocol::{AgentKind, ChatRequest, UserId};
use std::sync::Arc;
use uuid::Uuid;

const USER_HEADER: &str = "x-user-id";

/// Shared server state.
#[derive(Clone)]
pub struct AppState {
    engine: Arc<Engine>,
    demo_user: UserId,
}

impl AppState {
    /// Wrap an engine for serving.
    pub fn new(engine: Arc<Engine>) -> Self {
        Self {
            engine,
            demo_user: Uuid::new_v4(),
        }
    }
}

/// Build the application router.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/chat/process", post(process_chat))
        .route("/agents/{tag}", post(process_agent))
        .route("/conversations", get(list_conversations))
        .route("/health", get(health))
        .with_state(state)
}

/// API error with an HTTP status and a JSON body.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<SisaCoreError> for ApiError {
    fn from(err: SisaCoreError) -> Self {
        let status = match &err {
            SisaCoreError::UnknownAgent(_) => StatusCode::BAD_REQUEST,
            SisaCoreError::UnknownConversation(_) => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            warn!("request failed: {err}");
        }
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "error": self.message }))).into_response()
    }
}

fn resolve_user(state: &AppState, headers: &HeaderMap) -> Result<UserId, ApiError> {
    match headers.get(USER_HEADER) {
        Some(value) => {
            let raw = value
                .to_str()
                .map_err(|_| ApiError::bad_request("invalid X-User-Id header"))?;
            Uuid::parse_str(raw).map_err(|_| ApiError::bad_request("invalid X-User-Id header"))
        }
        None => Ok(state.demo_user),
    }
}

async fn process_chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = resolve_user(&state, &headers)?;
    let response = state.engine.process_turn(user_id, &request).await?;
    Ok(Json(response))
}

async fn process_agent(
    State(state): State<AppState>,
    Path(tag): Path<String>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = resolve_user(&state, &headers)?;
    let agent = AgentKind::parse(&tag)
        .map_err(|_| ApiError::bad_request(format!("unknown agent: {tag}")))?;
    let response = state.engine.process_as(user_id, agent, &request).await?;
    Ok(Json(response))
}

async fn list_conversations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = resolve_user(&state, &headers)?;
    let summaries = state.engine.conversations().list_for_user(user_id);
    Ok(Json(summaries))
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}
