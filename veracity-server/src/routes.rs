use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use serde_json::json;
use url::Url;
use veracity_common::ConversationTurn;

use crate::AppState;

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(crate) struct ConversationalRequest {
    message: String,
    #[serde(default)]
    conversation_history: Vec<ConversationTurn>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct FactCheckRequest {
    url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ChatRequest {
    message: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TrendingRequest {
    #[serde(default)]
    topic: String,
    #[serde(default)]
    area: String,
}

fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn bad_request(message: impl Into<String>) -> Response {
    let message = message.into();
    tracing::debug!(%message, "http.request.rejected");
    (
        StatusCode::BAD_REQUEST,
        Json(json!({"status": "error", "message": message})),
    )
        .into_response()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub(crate) async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({"status": "ok", "model": state.checker().model_name()}))
}

/// Stateless turn: the caller supplies the history it wants considered.
pub(crate) async fn conversational_fact_check(
    State(state): State<AppState>,
    Json(req): Json<ConversationalRequest>,
) -> Response {
    if req.message.trim().is_empty() {
        return bad_request("message is required");
    }

    let outcome = state
        .checker()
        .converse(&req.message, &req.conversation_history)
        .await;

    let (code, status) = if outcome.reply.is_error() {
        (StatusCode::INTERNAL_SERVER_ERROR, "error")
    } else {
        (StatusCode::OK, "success")
    };
    (
        code,
        Json(json!({
            "response": outcome.reply,
            "search_evidence": outcome.search_evidence,
            "status": status,
            "timestamp": timestamp(),
        })),
    )
        .into_response()
}

pub(crate) async fn fact_check(
    State(state): State<AppState>,
    Json(req): Json<FactCheckRequest>,
) -> Response {
    let raw = req.url.trim();
    if raw.is_empty() {
        return bad_request("url is required");
    }
    let url = match Url::parse(raw) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => url,
        Ok(url) => return bad_request(format!("unsupported scheme: {}", url.scheme())),
        Err(e) => return bad_request(format!("invalid url: {e}")),
    };

    match state.checker().check_url(&url).await {
        Ok(report) => Json(json!({
            "extracted_content": report.extracted_content,
            "results": report.results,
            "status": "success",
        }))
        .into_response(),
        Err(e) => {
            tracing::warn!(url = %url, error = %e, "http.fact_check.failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "extracted_content": "",
                    "results": [],
                    "status": "error",
                    "message": e.to_string(),
                })),
            )
                .into_response()
        }
    }
}

/// Bot/extension bridge: server-held history, rendered reply text.
pub(crate) async fn chat_message(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
    Json(req): Json<ChatRequest>,
) -> Response {
    if req.message.trim().is_empty() {
        return bad_request("message is required");
    }
    match state.sessions.handle_text(&chat_id, &req.message).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => session_unavailable(&chat_id, e),
    }
}

pub(crate) async fn chat_clear(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> Response {
    match state.sessions.clear(&chat_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => session_unavailable(&chat_id, e),
    }
}

pub(crate) async fn chat_history(
    State(state): State<AppState>,
    Path(chat_id): Path<String>,
) -> Response {
    match state.sessions.history(&chat_id).await {
        Ok(turns) => Json(turns).into_response(),
        Err(e) => session_unavailable(&chat_id, e),
    }
}

fn session_unavailable(chat_id: &str, err: anyhow::Error) -> Response {
    tracing::warn!(chat_id, error = %err, "http.chat.unavailable");
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({"status": "error", "message": err.to_string()})),
    )
        .into_response()
}

pub(crate) async fn trending_misinformation(
    State(state): State<AppState>,
    Json(req): Json<TrendingRequest>,
) -> Response {
    if req.topic.trim().is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "topic is required", "misinformation": []})),
        )
            .into_response();
    }

    match state.checker().trending(&req.topic, &req.area).await {
        Ok(items) => Json(json!({
            "misinformation": items,
            "topic": req.topic,
            "area": req.area,
        }))
        .into_response(),
        Err(e) => {
            tracing::warn!(topic = %req.topic, error = %e, "http.trending.failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string(), "misinformation": []})),
            )
                .into_response()
        }
    }
}
