//! HTTP surface of the fact-check service.
//!
//! Stateless endpoints (`/conversational-fact-check`, `/fact-check`,
//! `/trending-misinformation`) call the shared [`FactChecker`] directly.
//! `/chat/{chat_id}` routes through [`ChatSessions`], which keeps one
//! history per chat.

mod cors;
mod routes;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use veracity_actors::{ChatSessions, FactChecker};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub sessions: ChatSessions,
}

impl AppState {
    pub fn new(sessions: ChatSessions) -> Self {
        Self { sessions }
    }

    pub fn checker(&self) -> &Arc<FactChecker> {
        self.sessions.checker()
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    let chat = Router::new()
        .route(
            "/chat/{chat_id}",
            post(routes::chat_message).delete(routes::chat_clear),
        )
        .route("/chat/{chat_id}/history", get(routes::chat_history));

    Router::new()
        .route("/health", get(routes::health))
        .route(
            "/conversational-fact-check",
            post(routes::conversational_fact_check),
        )
        .route("/fact-check", post(routes::fact_check))
        .route(
            "/trending-misinformation",
            post(routes::trending_misinformation),
        )
        .merge(chat)
        .layer(middleware::from_fn(cors::cors_middleware))
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

/// Serve on an already-bound listener until `shutdown` fires, then stop
/// every chat session.
pub async fn serve(
    state: AppState,
    listener: TcpListener,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let sessions = state.sessions.clone();
    let app = build_router(state);
    if let Ok(addr) = listener.local_addr() {
        tracing::info!(%addr, "server.listening");
    }

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown.cancelled_owned())
        .await?;

    sessions.shutdown();
    tracing::info!("server.stopped");
    Ok(())
}

pub async fn bind_and_serve(
    state: AppState,
    addr: SocketAddr,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    serve(state, listener, shutdown).await
}
