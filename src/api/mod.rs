//! HTTP API module - chat gateway endpoints and WebSocket

mod messages;
mod websocket;

use std::sync::Arc;

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::bot::Bot;
pub use websocket::{ClientMessage, ConnectionManager, ServerMessage};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub bot: Arc<Bot>,
    pub connections: Arc<ConnectionManager>,
}

/// Build the API router
pub fn router(bot: Arc<Bot>) -> Router {
    let state = AppState {
        bot,
        connections: Arc::new(ConnectionManager::new()),
    };

    Router::new()
        .route("/health", get(health_check))
        .route("/", get(root))
        .route("/messages", post(messages::post_message))
        .route("/ws", get(websocket::ws_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Root endpoint
async fn root() -> impl IntoResponse {
    Json(RootResponse {
        name: "diced",
        version: env!("CARGO_PKG_VERSION"),
    })
}

#[derive(Serialize)]
struct RootResponse {
    name: &'static str,
    version: &'static str,
}

/// Liveness endpoint; narration falling back is not a failure
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let narrator = if state.bot.narrator().is_configured() {
        "configured"
    } else {
        "fallback_only"
    };

    Json(HealthResponse {
        status: "healthy",
        narrator,
    })
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    narrator: &'static str,
}
