//! HTTP and WebSocket surface.
//!
//! One WebSocket endpoint carries the streaming protocol; a few read-only
//! and administrative HTTP endpoints sit next to it.

pub mod routes;
pub mod ws;

use crate::config::ServerConfig;
use crate::error::Result;
use crate::session::manager::SessionManager;
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::info;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<SessionManager>,
}

/// Builds the application router.
pub fn build_router(manager: Arc<SessionManager>) -> Router {
    let state = AppState { manager };
    Router::new()
        .route("/ws/transcribe", get(ws::websocket_handler))
        .route("/health", get(routes::health))
        .route("/sessions", get(routes::sessions))
        .route("/models/:model/load", post(routes::load_model))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Binds the listener and serves until the process is stopped.
pub async fn run(config: &ServerConfig, manager: Arc<SessionManager>) -> Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = %addr, "listening");

    axum::serve(listener, build_router(manager).into_make_service()).await?;
    Ok(())
}
