// SPDX-FileCopyrightText: 2026 Intervox Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Realtime HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the interview API.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use intervox_core::{AiGateway, IntervoxError, ProfileStore};
use intervox_session::{EventSender, SessionRegistry};

use crate::connections::ConnectionManager;
use crate::handlers;
use crate::ws;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct RealtimeState {
    /// All live interview sessions.
    pub registry: Arc<SessionRegistry>,
    /// Live WebSocket connections per session.
    pub connections: Arc<ConnectionManager>,
    /// Generative backend used for greetings, replies, and reports.
    pub gateway: Arc<dyn AiGateway>,
    /// Candidate profile lookup for session creation.
    pub profiles: Arc<dyn ProfileStore>,
    /// Persistence side-channel handed to new sessions.
    pub events: EventSender,
    /// Turns of history included in each backend prompt.
    pub history_window: usize,
    /// Process start time for uptime reporting.
    pub start_time: std::time::Instant,
}

/// Server bind configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Builds the application router.
pub fn build_router(state: RealtimeState) -> Router {
    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/v1/interviews", post(handlers::post_interviews))
        .route("/ws/interview/{session_id}", get(ws::ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the realtime HTTP/WebSocket server.
///
/// Binds to the configured host:port and serves:
/// - GET /health
/// - POST /v1/interviews
/// - GET /ws/interview/{session_id}
pub async fn start_server(
    config: &ServerConfig,
    state: RealtimeState,
) -> Result<(), IntervoxError> {
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| IntervoxError::Channel {
            message: format!("failed to bind realtime server to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("Realtime server listening on {addr}");

    axum::serve(listener, app)
        .await
        .map_err(|e| IntervoxError::Channel {
            message: format!("realtime server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use intervox_session::null_sender;
    use intervox_test_utils::{MemoryProfileStore, MockGateway};

    fn test_state() -> RealtimeState {
        RealtimeState {
            registry: Arc::new(SessionRegistry::new()),
            connections: Arc::new(ConnectionManager::new()),
            gateway: Arc::new(MockGateway::new()),
            profiles: Arc::new(MemoryProfileStore::new()),
            events: null_sender(),
            history_window: 8,
            start_time: std::time::Instant::now(),
        }
    }

    #[test]
    fn realtime_state_is_clone() {
        let state = test_state();
        let _cloned = state.clone();
    }

    #[test]
    fn router_builds() {
        let _router = build_router(test_state());
    }

    #[test]
    fn server_config_debug() {
        let config = ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8087,
        };
        let debug = format!("{config:?}");
        assert!(debug.contains("8087"));
    }
}
