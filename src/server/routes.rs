//! HTTP routes.
//!
//! - POST /api/chat
//! - GET /api/health
//! - GET /api/metrics

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderName, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::metrics::RelayMetrics;
use crate::relay::{ChatRequest, Relay, RelayError};
use crate::server::streaming::{relay_body, TEXT_PLAIN};

/// Response header carrying the id used for this request in the logs.
pub const REQUEST_ID_HEADER: HeaderName = HeaderName::from_static("x-request-id");

/// Application state shared across handlers.
pub struct AppState {
    pub relay: Relay,
    pub metrics: Arc<RelayMetrics>,
}

/// Build the axum router with all API routes.
///
/// CORS mirrors the caller's origin, methods and headers and allows
/// credentials, so browser front ends can call the relay directly.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/chat", post(chat))
        .route("/api/health", get(health))
        .route("/api/metrics", get(metrics))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

// ─── Route Handlers ────────────────────────────────────────────────────────

async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Response, RelayError> {
    let stream = state.relay.submit(req).await?;
    let request_id = stream.request_id.clone();

    Ok((
        [
            (header::CONTENT_TYPE, TEXT_PLAIN.to_string()),
            (header::CACHE_CONTROL, "no-cache".to_string()),
            (REQUEST_ID_HEADER, request_id),
        ],
        relay_body(stream),
    )
        .into_response())
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(text) => (
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            text,
        )
            .into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}
