//! Chat relay HTTP API.
//!
//! Routes:
//! - POST /api/chat — validate and relay a chat completion request
//! - GET /health — liveness and uptime
//! - GET /metrics — Prometheus counters
//!
//! Per request the flow is strictly linear: receive, validate, dispatch
//! upstream, then either stream the body back or translate the failure.
//! No path retries.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::config::Config;
use crate::metrics::Metrics;
use crate::relay::UpstreamClient;
use crate::server::error::RelayError;
use crate::server::streaming::relay_sse_response;

/// Sampling temperature injected when the caller omits the field or sends
/// something non-numeric.
pub const DEFAULT_TEMPERATURE: f64 = 0.7;

/// Application state shared across handlers.
pub struct AppState {
    pub upstream: UpstreamClient,
    pub config: Arc<Config>,
    pub metrics: Metrics,
    pub start_time: Instant,
}

/// Build the axum router with all API routes.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/chat", post(relay_chat))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .method_not_allowed_fallback(method_not_allowed)
        .layer(TraceLayer::new_for_http())
        // The browser frontend is served from elsewhere.
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ─── Request Types ─────────────────────────────────────────────────────────

/// A validated chat completion request.
///
/// Message contents are deliberately opaque: they are relayed upstream
/// untouched and in order, with no schema applied beyond "is an array".
#[derive(Debug)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Value>,
    pub temperature: f64,
}

impl ChatRequest {
    /// Validate the inbound body: `model` must be a non-empty string and
    /// `messages` an array.
    pub fn from_value(body: &Value) -> Result<Self, RelayError> {
        let model = body
            .get("model")
            .and_then(Value::as_str)
            .filter(|model| !model.is_empty());
        let messages = body.get("messages").and_then(Value::as_array);

        match (model, messages) {
            (Some(model), Some(messages)) => Ok(Self {
                model: model.to_string(),
                messages: messages.clone(),
                temperature: body
                    .get("temperature")
                    .and_then(Value::as_f64)
                    .unwrap_or(DEFAULT_TEMPERATURE),
            }),
            _ => Err(RelayError::InvalidRequest),
        }
    }

    /// Outbound payload; streaming is always requested from the upstream.
    pub fn upstream_payload(&self) -> Value {
        json!({
            "model": self.model,
            "messages": self.messages,
            "temperature": self.temperature,
            "stream": true,
        })
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_secs: u64,
}

// ─── Route Handlers ────────────────────────────────────────────────────────

async fn relay_chat(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Value>, JsonRejection>,
) -> Response {
    state.metrics.requests_total.inc();
    let request_id = Uuid::new_v4().to_string();

    // A body that is not JSON at all gets the same rejection as one with a
    // missing field.
    let request = match body {
        Ok(Json(value)) => ChatRequest::from_value(&value),
        Err(_) => Err(RelayError::InvalidRequest),
    };
    let request = match request {
        Ok(request) => request,
        Err(err) => {
            state.metrics.invalid_requests_total.inc();
            warn!(request_id = request_id, "Rejected malformed chat request");
            return err.into_response();
        }
    };

    info!(
        request_id = request_id,
        model = request.model,
        messages = request.messages.len(),
        temperature = request.temperature,
        "Relaying chat completion"
    );

    match state.upstream.dispatch(&request.upstream_payload()).await {
        Ok(upstream) => {
            state.metrics.relayed_streams_total.inc();
            relay_sse_response(
                upstream,
                request_id,
                state.metrics.stream_aborts_total.clone(),
            )
        }
        Err(err) => {
            if matches!(err, RelayError::Upstream { .. }) {
                state.metrics.upstream_failures_total.inc();
            }
            error!(request_id = request_id, error = %err, "Chat relay failed");
            err.into_response()
        }
    }
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

async fn metrics(State(state): State<Arc<AppState>>) -> Response {
    match state.metrics.render() {
        Ok(text) => text.into_response(),
        Err(err) => RelayError::Internal(err.into()).into_response(),
    }
}

async fn method_not_allowed() -> RelayError {
    RelayError::MethodNotAllowed
}
