// Copyright 2026 The Adrelay Project
// SPDX-License-Identifier: Apache-2.0

// HTTP surface — thin, non-core.
//
// Responsibilities:
// - POST /v1/chat/completions: validate JSON, force streaming, relay
// - OPTIONS anywhere: CORS preflight, no core logic
// - GET /: status/info JSON
// - 404 with a JSON error envelope for everything else
//
// Once the streaming response has begun the status code is committed;
// failures after that point can only be reported inside the stream body.

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use bytes::Bytes;
use futures_util::StreamExt;
use std::sync::Arc;
use uuid::Uuid;

use crate::message::{ChatRequest, ErrorEnvelope};
use crate::relay;
use crate::upstream::UpstreamClient;

// ---------------------------------------------------------------------------
// CORS
// ---------------------------------------------------------------------------

/// Permissive CORS header set applied to preflight and stream responses.
const CORS_HEADERS: &[(&str, &str)] = &[
    ("access-control-allow-origin", "*"),
    ("access-control-allow-methods", "POST, GET, OPTIONS"),
    ("access-control-allow-headers", "Content-Type, Authorization"),
];

fn apply_cors(headers: &mut HeaderMap) {
    for (name, value) in CORS_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
}

// ---------------------------------------------------------------------------
// Shared application state
// ---------------------------------------------------------------------------

/// Shared state injected into axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub upstream: Arc<dyn UpstreamClient>,
    pub target_url: String,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// POST /v1/chat/completions — the one endpoint that reaches the core.
///
/// Malformed JSON is rejected with 400 before any upstream contact. On a
/// valid request the streaming flag is overwritten to true, the relay is
/// invoked, and the filtered stream becomes the response body.
pub async fn chat_completions(State(state): State<AppState>, body: Bytes) -> Response {
    let mut request: ChatRequest = match serde_json::from_slice(&body) {
        Ok(request) => request,
        Err(e) => {
            tracing::warn!(error = %e, "rejecting malformed chat request");
            return (
                StatusCode::BAD_REQUEST,
                Json(ErrorEnvelope::request_error()),
            )
                .into_response();
        }
    };

    // Streaming is forced on regardless of what the caller asked for.
    request.stream = true;

    let request_id = Uuid::new_v4().to_string();
    tracing::info!(
        request_id = %request_id,
        model = %request.model,
        target_url = %state.target_url,
        "forwarding chat completion request"
    );

    let stream = relay::filtered_stream(state.upstream.clone(), request)
        .map(Ok::<_, std::convert::Infallible>);

    let mut response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "text/event-stream")
        .header(header::CACHE_CONTROL, "no-cache")
        .header(header::CONNECTION, "keep-alive")
        .body(Body::from_stream(stream))
        .unwrap();
    apply_cors(response.headers_mut());
    response
}

/// CORS preflight: empty body, permissive headers, no core logic.
pub async fn preflight() -> Response {
    let mut response = StatusCode::NO_CONTENT.into_response();
    apply_cors(response.headers_mut());
    response
}

/// GET / — status/info JSON.
async fn info(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Pollinations OpenAI-compatible proxy is running. \
                    Use the /v1/chat/completions endpoint.",
        "version": env!("CARGO_PKG_VERSION"),
        "target_url": state.target_url,
    }))
}

/// Unknown path: preflight still answered, everything else is a 404.
async fn fallback(method: Method) -> Response {
    if method == Method::OPTIONS {
        return preflight().await;
    }
    (StatusCode::NOT_FOUND, Json(ErrorEnvelope::not_found())).into_response()
}

// ---------------------------------------------------------------------------
// Router construction
// ---------------------------------------------------------------------------

/// Build the axum router. The upstream client arrives injected via state —
/// handlers never construct an HTTP client themselves.
pub fn build_router(state: AppState) -> Router {
    // The per-route fallback replaces axum's default 405 for a wrong
    // method on a known path: anything but the routed methods gets the
    // same 404 envelope as an unknown path.
    Router::new()
        .route("/", get(info).options(preflight).fallback(fallback))
        .route(
            "/v1/chat/completions",
            post(chat_completions).options(preflight).fallback(fallback),
        )
        .fallback(fallback)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
