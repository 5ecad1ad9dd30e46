//! HTTP surface: CORS, API-key auth, per-client rate limiting, `/health`, and
//! the `/rpc` endpoint.
//!
//! Requests pass CORS first, then auth, then the rate limiter, then routing.
//! Anything that is not `GET /health` or `POST /rpc` is a 404.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, Request, State};
use axum::http::header::{HeaderName, CONTENT_TYPE, RETRY_AFTER};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::Instrument;

use super::dispatch::Dispatcher;
use super::jsonrpc::{self, Request as RpcRequest, Response as RpcResponse};
use super::rate_limit::{RateLimitDecision, RateLimiter};
use crate::config::NoteportConfig;

pub const API_KEY_HEADER: &str = "x-api-key";

/// Shared state for every request.
#[derive(Clone)]
pub struct AppState {
    api_key: Arc<str>,
    dispatcher: Arc<Dispatcher>,
    limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: &NoteportConfig, dispatcher: Dispatcher) -> Self {
        Self {
            api_key: Arc::from(config.server.api_key.as_str()),
            dispatcher: Arc::new(dispatcher),
            limiter: Arc::new(RateLimiter::new(
                config.rate_limit.max_requests,
                Duration::from_secs(config.rate_limit.window_secs),
            )),
        }
    }
}

/// Build the full router with all layers applied.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health).fallback(not_found))
        .route("/rpc", post(rpc).fallback(not_found))
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .layer(middleware::from_fn_with_state(state.clone(), require_api_key))
        .layer(middleware::from_fn(answer_options))
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, HeaderName::from_static(API_KEY_HEADER)])
}

/// OPTIONS never reaches auth. True CORS preflights are answered by the
/// CORS layer itself; anything else gets an empty 204.
async fn answer_options(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::NO_CONTENT.into_response();
    }
    next.run(request).await
}

async fn require_api_key(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    let key_present = provided.is_some();
    let authorized = !state.api_key.is_empty() && provided == Some(&*state.api_key);

    if authorized {
        return next.run(request).await;
    }

    tracing::warn!(
        path = %request.uri().path(),
        client = %client_id(&request),
        key_present,
        "unauthorized request"
    );
    error_response(StatusCode::UNAUTHORIZED, "Unauthorized")
}

async fn rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let client = client_id(&request);
    match state.limiter.check(&client) {
        RateLimitDecision::Allowed => next.run(request).await,
        RateLimitDecision::Limited { retry_after_secs } => {
            tracing::warn!(client = %client, retry_after_secs, "rate limit exceeded");
            let mut response = error_response(StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded");
            response
                .headers_mut()
                .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
            response
        }
    }
}

/// Peer IP of the connection, `"unknown"` when the server was not started
/// with connect info.
fn client_id(request: &Request) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    let dispatcher = &state.dispatcher;
    Json(json!({
        "status": "ok",
        "server": dispatcher.server_name(),
        "version": dispatcher.server_version(),
        "vault": dispatcher.vault_name(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn rpc(State(state): State<AppState>, body: Bytes) -> Response {
    let value: Value = match serde_json::from_slice(&body) {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(error = %e, "unparseable rpc body");
            return Json(RpcResponse::error(
                Value::Null,
                jsonrpc::PARSE_ERROR,
                "Parse error",
            ))
            .into_response();
        }
    };

    let request = match RpcRequest::from_value(value) {
        Ok(request) => request,
        Err(invalid) => {
            return Json(RpcResponse::error(
                invalid.id,
                jsonrpc::INVALID_REQUEST,
                invalid.message,
            ))
            .into_response();
        }
    };

    let request_id = uuid::Uuid::now_v7();
    let span = tracing::info_span!(
        "rpc",
        request_id = %request_id,
        method = %request.method,
    );
    handle(state, request).instrument(span).await
}

async fn handle(state: AppState, request: RpcRequest) -> Response {
    let notification = request.is_notification();
    let id = request.response_id();
    let method = request.method;
    let params = request.params;

    let dispatcher = state.dispatcher.clone();
    let span = tracing::Span::current();
    let outcome = tokio::task::spawn_blocking(move || {
        let _entered = span.enter();
        dispatcher.execute(&method, params)
    })
    .await;

    let result = match outcome {
        Ok(result) => result.map_err(|e| e.to_string()),
        Err(join_error) => {
            tracing::error!(error = %join_error, "rpc handler panicked");
            Err("Internal error".to_string())
        }
    };

    if notification {
        if let Err(message) = &result {
            tracing::warn!(error = %message, "notification failed");
        }
        return StatusCode::NO_CONTENT.into_response();
    }

    let response = match result {
        Ok(value) => RpcResponse::success(id, value),
        Err(message) => {
            tracing::debug!(error = %message, "rpc error");
            RpcResponse::error(id, jsonrpc::INTERNAL_ERROR, message)
        }
    };
    Json(response).into_response()
}
