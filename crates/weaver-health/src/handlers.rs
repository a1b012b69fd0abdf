//! HTTP handlers: `/health`, `/ready`, `/chat`.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, info, warn};

use crate::server::{Shared, REQUEST_TIMEOUT};
use crate::types::{ChatRequest, ChatResponse, CheckStatus, StatusResponse};

pub(crate) fn router(shared: Arc<Shared>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/chat", post(chat).fallback(method_not_allowed))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .with_state(shared)
}

/// Liveness: 200 for as long as the process can answer.
async fn health(State(shared): State<Arc<Shared>>) -> Json<StatusResponse> {
    Json(StatusResponse::alive(shared.uptime()))
}

/// Readiness: 200 only when the ready flag is set and no check is failing.
async fn ready(State(shared): State<Arc<Shared>>) -> (StatusCode, Json<StatusResponse>) {
    let (ready, checks) = shared.snapshot();

    if !ready {
        debug!("Readiness probe: server not ready");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(StatusResponse::not_ready(checks)),
        );
    }

    if let Some(failing) = checks.values().find(|c| c.status == CheckStatus::Fail) {
        debug!(check = %failing.name, "Readiness probe: check failing");
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(StatusResponse::not_ready(checks)),
        );
    }

    (
        StatusCode::OK,
        Json(StatusResponse::ready(shared.uptime(), checks)),
    )
}

async fn chat(State(shared): State<Arc<Shared>>, body: Bytes) -> Response {
    let request = match ChatRequest::from_json(&body) {
        Ok(request) => request,
        Err(err) => {
            debug!(target: "rest", error = %err, "Rejecting undecodable chat request");
            return (StatusCode::BAD_REQUEST, "Invalid request").into_response();
        }
    };
    let Some(turn) = request.into_turn() else {
        return (StatusCode::BAD_REQUEST, "Empty message").into_response();
    };

    info!(
        target: "rest",
        session_key = %turn.session_key,
        channel = %turn.channel,
        chat_id = %turn.chat_id,
        message = %turn.message,
        "Received chat request"
    );

    // Cancelled when this handler returns or is dropped on client disconnect.
    let cancel = CancellationToken::new();
    let _request_scope = cancel.clone().drop_guard();

    let outcome = shared.processor.process(cancel, &turn).await;
    if let Err(err) = &outcome {
        warn!(
            target: "rest",
            session_key = %turn.session_key,
            error = %err,
            "Chat processing failed"
        );
    }
    Json(ChatResponse::from(outcome)).into_response()
}

async fn method_not_allowed() -> (StatusCode, &'static str) {
    (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}
