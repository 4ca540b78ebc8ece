//! REST API route handlers.
//!
//! Three endpoints: `POST /ask` runs the full pipeline and dispatches for
//! real, `POST /preview` runs the identical resolution and normalization but
//! returns side-effect-free projections, and `GET /health` is a liveness
//! probe.
//!
//! Status mapping: `no_action`, channel mismatches, and validation failures
//! are the caller's problem (400); a resolver failure on `/preview` is ours
//! (500).  On `/ask` a resolver failure is also 400, matching the contract
//! that resolution must succeed before anything is attempted.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::{Map, Value, json};
use tracing::info;

use courier_dispatch::{ActionRequest, PipelineReply};

use crate::state::AppState;

/// Request body for `/ask` and `/preview`.
#[derive(Debug, Deserialize)]
pub struct RequestPayload {
    /// The free-form request text.
    pub message: String,

    /// Optional restriction on which actions may be dispatched.
    pub channels: Option<Vec<String>>,

    /// Carried through for callers that track completion externally.
    pub callback_url: Option<String>,
}

impl RequestPayload {
    fn into_request(self) -> ActionRequest {
        ActionRequest {
            text: self.message,
            explicit_channels: self.channels,
            callback_url: self.callback_url,
        }
    }
}

// ---------------------------------------------------------------------------
// POST /ask
// ---------------------------------------------------------------------------

/// Resolve the message and dispatch the resulting action(s) for real.
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RequestPayload>,
) -> (StatusCode, Json<Value>) {
    let request = payload.into_request();
    info!(text = %request.text, "ask request");

    match state.pipeline.handle(&request, false).await {
        PipelineReply::Outcomes(outcomes) => {
            (StatusCode::OK, Json(json!({"results": outcomes})))
        }
        PipelineReply::NoAction { message } | PipelineReply::Invalid { message } => {
            (StatusCode::BAD_REQUEST, Json(json!({"error": message})))
        }
        PipelineReply::ResolverError { message } => {
            (StatusCode::BAD_REQUEST, Json(json!({"error": message})))
        }
        PipelineReply::ChannelMismatch { resolved, requested } => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": channel_mismatch_message(&resolved, &requested)})),
        ),
    }
}

// ---------------------------------------------------------------------------
// POST /preview
// ---------------------------------------------------------------------------

/// Identical resolution and normalization, but dispatch with preview only.
///
/// Returns `{<action>: <preview payload>}` so a confirmation UI can show the
/// user exactly what a real `/ask` would send.
pub async fn preview(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RequestPayload>,
) -> (StatusCode, Json<Value>) {
    let request = payload.into_request();
    info!(text = %request.text, "preview request");

    match state.pipeline.handle(&request, true).await {
        PipelineReply::Outcomes(outcomes) => {
            let mut by_action = Map::new();
            for outcome in outcomes {
                by_action.insert(outcome.action.to_string(), outcome.payload);
            }
            (StatusCode::OK, Json(Value::Object(by_action)))
        }
        PipelineReply::NoAction { message } => {
            (StatusCode::BAD_REQUEST, Json(json!({"error": message})))
        }
        PipelineReply::ResolverError { message } | PipelineReply::Invalid { message } => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": format!("AI processing error: {message}")})),
        ),
        PipelineReply::ChannelMismatch { resolved, requested } => (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": channel_mismatch_message(&resolved, &requested)})),
        ),
    }
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

/// Liveness probe.  No side effects.
pub async fn health() -> Json<Value> {
    Json(json!({"status": "running"}))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn channel_mismatch_message(
    resolved: &[courier_intent::ActionKind],
    requested: &[String],
) -> String {
    let resolved: Vec<&str> = resolved.iter().map(|a| a.wire_name()).collect();
    format!(
        "resolved action(s) {resolved:?} are not among the requested channels {requested:?}; \
         adjust the message or the selected channels"
    )
}
