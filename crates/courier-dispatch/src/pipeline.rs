//! End-to-end request pipeline: resolve → normalize → dispatch.
//!
//! Per-request state machine: Received → Resolved → Normalized →
//! {Previewed | Dispatched | Rejected}.  Everything here is request-scoped;
//! the only shared state is the read-only resolver and dispatcher
//! configuration, so concurrent requests need no locks.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use serde::Deserialize;
use tracing::{debug, info};

use courier_intent::{ActionKind, IntentResolver, ResolvedAction, normalize};

use crate::dispatch::{DispatchOutcome, Dispatcher};

// ---------------------------------------------------------------------------
// Request / reply types
// ---------------------------------------------------------------------------

/// One inbound routing request.  Immutable, created once per call.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionRequest {
    /// The free-form request text.
    pub text: String,

    /// When present, the resolved action must be one of these wire names.
    pub explicit_channels: Option<Vec<String>>,

    /// Carried for callers that want completion callbacks; courier itself
    /// performs no callback delivery.
    pub callback_url: Option<String>,
}

impl ActionRequest {
    /// A request with no channel restriction.
    pub fn text_only(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            explicit_channels: None,
            callback_url: None,
        }
    }
}

/// Terminal reply of the pipeline for one request.
#[derive(Debug)]
pub enum PipelineReply {
    /// At least one action was dispatched (or previewed); outcomes are
    /// positional with the detected actions.
    Outcomes(Vec<DispatchOutcome>),

    /// The resolver found no actionable intent.
    NoAction { message: String },

    /// Resolution itself failed (model call error, unknown action).
    ResolverError { message: String },

    /// The resolved actions are not among the caller's explicit channels.
    ChannelMismatch {
        resolved: Vec<ActionKind>,
        requested: Vec<String>,
    },

    /// Every resolved action failed validation before any network call.
    Invalid { message: String },
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// The full request pipeline.
pub struct Pipeline {
    resolver: Arc<dyn IntentResolver>,
    dispatcher: Arc<Dispatcher>,
}

impl Pipeline {
    /// Create a pipeline over the given resolver strategy and dispatcher.
    pub fn new(resolver: Arc<dyn IntentResolver>, dispatcher: Arc<Dispatcher>) -> Self {
        Self {
            resolver,
            dispatcher,
        }
    }

    /// Handle a request against the real clock.
    pub async fn handle(&self, request: &ActionRequest, preview: bool) -> PipelineReply {
        self.handle_at(request, preview, Utc::now()).await
    }

    /// Handle a request against an explicit reference instant.
    ///
    /// Production goes through [`Pipeline::handle`]; tests inject a fixed
    /// reference here for deterministic date resolution.
    pub async fn handle_at(
        &self,
        request: &ActionRequest,
        preview: bool,
        reference_now: DateTime<Utc>,
    ) -> PipelineReply {
        // Resolved.
        let resolutions = self.resolver.resolve_all(&request.text, reference_now).await;
        debug!(count = resolutions.len(), "resolutions produced");

        if let Some(err) = resolutions.iter().find(|r| r.action == ActionKind::Error) {
            return PipelineReply::ResolverError {
                message: err
                    .message()
                    .unwrap_or("resolution failed")
                    .to_string(),
            };
        }

        let dispatchable: Vec<&ResolvedAction> = resolutions
            .iter()
            .filter(|r| r.action.is_dispatchable())
            .collect();

        if dispatchable.is_empty() {
            let message = resolutions
                .iter()
                .find_map(|r| r.message())
                .unwrap_or("No action detected")
                .to_string();
            return PipelineReply::NoAction { message };
        }

        // Channel restriction: the resolved action must be among the
        // caller's explicit channels.
        let selected: Vec<&ResolvedAction> = match &request.explicit_channels {
            Some(channels) => {
                let kept: Vec<&ResolvedAction> = dispatchable
                    .iter()
                    .filter(|r| channels.iter().any(|c| c == r.action.wire_name()))
                    .copied()
                    .collect();
                if kept.is_empty() {
                    return PipelineReply::ChannelMismatch {
                        resolved: dispatchable.iter().map(|r| r.action).collect(),
                        requested: channels.clone(),
                    };
                }
                kept
            }
            None => dispatchable,
        };

        // Normalized.
        let normalized: Vec<_> = selected
            .iter()
            .map(|r| {
                (
                    r.action,
                    normalize(r.action, &r.raw_params, &request.text, reference_now),
                )
            })
            .collect();

        if normalized.iter().all(|(_, result)| result.is_err()) {
            let message = normalized
                .iter()
                .find_map(|(_, result)| result.as_ref().err())
                .map(|e| e.to_string())
                .unwrap_or_else(|| "validation failed".to_string());
            return PipelineReply::Invalid { message };
        }

        // Previewed / Dispatched / Rejected — concurrently, positionally.
        let outcomes = join_all(normalized.into_iter().map(|(action, result)| {
            let dispatcher = Arc::clone(&self.dispatcher);
            async move {
                match result {
                    Ok(canonical) => dispatcher.dispatch(&canonical, preview).await,
                    Err(e) => DispatchOutcome::rejected(action, e.to_string()),
                }
            }
        }))
        .await;

        info!(count = outcomes.len(), preview = preview, "pipeline complete");
        PipelineReply::Outcomes(outcomes)
    }
}
