//! Shared application state for the web server.
//!
//! [`AppState`] is wrapped in an `Arc` and shared across all request
//! handlers.  It holds the request pipeline, which is itself read-only
//! configuration — no locks are needed across concurrent requests.

use std::sync::Arc;

use courier_dispatch::Pipeline;

/// Shared state accessible from every Axum handler.
#[derive(Clone)]
pub struct AppState {
    /// The resolve → normalize → dispatch pipeline.
    pub pipeline: Arc<Pipeline>,
}

impl AppState {
    /// Create state over the given pipeline.
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }
}
