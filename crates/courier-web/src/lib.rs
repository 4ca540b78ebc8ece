//! Web interface for courier.
//!
//! Exposes the request pipeline over HTTP:
//!
//! - `POST /ask` — resolve and dispatch for real.
//! - `POST /preview` — resolve and project without side effects.
//! - `GET /health` — liveness probe.

pub mod api;
pub mod server;
pub mod state;

pub use api::RequestPayload;
pub use server::WebServer;
pub use state::AppState;

/// Web server configuration.
#[derive(Debug, Clone)]
pub struct WebConfig {
    /// The address to bind the HTTP server to.
    pub bind_addr: String,
    /// The port to listen on.
    pub port: u16,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".into(),
            port: 8000,
        }
    }
}
