//! Main web server setup and startup.
//!
//! [`WebServer`] composes the Axum router, registers the routes, and starts
//! the HTTP listener.  Outbound model and adapter calls are async all the
//! way down, so one slow integration never stalls the serving loop.

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method};
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;

use courier_dispatch::Pipeline;

use crate::WebConfig;
use crate::api;
use crate::state::AppState;

/// The courier web server.
pub struct WebServer {
    config: WebConfig,
    state: Arc<AppState>,
}

impl WebServer {
    /// Create a new web server over the given pipeline.
    pub fn new(config: WebConfig, pipeline: Arc<Pipeline>) -> Self {
        let state = Arc::new(AppState::new(pipeline));
        Self { config, state }
    }

    /// Return the `host:port` string this server will bind to.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.config.bind_addr, self.config.port)
    }

    /// Build the Axum router with all routes registered.
    fn router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin("*".parse::<HeaderValue>().unwrap())
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(tower_http::cors::Any);

        Router::new()
            .route("/ask", post(api::ask))
            .route("/preview", post(api::preview))
            .route("/health", get(api::health))
            .layer(cors)
            .with_state(Arc::clone(&self.state))
    }

    /// Start the server and block until it is shut down.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP listener cannot be bound.
    pub async fn start(self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        let addr = self.addr();
        let router = self.router();

        tracing::info!(addr = %addr, "starting web server");

        let listener = tokio::net::TcpListener::bind(&addr).await?;
        axum::serve(listener, router).await?;

        Ok(())
    }
}
