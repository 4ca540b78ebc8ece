//! Integration tests for the courier-web crate.
//!
//! Handlers are exercised as plain async functions with stubbed resolvers
//! and ports — panicking ports prove that error paths never reach an
//! adapter, without binding a listener.

use std::sync::Arc;

use async_trait::async_trait;
use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value, json};

use courier_dispatch::{
    CalendarPort, ChatPort, DirectMessagePort, Dispatcher, EmailPort, Pipeline, ProxyPort, Result,
};
use courier_intent::{ActionKind, IntentResolver, KeywordResolver, ResolvedAction};
use courier_web::{AppState, RequestPayload, WebConfig, api};

// ---------------------------------------------------------------------------
// Stubs
// ---------------------------------------------------------------------------

/// Fails the test if any port method is invoked.
struct PanickingPort;

#[async_trait]
impl EmailPort for PanickingPort {
    async fn send(&self, _: &[String], _: &str, _: &str, _: bool) -> Result<Value> {
        panic!("email port must not be called");
    }
}

#[async_trait]
impl ChatPort for PanickingPort {
    async fn post(&self, _: Option<&str>, _: &str, _: bool) -> Result<Value> {
        panic!("chat port must not be called");
    }
}

#[async_trait]
impl DirectMessagePort for PanickingPort {
    async fn send(&self, _: Option<&str>, _: &str, _: bool) -> Result<Value> {
        panic!("direct message port must not be called");
    }
}

#[async_trait]
impl CalendarPort for PanickingPort {
    async fn create(
        &self,
        _: &str,
        _: DateTime<Utc>,
        _: DateTime<Utc>,
        _: &[String],
    ) -> Result<Value> {
        panic!("calendar port must not be called");
    }
}

#[async_trait]
impl ProxyPort for PanickingPort {
    async fn call(&self, _: &str, _: &str, _: &str, _: &Map<String, Value>) -> Result<Value> {
        panic!("proxy port must not be called");
    }
}

/// Always succeeds.
struct OkPort;

#[async_trait]
impl EmailPort for OkPort {
    async fn send(&self, _: &[String], _: &str, _: &str, _: bool) -> Result<Value> {
        Ok(json!({"status": "email sent"}))
    }
}

#[async_trait]
impl ChatPort for OkPort {
    async fn post(&self, _: Option<&str>, _: &str, _: bool) -> Result<Value> {
        Ok(json!({"status": "sent"}))
    }
}

#[async_trait]
impl DirectMessagePort for OkPort {
    async fn send(&self, _: Option<&str>, _: &str, _: bool) -> Result<Value> {
        Ok(json!({"status": "sent"}))
    }
}

#[async_trait]
impl CalendarPort for OkPort {
    async fn create(
        &self,
        _: &str,
        _: DateTime<Utc>,
        _: DateTime<Utc>,
        _: &[String],
    ) -> Result<Value> {
        Ok(json!({"status": "event created"}))
    }
}

#[async_trait]
impl ProxyPort for OkPort {
    async fn call(&self, _: &str, _: &str, _: &str, _: &Map<String, Value>) -> Result<Value> {
        Ok(json!({"status": "forwarded"}))
    }
}

/// Resolver stub returning a fixed resolution.
struct FixedResolver {
    resolution: ResolvedAction,
}

#[async_trait]
impl IntentResolver for FixedResolver {
    async fn resolve(&self, _: &str, _: DateTime<Utc>) -> ResolvedAction {
        self.resolution.clone()
    }
}

fn state_with(resolver: Arc<dyn IntentResolver>, panicking: bool) -> Arc<AppState> {
    let dispatcher = if panicking {
        Dispatcher::new(
            Arc::new(PanickingPort),
            Arc::new(PanickingPort),
            Arc::new(PanickingPort),
            Arc::new(PanickingPort),
            Arc::new(PanickingPort),
        )
    } else {
        Dispatcher::new(
            Arc::new(OkPort),
            Arc::new(OkPort),
            Arc::new(OkPort),
            Arc::new(OkPort),
            Arc::new(OkPort),
        )
    };
    Arc::new(AppState::new(Arc::new(Pipeline::new(
        resolver,
        Arc::new(dispatcher),
    ))))
}

fn payload(message: &str, channels: Option<Vec<String>>) -> RequestPayload {
    RequestPayload {
        message: message.into(),
        channels,
        callback_url: None,
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[test]
fn web_config_defaults() {
    let config = WebConfig::default();
    assert_eq!(config.bind_addr, "127.0.0.1");
    assert_eq!(config.port, 8000);
}

#[test]
fn web_config_custom() {
    let config = WebConfig {
        bind_addr: "0.0.0.0".into(),
        port: 8080,
    };
    assert_eq!(config.bind_addr, "0.0.0.0");
    assert_eq!(config.port, 8080);
}

// ---------------------------------------------------------------------------
// GET /health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn health_reports_running() {
    let Json(body) = api::health().await;
    assert_eq!(body, json!({"status": "running"}));
}

// ---------------------------------------------------------------------------
// POST /ask
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ask_no_action_is_400_and_calls_no_adapter() {
    let state = state_with(
        Arc::new(FixedResolver {
            resolution: ResolvedAction::no_action("hm"),
        }),
        true,
    );

    let (status, Json(body)) = api::ask(State(state), Json(payload("hm", None))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = body["error"].as_str().unwrap();
    assert!(!error.is_empty());
}

#[tokio::test]
async fn ask_resolver_error_is_400() {
    let state = state_with(
        Arc::new(FixedResolver {
            resolution: ResolvedAction::error("model quota exhausted", "text"),
        }),
        true,
    );

    let (status, Json(body)) = api::ask(State(state), Json(payload("text", None))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("quota"));
}

#[tokio::test]
async fn ask_dispatches_and_returns_results() {
    let state = state_with(Arc::new(KeywordResolver::new()), false);

    let (status, Json(body)) = api::ask(
        State(state),
        Json(payload("email bob@x.com about 'Launch'", None)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["action"], "send_email");
    assert_eq!(results[0]["status"], "dispatched");
}

#[tokio::test]
async fn ask_channel_mismatch_is_400() {
    let state = state_with(Arc::new(KeywordResolver::new()), true);

    let (status, Json(body)) = api::ask(
        State(state),
        Json(payload(
            "email bob@x.com about 'Launch'",
            Some(vec!["post_message".into()]),
        )),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("send_email"));
}

// ---------------------------------------------------------------------------
// POST /preview
// ---------------------------------------------------------------------------

#[tokio::test]
async fn preview_is_keyed_by_action_and_side_effect_free() {
    // Panicking ports: a preview that touched an adapter would fail here.
    let state = state_with(Arc::new(KeywordResolver::new()), true);

    let (status, Json(body)) = api::preview(
        State(state),
        Json(payload("email bob@x.com about 'Launch' urgent", None)),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let preview = &body["send_email"]["preview"];
    assert_eq!(preview["action"], "send_email");
    assert_eq!(preview["params"]["subject"], "Launch");
    assert_eq!(preview["params"]["priority"], true);
}

#[tokio::test]
async fn preview_no_action_is_400() {
    let state = state_with(
        Arc::new(FixedResolver {
            resolution: ResolvedAction::no_action("hm"),
        }),
        true,
    );

    let (status, Json(body)) = api::preview(State(state), Json(payload("hm", None))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(!body["error"].as_str().unwrap().is_empty());
}

#[tokio::test]
async fn preview_resolver_error_is_500() {
    let state = state_with(
        Arc::new(FixedResolver {
            resolution: ResolvedAction::error("upstream timeout", "text"),
        }),
        true,
    );

    let (status, Json(body)) = api::preview(State(state), Json(payload("text", None))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("upstream timeout"));
}

// ---------------------------------------------------------------------------
// Multi-channel ask
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ask_multi_channel_returns_positional_results() {
    let state = state_with(Arc::new(KeywordResolver::new()), false);

    let (status, Json(body)) = api::ask(
        State(state),
        Json(payload(
            "email bob@x.com the summary and post it to slack",
            None,
        )),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["action"], "send_email");
    assert_eq!(results[1]["action"], "post_message");
    assert_eq!(
        ActionKind::from_wire(results[1]["action"].as_str().unwrap()),
        Some(ActionKind::PostMessage)
    );
}
