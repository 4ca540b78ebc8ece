//! Slack adapter — posts messages via the `chat.postMessage` Web API.
//!
//! Authentication is a bot token.  A default channel can be configured so
//! requests that name no channel still land somewhere sensible.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::info;

use crate::error::{AdapterError, Result};
use crate::traits::ChatPort;

/// Slack Web API endpoint for posting messages.
const SLACK_POST_MESSAGE_URL: &str = "https://slack.com/api/chat.postMessage";

/// Outbound request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Parse a Slack Web API response, checking the `ok` field for errors.
///
/// Slack responses follow the format `{"ok": true, "ts": ..., "channel": ...}`
/// on success, or `{"ok": false, "error": "..."}` on failure.
pub fn parse_slack_response(response: &Value) -> Result<()> {
    let ok = response.get("ok").and_then(|v| v.as_bool()).unwrap_or(false);
    if !ok {
        let error = response
            .get("error")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error");
        return Err(AdapterError::InvalidResponse {
            adapter: "slack".into(),
            reason: format!("Slack API error: {error}"),
        });
    }
    Ok(())
}

/// Slack chat adapter.
pub struct SlackAdapter {
    /// Bot token used to authenticate API requests.
    bot_token: Option<String>,
    /// Channel used when the caller names none.
    default_channel: Option<String>,
    /// HTTP client for making requests.
    http: reqwest::Client,
}

impl SlackAdapter {
    /// Create an unconfigured adapter.  Calls will fail with an
    /// authorization error until a token is provided.
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .user_agent("courier/0.1")
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            bot_token: None,
            default_channel: None,
            http,
        }
    }

    /// Create an adapter with a bot token and an optional default channel.
    pub fn with_token(token: impl Into<String>, default_channel: Option<String>) -> Self {
        let mut adapter = Self::new();
        adapter.bot_token = Some(token.into());
        adapter.default_channel = default_channel;
        adapter
    }

    fn resolve_token(&self) -> Result<&str> {
        self.bot_token
            .as_deref()
            .ok_or_else(|| AdapterError::AuthRequired {
                adapter: "slack".into(),
                detail: "no bot token configured".into(),
            })
    }

    /// Pick the target channel: caller's choice first, then the default.
    fn resolve_channel<'a>(&'a self, channel: Option<&'a str>) -> Result<&'a str> {
        channel
            .filter(|c| !c.is_empty())
            .or(self.default_channel.as_deref())
            .ok_or_else(|| AdapterError::MissingParameter {
                adapter: "slack".into(),
                field: "channel".into(),
            })
    }
}

impl Default for SlackAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ChatPort for SlackAdapter {
    async fn post(&self, channel: Option<&str>, text: &str, priority: bool) -> Result<Value> {
        let token = self.resolve_token()?;
        let channel = self.resolve_channel(channel)?;

        info!(channel = channel, priority = priority, "posting chat message");

        let resp = self
            .http
            .post(SLACK_POST_MESSAGE_URL)
            .bearer_auth(token)
            .json(&json!({"channel": channel, "text": text}))
            .send()
            .await
            .map_err(|e| AdapterError::RequestFailed {
                adapter: "slack".into(),
                reason: e.to_string(),
            })?;

        let body: Value = resp
            .json()
            .await
            .map_err(|e| AdapterError::InvalidResponse {
                adapter: "slack".into(),
                reason: format!("non-JSON response: {e}"),
            })?;

        parse_slack_response(&body)?;

        Ok(json!({
            "status": "sent",
            "ts": body.get("ts").cloned().unwrap_or(Value::Null),
            "channel": channel,
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
