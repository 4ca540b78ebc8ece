//! Telegram adapter — sends direct messages via the Bot API.
//!
//! All method calls are POSTed to `{BASE_URL}{bot_token}/{method}`.
//! Authentication is a bot token obtained from @BotFather; a default chat id
//! can be configured for requests that name no chat.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::info;

use crate::error::{AdapterError, Result};
use crate::traits::DirectMessagePort;

/// Telegram Bot API base URL.
const TELEGRAM_API_BASE: &str = "https://api.telegram.org/bot";

/// Outbound request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Parse a Telegram Bot API response, checking the `ok` field for errors.
///
/// Telegram responses follow the format `{"ok": true, "result": {...}}` on
/// success, or `{"ok": false, "error_code": 400, "description": "..."}` on
/// failure.
pub fn parse_telegram_response(response: &Value) -> Result<()> {
    let ok = response.get("ok").and_then(|v| v.as_bool()).unwrap_or(false);
    if !ok {
        let error_code = response
            .get("error_code")
            .and_then(|v| v.as_i64())
            .unwrap_or(-1);
        let description = response
            .get("description")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown error");
        return Err(AdapterError::InvalidResponse {
            adapter: "telegram".into(),
            reason: format!("Telegram API error (code {error_code}): {description}"),
        });
    }
    Ok(())
}

/// Telegram direct-message adapter.
pub struct TelegramAdapter {
    /// Bot token used to authenticate API requests.
    bot_token: Option<String>,
    /// Chat used when the caller names none.
    default_chat_id: Option<String>,
    /// HTTP client for making requests.
    http: reqwest::Client,
}

impl TelegramAdapter {
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
            default_chat_id: None,
            http,
        }
    }

    /// Create an adapter with a bot token and an optional default chat.
    pub fn with_token(token: impl Into<String>, default_chat_id: Option<String>) -> Self {
        let mut adapter = Self::new();
        adapter.bot_token = Some(token.into());
        adapter.default_chat_id = default_chat_id;
        adapter
    }

    /// Build a full Bot API URL for the given method.
    fn api_url(&self, method: &str) -> Result<String> {
        let token = self
            .bot_token
            .as_deref()
            .ok_or_else(|| AdapterError::AuthRequired {
                adapter: "telegram".into(),
                detail: "no bot token configured".into(),
            })?;
        Ok(format!("{TELEGRAM_API_BASE}{token}/{method}"))
    }

    /// Pick the target chat: caller's choice first, then the default.
    fn resolve_chat_id<'a>(&'a self, chat_id: Option<&'a str>) -> Result<&'a str> {
        chat_id
            .filter(|c| !c.is_empty())
            .or(self.default_chat_id.as_deref())
            .ok_or_else(|| AdapterError::MissingParameter {
                adapter: "telegram".into(),
                field: "chat_id".into(),
            })
    }
}

impl Default for TelegramAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DirectMessagePort for TelegramAdapter {
    async fn send(&self, chat_id: Option<&str>, text: &str, priority: bool) -> Result<Value> {
        let url = self.api_url("sendMessage")?;
        let chat_id = self.resolve_chat_id(chat_id)?;

        info!(chat_id = chat_id, priority = priority, "sending direct message");

        let resp = self
            .http
            .post(&url)
            .json(&json!({"chat_id": chat_id, "text": text}))
            .send()
            .await
            .map_err(|e| AdapterError::RequestFailed {
                adapter: "telegram".into(),
                reason: e.to_string(),
            })?;

        let body: Value = resp
            .json()
            .await
            .map_err(|e| AdapterError::InvalidResponse {
                adapter: "telegram".into(),
                reason: format!("non-JSON response: {e}"),
            })?;

        parse_telegram_response(&body)?;

        Ok(json!({
            "status": "sent",
            "message_id": body
                .pointer("/result/message_id")
                .cloned()
                .unwrap_or(Value::Null),
        }))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ok_response_is_accepted() {
        let resp = json!({"ok": true, "result": {"message_id": 42}});
        assert!(parse_telegram_response(&resp).is_ok());
    }

    #[test]
    fn error_response_carries_code_and_description() {
        let resp = json!({"ok": false, "error_code": 403, "description": "bot was blocked"});
        let err = parse_telegram_response(&resp).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("403"), "message: {msg}");
        assert!(msg.contains("bot was blocked"), "message: {msg}");
    }

    #[test]
    fn api_url_embeds_token_and_method() {
        let adapter = TelegramAdapter::with_token("123:abc", None);
        assert_eq!(
            adapter.api_url("sendMessage").unwrap(),
            "https://api.telegram.org/bot123:abc/sendMessage"
        );
    }

    #[test]
    fn api_url_without_token_is_auth_error() {
        let adapter = TelegramAdapter::new();
        assert!(matches!(
            adapter.api_url("sendMessage"),
            Err(AdapterError::AuthRequired { .. })
        ));
    }

    #[test]
    fn chat_resolution_prefers_caller() {
        let adapter = TelegramAdapter::with_token("123:abc", Some("777".into()));
        assert_eq!(adapter.resolve_chat_id(Some("42")).unwrap(), "42");
        assert_eq!(adapter.resolve_chat_id(None).unwrap(), "777");
    }

    #[tokio::test]
    async fn missing_token_fails_without_network() {
        let adapter = TelegramAdapter::new();
        let result = adapter.send(Some("42"), "hi", false).await;
        assert!(matches!(result, Err(AdapterError::AuthRequired { .. })));
    }
}
