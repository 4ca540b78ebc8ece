//! Email adapter — sends mail through an HTTP gateway webhook.
//!
//! The gateway (a hosted workflow endpoint in front of the actual mail
//! provider) accepts a single POST with the message fields and performs the
//! send on its side.  Credentials are a bearer key plus the endpoint URL;
//! neither is required at startup, and calls without them fail with an
//! authorization error.

use async_trait::async_trait;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::info;

use crate::error::{AdapterError, Result};
use crate::traits::EmailPort;

/// Outbound request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Build the gateway payload for one email.
///
/// Recipients are joined into a single comma-separated `to` field, the shape
/// the gateway expects.
pub fn build_email_payload(to: &[String], subject: &str, body: &str, priority: bool) -> Value {
    json!({
        "to": to.join(", "),
        "subject": subject,
        "body": body,
        "priority": priority,
    })
}

/// Email gateway adapter.
pub struct EmailWebhookAdapter {
    /// Gateway endpoint URL.
    endpoint: Option<String>,
    /// Bearer key for the gateway.
    api_key: Option<String>,
    /// HTTP client for making requests.
    http: reqwest::Client,
}

impl EmailWebhookAdapter {
    /// Create an unconfigured adapter.  Calls will fail with a missing
    /// endpoint error until one is provided.
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .user_agent("courier/0.1")
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            endpoint: None,
            api_key: None,
            http,
        }
    }

    /// Create an adapter pointed at a gateway endpoint.
    pub fn with_config(endpoint: impl Into<String>, api_key: Option<String>) -> Self {
        let mut adapter = Self::new();
        adapter.endpoint = Some(endpoint.into());
        adapter.api_key = api_key;
        adapter
    }

    fn resolve_endpoint(&self) -> Result<&str> {
        self.endpoint
            .as_deref()
            .ok_or_else(|| AdapterError::MissingEndpoint {
                adapter: "email".into(),
                detail: "no email gateway endpoint configured".into(),
            })
    }
}

impl Default for EmailWebhookAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmailPort for EmailWebhookAdapter {
    async fn send(
        &self,
        to: &[String],
        subject: &str,
        body: &str,
        priority: bool,
    ) -> Result<Value> {
        let endpoint = self.resolve_endpoint()?;
        let payload = build_email_payload(to, subject, body, priority);

        info!(recipients = to.len(), subject = subject, priority = priority, "sending email");

        let mut request = self.http.post(endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| AdapterError::RequestFailed {
                adapter: "email".into(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        // The gateway acknowledges with 200 (sent) or 202 (queued).
        if status.as_u16() == 200 || status.as_u16() == 202 {
            let detail: Value = resp.json().await.unwrap_or(Value::Null);
            Ok(json!({"status": "email sent", "detail": detail}))
        } else {
            let text = resp.text().await.unwrap_or_default();
            Err(AdapterError::RequestFailed {
                adapter: "email".into(),
                reason: format!("gateway returned {status}: {text}"),
            })
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_joins_recipients() {
        let payload = build_email_payload(
            &["a@x.com".into(), "b@y.org".into()],
            "Outage",
            "All clear.",
            true,
        );
        assert_eq!(payload["to"], "a@x.com, b@y.org");
        assert_eq!(payload["subject"], "Outage");
        assert_eq!(payload["body"], "All clear.");
        assert_eq!(payload["priority"], true);
    }

    #[test]
    fn payload_single_recipient_has_no_separator() {
        let payload = build_email_payload(&["a@x.com".into()], "Hi", "hello", false);
        assert_eq!(payload["to"], "a@x.com");
        assert_eq!(payload["priority"], false);
    }

    #[tokio::test]
    async fn unconfigured_adapter_fails_without_network() {
        let adapter = EmailWebhookAdapter::new();
        let result = adapter.send(&["a@x.com".into()], "s", "b", false).await;
        assert!(matches!(result, Err(AdapterError::MissingEndpoint { .. })));
    }

    #[test]
    fn with_config_stores_endpoint() {
        let adapter =
            EmailWebhookAdapter::with_config("https://gw.example.com/email", Some("key".into()));
        assert_eq!(
            adapter.resolve_endpoint().unwrap(),
            "https://gw.example.com/email"
        );
    }
}
