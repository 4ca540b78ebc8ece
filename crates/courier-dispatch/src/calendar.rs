//! Calendar adapter — creates events through an HTTP gateway webhook.
//!
//! Mirrors the email gateway: one POST per event, bearer key auth, 200/202
//! acknowledgements.  Attendees are sent as `{"email": ...}` objects with
//! empty entries dropped.

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::info;

use crate::error::{AdapterError, Result};
use crate::traits::CalendarPort;

/// Outbound request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Build the gateway payload for one event.
pub fn build_event_payload(
    summary: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    attendees: &[String],
) -> Value {
    let attendees: Vec<Value> = attendees
        .iter()
        .filter(|e| !e.is_empty())
        .map(|e| json!({"email": e}))
        .collect();

    json!({
        "summary": summary,
        "start": start.to_rfc3339_opts(SecondsFormat::Secs, true),
        "end": end.to_rfc3339_opts(SecondsFormat::Secs, true),
        "attendees": attendees,
    })
}

/// Calendar gateway adapter.
pub struct CalendarWebhookAdapter {
    /// Gateway endpoint URL.
    endpoint: Option<String>,
    /// Bearer key for the gateway.
    api_key: Option<String>,
    /// HTTP client for making requests.
    http: reqwest::Client,
}

impl CalendarWebhookAdapter {
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
                adapter: "calendar".into(),
                detail: "no calendar gateway endpoint configured".into(),
            })
    }
}

impl Default for CalendarWebhookAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CalendarPort for CalendarWebhookAdapter {
    async fn create(
        &self,
        summary: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        attendees: &[String],
    ) -> Result<Value> {
        let endpoint = self.resolve_endpoint()?;
        let payload = build_event_payload(summary, start, end, attendees);

        info!(summary = summary, %start, %end, "creating calendar event");

        let mut request = self.http.post(endpoint).json(&payload);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| AdapterError::RequestFailed {
                adapter: "calendar".into(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        if status.as_u16() == 200 || status.as_u16() == 202 {
            let detail: Value = resp.json().await.unwrap_or(Value::Null);
            Ok(json!({"status": "event created", "detail": detail}))
        } else {
            let text = resp.text().await.unwrap_or_default();
            Err(AdapterError::RequestFailed {
                adapter: "calendar".into(),
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
    use chrono::TimeZone;

    #[test]
    fn payload_formats_times_and_attendees() {
        let start = Utc.with_ymd_and_hms(2025, 7, 26, 15, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 7, 26, 16, 0, 0).unwrap();
        let payload = build_event_payload(
            "Launch review",
            start,
            end,
            &["bob@x.com".into(), String::new(), "alice@y.org".into()],
        );

        assert_eq!(payload["summary"], "Launch review");
        assert_eq!(payload["start"], "2025-07-26T15:00:00Z");
        assert_eq!(payload["end"], "2025-07-26T16:00:00Z");
        // Empty attendee entries are dropped.
        assert_eq!(
            payload["attendees"],
            json!([{"email": "bob@x.com"}, {"email": "alice@y.org"}])
        );
    }

    #[test]
    fn payload_with_no_attendees() {
        let start = Utc.with_ymd_and_hms(2025, 7, 26, 15, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2025, 7, 26, 16, 0, 0).unwrap();
        let payload = build_event_payload("Solo focus block", start, end, &[]);
        assert_eq!(payload["attendees"], json!([]));
    }

    #[tokio::test]
    async fn unconfigured_adapter_fails_without_network() {
        let adapter = CalendarWebhookAdapter::new();
        let start = Utc.with_ymd_and_hms(2025, 7, 26, 15, 0, 0).unwrap();
        let result = adapter
            .create("Event", start, start + chrono::Duration::hours(1), &[])
            .await;
        assert!(matches!(result, Err(AdapterError::MissingEndpoint { .. })));
    }
}
