//! Generic proxy adapter — forwards requests to arbitrary third-party
//! integrations.
//!
//! Covers integrations the four built-in actions do not: each known app maps
//! to a base endpoint URL, and a call forwards `data` to `{endpoint}{path}`.
//! GET requests send no body; every other method is forwarded as a JSON
//! POST.

use async_trait::async_trait;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::time::Duration;
use tracing::info;

use crate::error::{AdapterError, Result};
use crate::traits::ProxyPort;

/// Outbound request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Join an app's base endpoint and a call path without doubling slashes.
pub fn join_endpoint(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Generic third-party proxy adapter.
pub struct ProxyAdapter {
    /// Known app names and their base endpoint URLs.
    endpoints: HashMap<String, String>,
    /// Bearer key sent with every forwarded request.
    api_key: Option<String>,
    /// HTTP client for making requests.
    http: reqwest::Client,
}

impl ProxyAdapter {
    /// Create an adapter with no known apps.
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .user_agent("courier/0.1")
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .unwrap_or_default();

        Self {
            endpoints: HashMap::new(),
            api_key: None,
            http,
        }
    }

    /// Create an adapter with a pre-built endpoint table.
    pub fn with_endpoints(endpoints: HashMap<String, String>, api_key: Option<String>) -> Self {
        let mut adapter = Self::new();
        adapter.endpoints = endpoints;
        adapter.api_key = api_key;
        adapter
    }

    /// Register an app endpoint.
    pub fn add_endpoint(&mut self, app: impl Into<String>, endpoint: impl Into<String>) {
        self.endpoints.insert(app.into(), endpoint.into());
    }

    fn resolve_endpoint(&self, app: &str) -> Result<&str> {
        self.endpoints
            .get(app)
            .map(String::as_str)
            .ok_or_else(|| AdapterError::MissingEndpoint {
                adapter: "proxy".into(),
                detail: format!("no endpoint configured for app `{app}`"),
            })
    }
}

impl Default for ProxyAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProxyPort for ProxyAdapter {
    async fn call(
        &self,
        app: &str,
        path: &str,
        method: &str,
        data: &Map<String, Value>,
    ) -> Result<Value> {
        let endpoint = self.resolve_endpoint(app)?;
        let url = join_endpoint(endpoint, path);

        info!(app = app, url = %url, method = method, "forwarding proxy request");

        let mut request = if method.eq_ignore_ascii_case("GET") {
            self.http.get(&url)
        } else {
            self.http.post(&url).json(data)
        };
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let resp = request
            .send()
            .await
            .map_err(|e| AdapterError::RequestFailed {
                adapter: "proxy".into(),
                reason: e.to_string(),
            })?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(AdapterError::RequestFailed {
                adapter: "proxy".into(),
                reason: format!("app `{app}` returned {status}: {text}"),
            });
        }

        serde_json::from_str(&text).map_err(|e| AdapterError::InvalidResponse {
            adapter: "proxy".into(),
            reason: format!("app `{app}` returned non-JSON body: {e}"),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_join_handles_slashes() {
        assert_eq!(
            join_endpoint("https://hooks.example.com/", "/v1/tickets"),
            "https://hooks.example.com/v1/tickets"
        );
        assert_eq!(
            join_endpoint("https://hooks.example.com", "v1/tickets"),
            "https://hooks.example.com/v1/tickets"
        );
    }

    #[test]
    fn endpoint_table_lookup() {
        let mut adapter = ProxyAdapter::new();
        adapter.add_endpoint("jira", "https://hooks.example.com/jira");
        assert_eq!(
            adapter.resolve_endpoint("jira").unwrap(),
            "https://hooks.example.com/jira"
        );
        assert!(matches!(
            adapter.resolve_endpoint("github"),
            Err(AdapterError::MissingEndpoint { .. })
        ));
    }

    #[tokio::test]
    async fn unknown_app_fails_without_network() {
        let adapter = ProxyAdapter::new();
        let result = adapter.call("jira", "/v1/tickets", "POST", &Map::new()).await;
        assert!(matches!(result, Err(AdapterError::MissingEndpoint { .. })));
    }
}
