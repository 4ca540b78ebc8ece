//! Integration port contracts.
//!
//! Each external integration is reached through one narrow async trait.  The
//! dispatcher only ever sees these ports; the reqwest-backed implementations
//! live in their own modules and tests substitute stubs.
//!
//! Contract shared by every port: success is a JSON value carrying a
//! `status` field; failure is an [`AdapterError`](crate::error::AdapterError)
//! and never anything that propagates past the dispatch boundary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use crate::error::Result;

/// Sends email through the mail gateway.
#[async_trait]
pub trait EmailPort: Send + Sync {
    async fn send(&self, to: &[String], subject: &str, body: &str, priority: bool)
    -> Result<Value>;
}

/// Posts a message to a chat channel.
///
/// `channel = None` means "use the adapter's configured default channel".
#[async_trait]
pub trait ChatPort: Send + Sync {
    async fn post(&self, channel: Option<&str>, text: &str, priority: bool) -> Result<Value>;
}

/// Sends a direct message to a single chat.
///
/// `chat_id = None` means "use the adapter's configured default chat".
#[async_trait]
pub trait DirectMessagePort: Send + Sync {
    async fn send(&self, chat_id: Option<&str>, text: &str, priority: bool) -> Result<Value>;
}

/// Creates a calendar event.
#[async_trait]
pub trait CalendarPort: Send + Sync {
    async fn create(
        &self,
        summary: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        attendees: &[String],
    ) -> Result<Value>;
}

/// Forwards a request to an arbitrary third-party integration.
#[async_trait]
pub trait ProxyPort: Send + Sync {
    async fn call(
        &self,
        app: &str,
        path: &str,
        method: &str,
        data: &Map<String, Value>,
    ) -> Result<Value>;
}
