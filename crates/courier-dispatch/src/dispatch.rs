//! The dispatcher — last gate between canonical parameters and the network.
//!
//! One dispatch performs at most one port call; preview dispatches perform
//! none.  Required-field checks that depend on adapter defaults (non-empty
//! email recipients, a resolvable chat target) happen here, immediately
//! before the call.  Port failures are caught and returned as data — a
//! rejected dispatch is an outcome, not a fault, and concurrent sibling
//! dispatches never see it.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use courier_intent::{ActionKind, CanonicalAction};

use crate::traits::{CalendarPort, ChatPort, DirectMessagePort, EmailPort, ProxyPort};

/// Maximum body length included in a preview.
const PREVIEW_BODY_CHARS: usize = 200;

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Terminal state of one dispatch.  The three states are mutually exclusive
/// and final for the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStatus {
    /// The adapter call was made and acknowledged.
    Dispatched,
    /// A side-effect-free projection was produced instead of a call.
    Previewed,
    /// The dispatch was refused before or at the adapter boundary.
    Rejected,
}

/// The result of dispatching one action.
#[derive(Debug, Clone, Serialize)]
pub struct DispatchOutcome {
    /// Which action this outcome belongs to.
    pub action: ActionKind,
    /// Terminal state.
    pub status: DispatchStatus,
    /// Adapter acknowledgement, preview projection, or error detail.
    pub payload: Value,
}

impl DispatchOutcome {
    fn dispatched(action: ActionKind, payload: Value) -> Self {
        Self {
            action,
            status: DispatchStatus::Dispatched,
            payload,
        }
    }

    fn previewed(action: ActionKind, payload: Value) -> Self {
        Self {
            action,
            status: DispatchStatus::Previewed,
            payload,
        }
    }

    /// Build a rejection carrying the action name and failure detail.
    pub fn rejected(action: ActionKind, detail: impl Into<String>) -> Self {
        Self {
            action,
            status: DispatchStatus::Rejected,
            payload: json!({"error": detail.into()}),
        }
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

/// Routes canonical actions to their integration ports.
///
/// Holds one port per action; all state is read-only after construction, so
/// a single dispatcher is shared across concurrent requests without locks.
pub struct Dispatcher {
    email: Arc<dyn EmailPort>,
    chat: Arc<dyn ChatPort>,
    direct: Arc<dyn DirectMessagePort>,
    calendar: Arc<dyn CalendarPort>,
    proxy: Arc<dyn ProxyPort>,
}

impl Dispatcher {
    /// Create a dispatcher over the given ports.
    pub fn new(
        email: Arc<dyn EmailPort>,
        chat: Arc<dyn ChatPort>,
        direct: Arc<dyn DirectMessagePort>,
        calendar: Arc<dyn CalendarPort>,
        proxy: Arc<dyn ProxyPort>,
    ) -> Self {
        Self {
            email,
            chat,
            direct,
            calendar,
            proxy,
        }
    }

    /// Dispatch one action.
    ///
    /// With `preview` set, returns the projection of what would be sent and
    /// performs no external call.
    pub async fn dispatch(&self, action: &CanonicalAction, preview: bool) -> DispatchOutcome {
        let kind = action.kind();

        if preview {
            return DispatchOutcome::previewed(kind, preview_payload(action));
        }

        let result = match action {
            CanonicalAction::Email {
                recipients,
                subject,
                body,
                priority,
            } => {
                let recipients: Vec<String> =
                    recipients.iter().filter(|r| !r.is_empty()).cloned().collect();
                if recipients.is_empty() {
                    warn!("email dispatch rejected: no recipients");
                    return DispatchOutcome::rejected(kind, "no recipients for email");
                }
                self.email.send(&recipients, subject, body, *priority).await
            }

            CanonicalAction::ChatMessage {
                channel,
                body,
                priority,
            } => self.chat.post(channel.as_deref(), body, *priority).await,

            CanonicalAction::DirectMessage {
                chat_id,
                body,
                priority,
            } => self.direct.send(chat_id.as_deref(), body, *priority).await,

            CanonicalAction::CalendarEvent {
                subject,
                window,
                recipients,
                ..
            } => {
                self.calendar
                    .create(subject, window.start, window.end, recipients)
                    .await
            }

            CanonicalAction::Proxy {
                app,
                path,
                method,
                data,
            } => self.proxy.call(app, path, method, data).await,
        };

        match result {
            Ok(payload) => {
                info!(action = %kind, "dispatched");
                DispatchOutcome::dispatched(kind, payload)
            }
            Err(e) => {
                warn!(action = %kind, error = %e, "adapter call failed");
                DispatchOutcome::rejected(kind, e.to_string())
            }
        }
    }

    /// Dispatch every action concurrently and independently.
    ///
    /// Results are positional: outcome `i` belongs to action `i`.  One
    /// adapter's failure or latency never blocks or corrupts another's
    /// result.
    pub async fn dispatch_all(
        &self,
        actions: &[CanonicalAction],
        preview: bool,
    ) -> Vec<DispatchOutcome> {
        join_all(actions.iter().map(|a| self.dispatch(a, preview))).await
    }
}

// ---------------------------------------------------------------------------
// Preview projection
// ---------------------------------------------------------------------------

/// Truncate a body to the bounded preview length.
fn truncate_body(body: &str) -> String {
    body.chars().take(PREVIEW_BODY_CHARS).collect()
}

/// Build the side-effect-free projection of what a dispatch would send.
fn preview_payload(action: &CanonicalAction) -> Value {
    let params = match action {
        CanonicalAction::Email {
            recipients,
            subject,
            body,
            priority,
        } => json!({
            "recipients": recipients,
            "subject": subject,
            "body": truncate_body(body),
            "priority": priority,
        }),

        CanonicalAction::ChatMessage {
            channel,
            body,
            priority,
        } => json!({
            "channel": channel,
            "body": truncate_body(body),
            "priority": priority,
        }),

        CanonicalAction::DirectMessage {
            chat_id,
            body,
            priority,
        } => json!({
            "chat_id": chat_id,
            "body": truncate_body(body),
            "priority": priority,
        }),

        CanonicalAction::CalendarEvent {
            subject,
            window,
            recipients,
            description,
            priority,
        } => json!({
            "subject": subject,
            "start": window.start.to_rfc3339(),
            "end": window.end.to_rfc3339(),
            "recipients": recipients,
            "description": description.as_deref().map(truncate_body),
            "priority": priority,
        }),

        CanonicalAction::Proxy {
            app,
            path,
            method,
            data,
        } => json!({
            "app": app,
            "path": path,
            "method": method,
            "data": data,
        }),
    };

    json!({"preview": {"action": action.kind(), "params": params}})
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
