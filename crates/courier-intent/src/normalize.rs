//! Parameter normalization — from untrusted raw arguments to typed,
//! validated per-action parameters.
//!
//! The resolver's output (model or keyword) is a loose JSON map.  This module
//! is the single gate between that map and the dispatcher: it resolves
//! relative timestamps, fills defaults, renames fields to the canonical
//! schema, and derives the priority flag from the original text.  Nothing
//! reaches an adapter without passing through here.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use serde_json::{Map, Value, json};

use crate::error::{IntentError, Result};
use crate::extract::parse_priority;
use crate::schema::ActionKind;
use crate::timeparse;

/// Default event length when no end time is given.
const DEFAULT_EVENT_HOURS: i64 = 1;

/// Default subject for calendar events with no summary.
const DEFAULT_EVENT_SUBJECT: &str = "Calendar Event";

// ---------------------------------------------------------------------------
// TimeWindow
// ---------------------------------------------------------------------------

/// A validated event window.  `end` is always strictly after `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Build a window from a start and an optional end.
    ///
    /// A missing end defaults to exactly one hour after the start.  An end
    /// at or before the start is a validation error.
    pub fn new(start: DateTime<Utc>, end: Option<DateTime<Utc>>) -> Result<Self> {
        let end = end.unwrap_or(start + Duration::hours(DEFAULT_EVENT_HOURS));
        if end <= start {
            return Err(IntentError::Validation {
                action: ActionKind::CreateCalendarEvent.to_string(),
                reason: format!("end time {end} is not after start time {start}"),
            });
        }
        Ok(Self { start, end })
    }
}

// ---------------------------------------------------------------------------
// CanonicalAction
// ---------------------------------------------------------------------------

/// Canonical, fully-typed parameters for one dispatchable action.
///
/// Invariant: every required field for the action is present and typed by
/// the time a value of this enum exists.  Fields that may still fall back to
/// adapter-level defaults (chat channel, DM chat id) stay `Option` and are
/// checked at the dispatch gate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum CanonicalAction {
    /// `send_email`
    Email {
        recipients: Vec<String>,
        subject: String,
        body: String,
        priority: bool,
    },
    /// `post_message`
    ChatMessage {
        channel: Option<String>,
        body: String,
        priority: bool,
    },
    /// `send_telegram_message`
    DirectMessage {
        chat_id: Option<String>,
        body: String,
        priority: bool,
    },
    /// `create_calendar_event`
    CalendarEvent {
        subject: String,
        window: TimeWindow,
        recipients: Vec<String>,
        description: Option<String>,
        priority: bool,
    },
    /// `proxy_request`
    Proxy {
        app: String,
        path: String,
        method: String,
        data: Map<String, Value>,
    },
}

impl CanonicalAction {
    /// The action kind this parameter set belongs to.
    pub fn kind(&self) -> ActionKind {
        match self {
            Self::Email { .. } => ActionKind::SendEmail,
            Self::ChatMessage { .. } => ActionKind::PostMessage,
            Self::DirectMessage { .. } => ActionKind::SendTelegramMessage,
            Self::CalendarEvent { .. } => ActionKind::CreateCalendarEvent,
            Self::Proxy { .. } => ActionKind::ProxyRequest,
        }
    }
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Normalize raw resolver output into canonical parameters.
///
/// `original_text` is the unmodified request text; the priority flag is
/// always derived from it, never taken from the resolver's extraction.
/// `reference_now` anchors relative date/time expressions.
pub fn normalize(
    action: ActionKind,
    raw_params: &Map<String, Value>,
    original_text: &str,
    reference_now: DateTime<Utc>,
) -> Result<CanonicalAction> {
    let priority = parse_priority(original_text);

    match action {
        ActionKind::SendEmail => Ok(CanonicalAction::Email {
            recipients: string_list(raw_params, "to"),
            subject: string_field(raw_params, "subject").unwrap_or_default(),
            body: string_field(raw_params, "body").unwrap_or_default(),
            priority,
        }),

        ActionKind::PostMessage => Ok(CanonicalAction::ChatMessage {
            channel: string_field(raw_params, "channel"),
            body: message_body(raw_params, original_text),
            priority,
        }),

        ActionKind::SendTelegramMessage => Ok(CanonicalAction::DirectMessage {
            chat_id: string_field(raw_params, "chat_id"),
            body: message_body(raw_params, original_text),
            priority,
        }),

        ActionKind::CreateCalendarEvent => {
            normalize_calendar(raw_params, priority, reference_now)
        }

        ActionKind::ProxyRequest => normalize_proxy(raw_params, priority),

        ActionKind::NoAction | ActionKind::Error => Err(IntentError::Unsupported {
            action: action.to_string(),
        }),
    }
}

/// Calendar events: the start time is the one hard requirement.
fn normalize_calendar(
    raw_params: &Map<String, Value>,
    priority: bool,
    reference_now: DateTime<Utc>,
) -> Result<CanonicalAction> {
    let start = string_field(raw_params, "start_time")
        .and_then(|s| timeparse::parse_datetime(&s, reference_now))
        .ok_or_else(|| IntentError::Validation {
            action: ActionKind::CreateCalendarEvent.to_string(),
            reason: "missing or unparseable start time for calendar event".into(),
        })?;

    // An unparseable end degrades to the default duration rather than
    // failing the whole event.
    let end = string_field(raw_params, "end_time")
        .and_then(|s| timeparse::parse_datetime(&s, reference_now));

    let window = TimeWindow::new(start, end)?;

    Ok(CanonicalAction::CalendarEvent {
        subject: string_field(raw_params, "summary")
            .unwrap_or_else(|| DEFAULT_EVENT_SUBJECT.to_string()),
        window,
        recipients: string_list(raw_params, "attendees"),
        description: string_field(raw_params, "description"),
        priority,
    })
}

/// Proxy calls: `app` and `path` are required; the priority flag rides in
/// the forwarded data payload.
fn normalize_proxy(raw_params: &Map<String, Value>, priority: bool) -> Result<CanonicalAction> {
    let app = string_field(raw_params, "app").ok_or_else(|| IntentError::Validation {
        action: ActionKind::ProxyRequest.to_string(),
        reason: "missing required field `app`".into(),
    })?;
    let path = string_field(raw_params, "path").ok_or_else(|| IntentError::Validation {
        action: ActionKind::ProxyRequest.to_string(),
        reason: "missing required field `path`".into(),
    })?;

    let mut data = raw_params
        .get("data")
        .and_then(|v| v.as_object())
        .cloned()
        .unwrap_or_default();
    data.insert("priority".into(), json!(priority));

    Ok(CanonicalAction::Proxy {
        app,
        path,
        method: string_field(raw_params, "method")
            .map(|m| m.to_uppercase())
            .unwrap_or_else(|| "POST".to_string()),
        data,
    })
}

/// Chat-style bodies: rename `text` to `body`, never leave content empty.
fn message_body(raw_params: &Map<String, Value>, original_text: &str) -> String {
    string_field(raw_params, "text").unwrap_or_else(|| original_text.to_string())
}

// ---------------------------------------------------------------------------
// Field helpers
// ---------------------------------------------------------------------------

/// A string field, if present and actually a string.
fn string_field(map: &Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(|v| v.as_str()).map(str::to_string)
}

/// A string-array field.  A lone string is promoted to a one-element list;
/// non-string array entries are dropped.
fn string_list(map: &Map<String, Value>, key: &str) -> Vec<String> {
    match map.get(key) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) => vec![s.clone()],
        _ => Vec::new(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
