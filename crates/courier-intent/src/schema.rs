//! The closed action set and its declared schema.
//!
//! [`ActionKind`] is the closed enum of everything the router can do with a
//! request.  [`action_declarations`] turns the static per-action schema into
//! the tool definitions handed to the model, so intent classification and
//! parameter extraction happen in one function-calling round trip.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use courier_llm::ToolDefinition;

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

/// One of the closed set of outcomes for a resolved request.
///
/// The first five variants are dispatchable actions; `NoAction` and `Error`
/// are terminal resolution outcomes that never reach the dispatcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// Send an email through the mail gateway.
    SendEmail,
    /// Post a message to a chat channel.
    PostMessage,
    /// Send a direct message via the messaging bot.
    SendTelegramMessage,
    /// Create a calendar event.
    CreateCalendarEvent,
    /// Forward a request to an arbitrary third-party integration.
    ProxyRequest,
    /// The resolver found no actionable intent.
    NoAction,
    /// Resolution itself failed.
    Error,
}

impl ActionKind {
    /// The wire name used in tool declarations and HTTP payloads.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::SendEmail => "send_email",
            Self::PostMessage => "post_message",
            Self::SendTelegramMessage => "send_telegram_message",
            Self::CreateCalendarEvent => "create_calendar_event",
            Self::ProxyRequest => "proxy_request",
            Self::NoAction => "no_action",
            Self::Error => "error",
        }
    }

    /// Look up an action by its wire name.  Returns `None` for anything
    /// outside the closed set (the model's output is untrusted).
    pub fn from_wire(name: &str) -> Option<Self> {
        match name {
            "send_email" => Some(Self::SendEmail),
            "post_message" => Some(Self::PostMessage),
            "send_telegram_message" => Some(Self::SendTelegramMessage),
            "create_calendar_event" => Some(Self::CreateCalendarEvent),
            "proxy_request" => Some(Self::ProxyRequest),
            "no_action" => Some(Self::NoAction),
            "error" => Some(Self::Error),
            _ => None,
        }
    }

    /// Whether this action can be handed to the dispatcher.
    pub fn is_dispatchable(self) -> bool {
        !matches!(self, Self::NoAction | Self::Error)
    }
}

impl std::fmt::Display for ActionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

// ---------------------------------------------------------------------------
// ResolvedAction
// ---------------------------------------------------------------------------

/// The outcome of intent resolution: a chosen action plus the raw, untyped
/// argument map as produced by the resolver.
///
/// `raw_params` is untrusted input — every field passes through explicit
/// validation in [`crate::normalize`] before dispatch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolvedAction {
    /// The chosen action, or `NoAction`/`Error`.
    pub action: ActionKind,

    /// Raw argument map from the resolver.
    pub raw_params: Map<String, Value>,
}

impl ResolvedAction {
    /// Create a resolution with the given action and raw parameters.
    pub fn new(action: ActionKind, raw_params: Map<String, Value>) -> Self {
        Self { action, raw_params }
    }

    /// The "nothing to do" resolution, carrying the original text.
    pub fn no_action(text: &str) -> Self {
        let mut raw_params = Map::new();
        raw_params.insert("message".into(), json!("No action detected"));
        raw_params.insert("body".into(), json!(text));
        Self {
            action: ActionKind::NoAction,
            raw_params,
        }
    }

    /// A failed resolution, carrying the failure description and the
    /// original text.
    pub fn error(message: impl Into<String>, text: &str) -> Self {
        let mut raw_params = Map::new();
        raw_params.insert("message".into(), json!(message.into()));
        raw_params.insert("body".into(), json!(text));
        Self {
            action: ActionKind::Error,
            raw_params,
        }
    }

    /// The `message` field of a `no_action`/`error` resolution, if any.
    pub fn message(&self) -> Option<&str> {
        self.raw_params.get("message").and_then(|v| v.as_str())
    }
}

// ---------------------------------------------------------------------------
// Action schema declarations
// ---------------------------------------------------------------------------

/// Build the static tool declarations for every dispatchable action.
///
/// Fixed at startup; the resolver presents these to the model verbatim on
/// every call.
pub fn action_declarations() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition {
            name: "send_email".into(),
            description: "Send an email.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "to": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Recipient email addresses"
                    },
                    "subject": {"type": "string"},
                    "body": {"type": "string"},
                    "priority": {"type": "boolean"}
                },
                "required": ["to", "subject", "body"]
            }),
        },
        ToolDefinition {
            name: "post_message".into(),
            description: "Post a message to a Slack channel.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "channel": {"type": "string"},
                    "text": {"type": "string"},
                    "priority": {"type": "boolean"}
                },
                "required": ["channel", "text"]
            }),
        },
        ToolDefinition {
            name: "send_telegram_message".into(),
            description: "Send a Telegram message.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "chat_id": {"type": "string"},
                    "text": {"type": "string"},
                    "priority": {"type": "boolean"}
                },
                "required": ["chat_id", "text"]
            }),
        },
        ToolDefinition {
            name: "create_calendar_event".into(),
            description: "Create a calendar event.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "summary": {"type": "string"},
                    "start_time": {
                        "type": "string",
                        "format": "date-time"
                    },
                    "end_time": {
                        "type": "string",
                        "format": "date-time"
                    },
                    "attendees": {
                        "type": "array",
                        "items": {"type": "string"}
                    },
                    "description": {"type": "string"}
                },
                "required": ["summary", "start_time", "end_time"]
            }),
        },
        ToolDefinition {
            name: "proxy_request".into(),
            description: "Forward a request to a third-party integration not covered by the built-in actions.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "app": {"type": "string"},
                    "path": {"type": "string"},
                    "method": {"type": "string"},
                    "data": {"type": "object"}
                },
                "required": ["app", "path"]
            }),
        },
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip() {
        for kind in [
            ActionKind::SendEmail,
            ActionKind::PostMessage,
            ActionKind::SendTelegramMessage,
            ActionKind::CreateCalendarEvent,
            ActionKind::ProxyRequest,
            ActionKind::NoAction,
            ActionKind::Error,
        ] {
            assert_eq!(ActionKind::from_wire(kind.wire_name()), Some(kind));
        }
    }

    #[test]
    fn unknown_wire_name_is_rejected() {
        assert_eq!(ActionKind::from_wire("rm_rf_slash"), None);
        assert_eq!(ActionKind::from_wire(""), None);
    }

    #[test]
    fn dispatchability() {
        assert!(ActionKind::SendEmail.is_dispatchable());
        assert!(ActionKind::ProxyRequest.is_dispatchable());
        assert!(!ActionKind::NoAction.is_dispatchable());
        assert!(!ActionKind::Error.is_dispatchable());
    }

    #[test]
    fn serde_uses_snake_case() {
        let v = serde_json::to_value(ActionKind::CreateCalendarEvent).unwrap();
        assert_eq!(v, "create_calendar_event");
        let k: ActionKind = serde_json::from_value(v).unwrap();
        assert_eq!(k, ActionKind::CreateCalendarEvent);
    }

    #[test]
    fn no_action_resolution_carries_text() {
        let resolved = ResolvedAction::no_action("do something vague");
        assert_eq!(resolved.action, ActionKind::NoAction);
        assert_eq!(resolved.message(), Some("No action detected"));
        assert_eq!(
            resolved.raw_params.get("body").and_then(|v| v.as_str()),
            Some("do something vague")
        );
    }

    #[test]
    fn declarations_cover_dispatchable_actions() {
        let decls = action_declarations();
        let names: Vec<&str> = decls.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "send_email",
                "post_message",
                "send_telegram_message",
                "create_calendar_event",
                "proxy_request"
            ]
        );
        for decl in &decls {
            assert_eq!(decl.input_schema["type"], "object");
            assert!(decl.input_schema.get("required").is_some());
        }
    }

    #[test]
    fn calendar_declaration_requires_times() {
        let decls = action_declarations();
        let cal = decls
            .iter()
            .find(|d| d.name == "create_calendar_event")
            .unwrap();
        let required: Vec<&str> = cal.input_schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert!(required.contains(&"summary"));
        assert!(required.contains(&"start_time"));
        assert!(required.contains(&"end_time"));
    }
}
