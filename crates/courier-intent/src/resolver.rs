//! Intent resolution — from free-form text to a chosen action.
//!
//! One capability, two interchangeable strategies:
//!
//! 1. [`ModelResolver`] — one function-calling round trip against an LLM.
//!    The model sees the fixed reference timestamp, the declared schema for
//!    every supported action, and the user text, and selects at most one
//!    action with an argument map.
//! 2. [`KeywordResolver`] — pure local keyword matching (aho-corasick) over
//!    the text, with arguments filled from the entity extractor.  Can detect
//!    several channels in one message; each becomes its own resolution.
//!
//! Both are infallible by contract: every failure mode collapses into a
//! `ResolvedAction` tagged `no_action` or `error`, never a crash.

use std::sync::Arc;

use aho_corasick::AhoCorasick;
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Value, json};
use tracing::{debug, info, warn};

use courier_llm::{ChatRequest, LlmClient, LlmResponse, Message};

use crate::extract;
use crate::schema::{ActionKind, ResolvedAction, action_declarations};

// ---------------------------------------------------------------------------
// Capability trait
// ---------------------------------------------------------------------------

/// Resolves request text into one or more actions.
///
/// Implementations are stateless per call; the declared schema and the
/// reference-time injection are their only configuration.
#[async_trait]
pub trait IntentResolver: Send + Sync {
    /// Resolve the text into a single action (or `no_action`/`error`).
    async fn resolve(&self, text: &str, reference_now: DateTime<Utc>) -> ResolvedAction;

    /// Resolve the text into every detected action.
    ///
    /// The default is the single-action path; the keyword strategy overrides
    /// this to fan one message out to all mentioned channels.
    async fn resolve_all(&self, text: &str, reference_now: DateTime<Utc>) -> Vec<ResolvedAction> {
        vec![self.resolve(text, reference_now).await]
    }
}

// ---------------------------------------------------------------------------
// Model-backed strategy
// ---------------------------------------------------------------------------

/// LLM-backed resolver using structured function calling.
///
/// Classification and parameter extraction happen in the same model call,
/// at the cost of needing full post-validation downstream — the returned
/// argument map is untrusted.
pub struct ModelResolver {
    llm: Arc<LlmClient>,
    model: String,
}

impl ModelResolver {
    /// Create a resolver backed by the given client and model id.
    pub fn new(llm: Arc<LlmClient>, model: impl Into<String>) -> Self {
        Self {
            llm,
            model: model.into(),
        }
    }

    /// Build the routing prompt anchored at the reference instant, so that
    /// relative phrases like "tomorrow" resolve consistently.
    fn system_prompt(reference_now: DateTime<Utc>) -> String {
        let now_iso = reference_now.to_rfc3339_opts(SecondsFormat::Secs, true);
        format!(
            "You are an intelligent assistant that routes user requests. \
             The current date and time is {now_iso}. \
             Select at most one action for the request. \
             For calendar events: extract the summary (title) and make sure \
             start_time and end_time are ISO 8601 (YYYY-MM-DDTHH:MM:SS). \
             If information is missing and cannot be inferred, do not invent it."
        )
    }

    /// Convert a tool selection into a resolution, rejecting names outside
    /// the closed action set.
    fn from_tool_call(name: &str, arguments: &Value, text: &str) -> ResolvedAction {
        let Some(action) = ActionKind::from_wire(name) else {
            warn!(tool = name, "model selected an unknown action");
            return ResolvedAction::error(format!("model selected unknown action `{name}`"), text);
        };

        let raw_params = arguments.as_object().cloned().unwrap_or_else(|| {
            warn!(tool = name, "model arguments were not an object");
            Map::new()
        });

        ResolvedAction::new(action, raw_params)
    }
}

#[async_trait]
impl IntentResolver for ModelResolver {
    async fn resolve(&self, text: &str, reference_now: DateTime<Utc>) -> ResolvedAction {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                Message::system(Self::system_prompt(reference_now)),
                Message::user(text),
            ],
            tools: action_declarations(),
            temperature: Some(0.0),
            max_tokens: Some(512),
        };

        match self.llm.chat(&request).await {
            Ok(LlmResponse::ToolCalls(calls)) => match calls.first() {
                Some(call) => {
                    info!(action = %call.name, "model selected action");
                    Self::from_tool_call(&call.name, &call.arguments, text)
                }
                None => ResolvedAction::no_action(text),
            },
            Ok(LlmResponse::Text(reply)) => {
                debug!(reply = %reply, "model declined to select an action");
                ResolvedAction::no_action(text)
            }
            Err(e) => {
                warn!(error = %e, "model resolution failed");
                ResolvedAction::error(format!("resolution call failed: {e}"), text)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Keyword strategy
// ---------------------------------------------------------------------------

/// Channel keywords and the action each one routes to.
const CHANNEL_KEYWORDS: &[(&str, ActionKind)] = &[
    ("email", ActionKind::SendEmail),
    ("e-mail", ActionKind::SendEmail),
    ("mail", ActionKind::SendEmail),
    ("slack", ActionKind::PostMessage),
    ("telegram", ActionKind::SendTelegramMessage),
    ("calendar", ActionKind::CreateCalendarEvent),
    ("meeting", ActionKind::CreateCalendarEvent),
    ("schedule", ActionKind::CreateCalendarEvent),
    ("appointment", ActionKind::CreateCalendarEvent),
];

/// Local keyword-routing resolver.
///
/// No model call: channels are detected by keyword scan and arguments come
/// from the entity extractor.  Deterministic and latency-free, at the cost
/// of recall on phrasing the keyword table does not cover.
pub struct KeywordResolver {
    automaton: AhoCorasick,
}

impl KeywordResolver {
    /// Build the resolver with its keyword automaton.
    pub fn new() -> Self {
        let patterns: Vec<&str> = CHANNEL_KEYWORDS.iter().map(|(kw, _)| *kw).collect();
        // The pattern table is static and valid; construction cannot fail.
        let automaton = AhoCorasick::new(&patterns)
            .unwrap_or_else(|e| panic!("keyword automaton construction failed: {e}"));
        Self { automaton }
    }

    /// Detect all distinct actions mentioned in the text, in first-appearance
    /// order.
    fn detect(&self, text: &str) -> Vec<ActionKind> {
        let lowered = text.to_lowercase();
        let mut detected = Vec::new();

        for mat in self.automaton.find_iter(&lowered) {
            let (_, action) = CHANNEL_KEYWORDS[mat.pattern().as_usize()];
            if !detected.contains(&action) {
                detected.push(action);
            }
        }

        detected
    }

    /// Build the raw argument map for one detected action from the
    /// extraction.
    fn raw_params_for(
        action: ActionKind,
        extraction: &extract::Extraction,
    ) -> Map<String, Value> {
        let mut raw = Map::new();
        match action {
            ActionKind::SendEmail => {
                raw.insert("to".into(), json!(extraction.recipients));
                raw.insert("subject".into(), json!(extraction.subject));
                raw.insert("body".into(), json!(extraction.body));
            }
            ActionKind::PostMessage | ActionKind::SendTelegramMessage => {
                raw.insert("text".into(), json!(extraction.body));
            }
            ActionKind::CreateCalendarEvent => {
                raw.insert("summary".into(), json!(extraction.subject));
                if let Some(dt) = extraction.datetime {
                    raw.insert("start_time".into(), json!(dt.to_rfc3339()));
                }
                raw.insert("attendees".into(), json!(extraction.recipients));
            }
            _ => {}
        }
        raw
    }
}

impl Default for KeywordResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IntentResolver for KeywordResolver {
    async fn resolve(&self, text: &str, reference_now: DateTime<Utc>) -> ResolvedAction {
        self.resolve_all(text, reference_now)
            .await
            .into_iter()
            .next()
            .unwrap_or_else(|| ResolvedAction::no_action(text))
    }

    async fn resolve_all(&self, text: &str, reference_now: DateTime<Utc>) -> Vec<ResolvedAction> {
        let detected = self.detect(text);
        if detected.is_empty() {
            debug!("no channel keywords detected");
            return vec![ResolvedAction::no_action(text)];
        }

        let extraction = extract::extract(text, reference_now);
        info!(actions = ?detected, "keyword routing detected channels");

        detected
            .into_iter()
            .map(|action| ResolvedAction::new(action, Self::raw_params_for(action, &extraction)))
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 25, 22, 49, 2).unwrap()
    }

    // -- Model tool-call conversion ------------------------------------------

    #[test]
    fn tool_call_maps_to_action() {
        let args = json!({"to": ["bob@x.com"], "subject": "Hi", "body": "hello"});
        let resolved = ModelResolver::from_tool_call("send_email", &args, "mail bob");
        assert_eq!(resolved.action, ActionKind::SendEmail);
        assert_eq!(
            resolved.raw_params.get("subject").and_then(|v| v.as_str()),
            Some("Hi")
        );
    }

    #[test]
    fn unknown_tool_name_is_error_resolution() {
        let resolved = ModelResolver::from_tool_call("launch_missiles", &json!({}), "do it");
        assert_eq!(resolved.action, ActionKind::Error);
        assert!(resolved.message().unwrap().contains("launch_missiles"));
    }

    #[test]
    fn non_object_arguments_become_empty_map() {
        let resolved = ModelResolver::from_tool_call("post_message", &json!("garbage"), "post");
        assert_eq!(resolved.action, ActionKind::PostMessage);
        assert!(resolved.raw_params.is_empty());
    }

    #[test]
    fn system_prompt_carries_reference_time() {
        let prompt = ModelResolver::system_prompt(reference());
        assert!(prompt.contains("2025-07-25T22:49:02Z"), "prompt: {prompt}");
    }

    // -- Keyword detection ---------------------------------------------------

    #[tokio::test]
    async fn detects_single_channel() {
        let resolver = KeywordResolver::new();
        let resolved = resolver.resolve("email the team about the outage", reference()).await;
        assert_eq!(resolved.action, ActionKind::SendEmail);
    }

    #[tokio::test]
    async fn detects_multiple_channels_in_order() {
        let resolver = KeywordResolver::new();
        let all = resolver
            .resolve_all("post to slack and send a telegram to bob", reference())
            .await;
        let actions: Vec<ActionKind> = all.iter().map(|r| r.action).collect();
        assert_eq!(
            actions,
            vec![ActionKind::PostMessage, ActionKind::SendTelegramMessage]
        );
    }

    #[tokio::test]
    async fn duplicate_keywords_collapse() {
        let resolver = KeywordResolver::new();
        let all = resolver
            .resolve_all("email the email team by email", reference())
            .await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].action, ActionKind::SendEmail);
    }

    #[tokio::test]
    async fn no_keywords_is_no_action() {
        let resolver = KeywordResolver::new();
        let all = resolver.resolve_all("what is the meaning of life", reference()).await;
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].action, ActionKind::NoAction);
        assert_eq!(all[0].message(), Some("No action detected"));
    }

    #[tokio::test]
    async fn keyword_email_params_from_extraction() {
        let resolver = KeywordResolver::new();
        let resolved = resolver
            .resolve("mail bob@x.com about 'Launch' tomorrow urgent", reference())
            .await;
        assert_eq!(resolved.action, ActionKind::SendEmail);
        assert_eq!(resolved.raw_params.get("to"), Some(&json!(["bob@x.com"])));
        assert_eq!(resolved.raw_params.get("subject"), Some(&json!("Launch")));
    }

    #[tokio::test]
    async fn keyword_calendar_params_carry_start_time() {
        let resolver = KeywordResolver::new();
        let resolved = resolver
            .resolve("schedule 'Design review' tomorrow at 2pm", reference())
            .await;
        assert_eq!(resolved.action, ActionKind::CreateCalendarEvent);
        let start = resolved
            .raw_params
            .get("start_time")
            .and_then(|v| v.as_str())
            .unwrap();
        assert!(start.starts_with("2025-07-26T14:00:00"), "start: {start}");
    }

    #[tokio::test]
    async fn keyword_calendar_without_datetime_omits_start_time() {
        let resolver = KeywordResolver::new();
        let resolved = resolver.resolve("schedule something with the team", reference()).await;
        assert_eq!(resolved.action, ActionKind::CreateCalendarEvent);
        assert!(!resolved.raw_params.contains_key("start_time"));
    }

    #[tokio::test]
    async fn chat_params_carry_original_text() {
        let resolver = KeywordResolver::new();
        let resolved = resolver.resolve("slack the team: ship it", reference()).await;
        assert_eq!(resolved.action, ActionKind::PostMessage);
        assert_eq!(
            resolved.raw_params.get("text").and_then(|v| v.as_str()),
            Some("slack the team: ship it")
        );
    }
}
