//! Entity extraction from raw request text.
//!
//! Pulls coarse signals (recipients, date/time, quoted subject, priority)
//! straight out of the text with pattern matching — no model call.  The
//! keyword resolver builds its argument maps from this, and it doubles as
//! the fallback path when model-based resolution is unavailable.
//!
//! Pure functions of the text and the reference instant; no side effects.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::timeparse;

/// Keywords that flag a request as high priority.
const PRIORITY_KEYWORDS: &[&str] = &["urgent", "asap", "immediately", "priority"];

/// Fallback subject length when the text carries no quoted phrase.
const SUBJECT_FALLBACK_CHARS: usize = 50;

static RE_EMAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b").unwrap()
});

static RE_QUOTED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""([^"]+)"|'([^']+)'"#).unwrap());

/// Coarse signals extracted from a request text.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Best-effort resolved date/time mentioned in the text, if any.
    pub datetime: Option<DateTime<Utc>>,

    /// Email-shaped substrings in first-appearance order, duplicates kept.
    pub recipients: Vec<String>,

    /// First quoted phrase, or the leading slice of the text.
    pub subject: String,

    /// Whether the text contains a priority keyword.
    pub priority: bool,

    /// The original text, carried as the message body.
    pub body: String,
}

/// Extract all coarse signals from `text`.
pub fn extract(text: &str, reference_now: DateTime<Utc>) -> Extraction {
    Extraction {
        datetime: timeparse::parse_datetime(text, reference_now),
        recipients: extract_recipients(text),
        subject: extract_subject(text),
        priority: parse_priority(text),
        body: text.to_string(),
    }
}

/// All email-shaped substrings, in order of first appearance.
pub fn extract_recipients(text: &str) -> Vec<String> {
    RE_EMAIL
        .find_iter(text)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// The first single- or double-quoted substring; without one, the first
/// [`SUBJECT_FALLBACK_CHARS`] characters of the text.
pub fn extract_subject(text: &str) -> String {
    if let Some(caps) = RE_QUOTED.captures(text)
        && let Some(inner) = caps.get(1).or_else(|| caps.get(2))
    {
        return inner.as_str().to_string();
    }
    text.chars().take(SUBJECT_FALLBACK_CHARS).collect()
}

/// True iff the lowercased text contains any priority keyword.
pub fn parse_priority(text: &str) -> bool {
    let lowered = text.to_lowercase();
    PRIORITY_KEYWORDS.iter().any(|kw| lowered.contains(kw))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
