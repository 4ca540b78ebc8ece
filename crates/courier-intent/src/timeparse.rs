//! Natural-language date/time inference.
//!
//! Resolves both machine formats (RFC 3339, ISO 8601 variants) and the
//! relative phrases people actually type ("tomorrow at 3pm", "next monday",
//! "in 2 hours") against an explicit reference instant.  The reference is
//! always a parameter: production passes the current time, tests pass a
//! fixed one, and results are fully deterministic either way.
//!
//! Parsing is best-effort by contract — anything unresolvable returns `None`,
//! never an error.

use std::sync::LazyLock;

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Utc, Weekday};
use regex::Regex;

// ---------------------------------------------------------------------------
// Patterns
// ---------------------------------------------------------------------------

// Matched against lowercased text, so the `T` separator appears as `t`.
static RE_ISO_EMBEDDED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{4}-\d{2}-\d{2})(?:[t ](\d{2}):(\d{2})(?::(\d{2}))?)?\b").unwrap()
});

static RE_IN_OFFSET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\bin\s+(\d{1,3})\s+(minute|min|hour|hr|day|week)s?\b").unwrap()
});

static RE_CLOCK_TIME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,2}):(\d{2})(?::(\d{2}))?\s*(am|pm)?\b").unwrap()
});

static RE_HOUR_MERIDIEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})\s*(am|pm)\b").unwrap());

/// Weekday names in the order they are scanned for.
const WEEKDAYS: &[(&str, Weekday)] = &[
    ("monday", Weekday::Mon),
    ("tuesday", Weekday::Tue),
    ("wednesday", Weekday::Wed),
    ("thursday", Weekday::Thu),
    ("friday", Weekday::Fri),
    ("saturday", Weekday::Sat),
    ("sunday", Weekday::Sun),
];

/// Exact datetime layouts tried against the whole (trimmed) input.
const DATETIME_LAYOUTS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a date/time expression relative to `reference_now`.
///
/// Tries, in order: the whole input as an absolute timestamp, an absolute
/// timestamp embedded anywhere in the text, an `in N <unit>` offset, and
/// finally relative day words combined with a clock time.  A clock time with
/// no date resolves on the reference day; a day with no clock time keeps the
/// reference's time of day.
pub fn parse_datetime(input: &str, reference_now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(dt) = parse_absolute(trimmed) {
        return Some(dt);
    }

    let lowered = trimmed.to_lowercase();

    if let Some(dt) = parse_embedded_iso(&lowered) {
        return Some(dt);
    }

    if let Some(dt) = parse_offset(&lowered, reference_now) {
        return Some(dt);
    }

    let date = relative_date(&lowered, reference_now);
    let time = clock_time(&lowered);

    match (date, time) {
        (Some(date), Some(time)) => Some(at(date, time)),
        (Some(date), None) => Some(at(date, reference_now.time())),
        (None, Some(time)) => Some(at(reference_now.date_naive(), time)),
        (None, None) => None,
    }
}

// ---------------------------------------------------------------------------
// Absolute formats
// ---------------------------------------------------------------------------

/// Try the whole input as an RFC 3339 / ISO 8601 timestamp or bare date.
fn parse_absolute(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }

    for layout in DATETIME_LAYOUTS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(input, layout) {
            return Some(naive.and_utc());
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(input, "%Y-%m-%d") {
        return Some(at(date, NaiveTime::MIN));
    }

    None
}

/// Find an ISO-shaped timestamp embedded anywhere in longer text.
fn parse_embedded_iso(lowered: &str) -> Option<DateTime<Utc>> {
    let caps = RE_ISO_EMBEDDED.captures(lowered)?;
    let date = NaiveDate::parse_from_str(caps.get(1)?.as_str(), "%Y-%m-%d").ok()?;

    let time = match (caps.get(2), caps.get(3)) {
        (Some(h), Some(m)) => {
            let hour: u32 = h.as_str().parse().ok()?;
            let minute: u32 = m.as_str().parse().ok()?;
            let second: u32 = caps
                .get(4)
                .and_then(|s| s.as_str().parse().ok())
                .unwrap_or(0);
            NaiveTime::from_hms_opt(hour, minute, second)?
        }
        _ => NaiveTime::MIN,
    };

    Some(at(date, time))
}

// ---------------------------------------------------------------------------
// Relative components
// ---------------------------------------------------------------------------

/// Resolve an `in N <unit>` offset from the reference instant.
fn parse_offset(lowered: &str, reference_now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let caps = RE_IN_OFFSET.captures(lowered)?;
    let n: i64 = caps.get(1)?.as_str().parse().ok()?;

    let delta = match caps.get(2)?.as_str() {
        "minute" | "min" => Duration::minutes(n),
        "hour" | "hr" => Duration::hours(n),
        "day" => Duration::days(n),
        "week" => Duration::weeks(n),
        _ => return None,
    };

    Some(reference_now + delta)
}

/// Resolve relative day words ("tomorrow", "next friday") to a calendar date.
fn relative_date(lowered: &str, reference_now: DateTime<Utc>) -> Option<NaiveDate> {
    let today = reference_now.date_naive();

    // Longest phrase first so "day after tomorrow" is not eaten by "tomorrow".
    if lowered.contains("day after tomorrow") {
        return Some(today + Duration::days(2));
    }
    if lowered.contains("tomorrow") {
        return Some(today + Duration::days(1));
    }
    if lowered.contains("today") || lowered.contains("tonight") {
        return Some(today);
    }
    if lowered.contains("next week") {
        return Some(today + Duration::weeks(1));
    }

    // Earliest weekday mention wins.  "next monday" and a bare "monday" both
    // resolve to the next occurrence (1..=7 days ahead, never today).
    let mut earliest: Option<(usize, Weekday)> = None;
    for (name, weekday) in WEEKDAYS {
        if let Some(pos) = lowered.find(name)
            && earliest.is_none_or(|(best, _)| pos < best)
        {
            earliest = Some((pos, *weekday));
        }
    }

    earliest.map(|(_, weekday)| {
        let current = today.weekday().num_days_from_monday() as i64;
        let target = weekday.num_days_from_monday() as i64;
        let mut ahead = target - current;
        if ahead <= 0 {
            ahead += 7;
        }
        today + Duration::days(ahead)
    })
}

/// Resolve a clock time mentioned anywhere in the text.
fn clock_time(lowered: &str) -> Option<NaiveTime> {
    if lowered.contains("midnight") {
        return NaiveTime::from_hms_opt(0, 0, 0);
    }
    if lowered.contains("noon") {
        return NaiveTime::from_hms_opt(12, 0, 0);
    }

    if let Some(caps) = RE_CLOCK_TIME.captures(lowered) {
        let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let minute: u32 = caps.get(2)?.as_str().parse().ok()?;
        let second: u32 = caps
            .get(3)
            .and_then(|s| s.as_str().parse().ok())
            .unwrap_or(0);
        let hour = match caps.get(4).map(|m| m.as_str()) {
            Some(meridiem) => meridiem_hour(hour, meridiem)?,
            None if hour <= 23 => hour,
            None => return None,
        };
        return NaiveTime::from_hms_opt(hour, minute, second);
    }

    if let Some(caps) = RE_HOUR_MERIDIEM.captures(lowered) {
        let hour: u32 = caps.get(1)?.as_str().parse().ok()?;
        let hour = meridiem_hour(hour, caps.get(2)?.as_str())?;
        return NaiveTime::from_hms_opt(hour, 0, 0);
    }

    None
}

/// Convert a 12-hour clock hour to 24-hour form.
fn meridiem_hour(hour: u32, meridiem: &str) -> Option<u32> {
    if !(1..=12).contains(&hour) {
        return None;
    }
    Some(match (hour, meridiem) {
        (12, "am") => 0,
        (12, "pm") => 12,
        (h, "am") => h,
        (h, _) => h + 12,
    })
}

/// Combine a date and time into a UTC instant.
fn at(date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    NaiveDateTime::new(date, time).and_utc()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
