//! Tolerant date parsing for forum timestamps.
//!
//! Forum software renders dates in many shapes: ISO attributes, Unix epochs,
//! US-style `01-15-2024, 10:15 AM`, long month names, and relative forms like
//! `Today, 09:12 PM` or `3 hours ago`. Anything unrecognized yields `None`.
//! Naive times are taken as UTC since the board's timezone is unknown.

use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, TimeZone, Utc};
use regex::Regex;

const DATETIME_FORMATS: &[&str] = &[
    "%m-%d-%Y, %I:%M %p",
    "%m-%d-%Y %I:%M %p",
    "%m/%d/%Y, %I:%M %p",
    "%m/%d/%Y %I:%M %p",
    "%m-%d-%Y, %H:%M",
    "%m-%d-%Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%b %d, %Y at %I:%M %p",
    "%B %d, %Y at %I:%M %p",
    "%b %d, %Y, %I:%M %p",
    "%b %d, %Y %I:%M %p",
    "%B %d, %Y %I:%M %p",
    "%d %b %Y %H:%M",
    "%d %B %Y %H:%M",
    "%d %b %Y, %H:%M",
];

const DATE_FORMATS: &[&str] = &[
    "%m-%d-%Y",
    "%m/%d/%Y",
    "%Y-%m-%d",
    "%b %d, %Y",
    "%B %d, %Y",
    "%d %b %Y",
    "%d %B %Y",
];

const TIME_FORMATS: &[&str] = &["%I:%M %p", "%I:%M%p", "%H:%M", "%H:%M:%S"];

static RELATIVE_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(today|yesterday)(?:\s*,?\s*(?:at\s+)?(.+))?$").unwrap()
});

static AGO: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(a|an|\d+)\s+(second|minute|hour|day|week)s?\s+ago$").unwrap()
});

/// Date-shaped fragments searched for inside longer strings
/// (e.g. `Last post by bob 01-15-2024, 10:15 AM`).
static EMBEDDED_DATES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        // US numeric with optional time: 01-15-2024, 10:15 AM
        Regex::new(r"(?i)\d{1,2}[-/]\d{1,2}[-/]\d{4}(?:,?\s+\d{1,2}:\d{2}(?:\s*[ap]m)?)?").unwrap(),
        // ISO: 2024-01-15 10:15
        Regex::new(r"\d{4}-\d{2}-\d{2}(?:[ T]\d{2}:\d{2}(?::\d{2})?)?").unwrap(),
        // Long month: Jan 15, 2024 at 10:15 AM
        Regex::new(r"(?i)[a-z]{3,9}\.? \d{1,2}, \d{4}(?:,? (?:at )?\d{1,2}:\d{2}\s*[ap]m)?").unwrap(),
        // Relative day: Today, 10:15 AM
        Regex::new(r"(?i)(?:today|yesterday)(?:\s*,?\s*(?:at\s+)?\d{1,2}:\d{2}(?:\s*[ap]m)?)?").unwrap(),
        // Relative offset: 3 hours ago
        Regex::new(r"(?i)(?:a|an|\d+)\s+(?:second|minute|hour|day|week)s?\s+ago").unwrap(),
    ]
});

/// Parse a forum date string, resolving relative forms against `now`.
pub fn parse_forum_date(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let text = clean(raw);
    if text.is_empty() {
        return None;
    }

    if let Some(dt) = parse_exact(&text, now) {
        return Some(dt);
    }

    EMBEDDED_DATES
        .iter()
        .filter_map(|re| re.find(&text))
        .find_map(|m| parse_exact(m.as_str().trim(), now))
}

fn clean(raw: &str) -> String {
    raw.replace('\u{a0}', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .trim_matches(|c: char| c == ',' || c == '|' || c.is_whitespace())
        .to_string()
}

fn parse_exact(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    // Unix epoch (XenForo data-time, some vBulletin skins).
    if text.len() >= 9 && text.len() <= 11 && text.chars().all(|c| c.is_ascii_digit()) {
        let secs: i64 = text.parse().ok()?;
        return Utc.timestamp_opt(secs, 0).single();
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.with_timezone(&Utc));
    }
    // ISO with compact offset: 2024-01-15T10:15:00+0000
    if let Ok(dt) = DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%z") {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(text) {
        return Some(dt.with_timezone(&Utc));
    }

    if let Some(dt) = parse_relative(text, now) {
        return Some(dt);
    }

    for format in DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return date.and_hms_opt(0, 0, 0).map(|n| Utc.from_utc_datetime(&n));
        }
    }

    None
}

fn parse_relative(text: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    if let Some(caps) = RELATIVE_DAY.captures(text) {
        let day = caps.get(1)?.as_str().to_lowercase();
        let date = if day == "yesterday" {
            now.date_naive().pred_opt()?
        } else {
            now.date_naive()
        };
        let time = match caps.get(2) {
            Some(t) => parse_time(t.as_str())?,
            None => NaiveTime::MIN,
        };
        return Some(Utc.from_utc_datetime(&date.and_time(time)));
    }

    if let Some(caps) = AGO.captures(text) {
        let amount = caps.get(1)?.as_str();
        let amount: i64 = match amount.to_lowercase().as_str() {
            "a" | "an" => 1,
            n => n.parse().ok()?,
        };
        let delta = match caps.get(2)?.as_str().to_lowercase().as_str() {
            "second" => TimeDelta::try_seconds(amount)?,
            "minute" => TimeDelta::try_minutes(amount)?,
            "hour" => TimeDelta::try_hours(amount)?,
            "day" => TimeDelta::try_days(amount)?,
            "week" => TimeDelta::try_weeks(amount)?,
            _ => return None,
        };
        return now.checked_sub_signed(delta);
    }

    None
}

fn parse_time(text: &str) -> Option<NaiveTime> {
    let text = text.trim().to_uppercase();
    TIME_FORMATS
        .iter()
        .find_map(|f| NaiveTime::parse_from_str(&text, f).ok())
}
