//! Cell value parsers
//!
//! All three parsers are total: malformed input degrades to `None` or zero and
//! never panics, so a bad cell can only ever cost its own value.

use chrono::{DateTime, NaiveDate};
use regex::Regex;
use std::sync::OnceLock;

/// Hours in one working day
pub const HOURS_PER_DAY: f64 = 8.0;

fn day_month_year() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9]{1,2})/([0-9]{1,2})/([0-9]{4})").expect("valid regex"))
}

fn year_month_day() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9]{4})-([0-9]{1,2})-([0-9]{1,2})").expect("valid regex"))
}

fn days_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9]+(?:[.,][0-9]+)?)\s*d").expect("valid regex"))
}

fn hours_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([0-9]+(?:[.,][0-9]+)?)\s*h").expect("valid regex"))
}

fn percent_patterns() -> &'static [Regex; 3] {
    static RE: OnceLock<[Regex; 3]> = OnceLock::new();
    RE.get_or_init(|| {
        [
            Regex::new(r"([0-9]+(?:[,.]?[0-9]+)?)\s*%").expect("valid regex"),
            Regex::new(r"^([0-9]+(?:[,.]?[0-9]+)?)$").expect("valid regex"),
            Regex::new(r"(?i)([0-9]+(?:[,.]?[0-9]+)?)\s*percent").expect("valid regex"),
        ]
    })
}

/// Formats tried after the two numeric layouts
const FALLBACK_FORMATS: &[&str] = &[
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%d-%m-%Y",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%b %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%a %b %d %Y",
];

/// Parse a sheet date.
///
/// Tries `dd/mm/yyyy`, then `yyyy-mm-dd` (both may be surrounded by other
/// text, e.g. a trailing time), then RFC 3339 / RFC 2822 and a fixed list of
/// textual layouts. Impossible dates such as 31/02 are rejected.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let s = input.trim();
    if s.is_empty() {
        return None;
    }

    if let Some(caps) = day_month_year().captures(s) {
        if let Some(date) = ymd(&caps[3], &caps[2], &caps[1]) {
            return Some(date);
        }
    }

    if let Some(caps) = year_month_day().captures(s) {
        if let Some(date) = ymd(&caps[1], &caps[2], &caps[3]) {
            return Some(date);
        }
    }

    fallback_date(s)
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

fn fallback_date(s: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(dt.date_naive());
    }
    FALLBACK_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

/// Parse a duration into working days.
///
/// `"5 dias"`, `"5 days"` and `"5d"` are days; `"16 horas"`, `"16 hours"` and
/// `"16h"` are hours at eight per day. Comma and dot decimals both work.
/// Anything else is zero.
pub fn parse_duration(input: &str) -> f64 {
    let s = input.to_lowercase();
    if s.trim().is_empty() {
        return 0.0;
    }

    if let Some(value) = first_number(days_pattern(), &s) {
        return value;
    }
    if let Some(value) = first_number(hours_pattern(), &s) {
        return value / HOURS_PER_DAY;
    }
    0.0
}

/// Parse a completion percentage, clamped to `[0, 100]`.
///
/// Accepts `"40%"`, `"29,5 %"`, `"40 percent"` or a bare `"40"`. Empty or
/// unrecognised input is zero.
pub fn parse_percentage(input: &str) -> f64 {
    let s = input.trim();
    if s.is_empty() {
        return 0.0;
    }

    percent_patterns()
        .iter()
        .find_map(|re| first_number(re, s))
        .map(|value| value.clamp(0.0, 100.0))
        .unwrap_or(0.0)
}

fn first_number(re: &Regex, s: &str) -> Option<f64> {
    let caps = re.captures(s)?;
    let value: f64 = caps[1].replace(',', ".").parse().ok()?;
    value.is_finite().then_some(value)
}
