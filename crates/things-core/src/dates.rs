//! Conversion between calendar dates and the way Things renders and builds them.
//!
//! Writing never passes a formatted date literal to AppleScript: `date "..."`
//! is parsed with the host's locale. Instead a date value is derived from
//! `current date` and its components are overwritten one by one.
//!
//! Reading goes the other way. `(due date of t) as string` yields text such
//! as `Wednesday 6 August 2025 at 20:45:46`, which is interpreted in the
//! local time zone and reported as UTC.

use std::sync::OnceLock;

use chrono::{
    DateTime, Datelike, Local, LocalResult, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone,
    Utc,
};
use regex::Regex;

/// AppleScript's rendering of an unset value.
pub const MISSING_VALUE: &str = "missing value";

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const GENERIC_FORMATS: [&str; 4] = [
    "%d %B %Y %H:%M:%S",
    "%B %d %Y %H:%M:%S",
    "%d %B %Y %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

/// Years below this mean a format matched the wrong tokens.
const MIN_YEAR: i32 = 1000;

const DISPLAY_FORMAT: &str = "%A %-d %B %Y at %H:%M:%S";

fn fallback_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(\d{1,2})\s+([A-Za-z]+)\s+(\d{4})\s+at\s+(\d{1,2}):(\d{2}):(\d{2})")
            .expect("valid host date regex")
    })
}

/// Statements that leave `var` holding `date` at midnight.
///
/// The day is parked on 1 before the month changes so a current date of the
/// 31st cannot roll a shorter target month over.
pub fn date_statements(var: &str, date: NaiveDate) -> Vec<String> {
    vec![
        format!("set {} to current date", var),
        format!(
            "tell {} to set {{its day, its year, its month, its day}} to {{1, {}, {}, {}}}",
            var,
            date.year(),
            date.month(),
            date.day()
        ),
        format!("set time of {} to 0", var),
    ]
}

/// Renders a timestamp the way Things displays it.
pub fn format_host_date(value: &NaiveDateTime) -> String {
    value.format(DISPLAY_FORMAT).to_string()
}

/// Parses host date text into wall-clock time. `None` for sentinels and
/// anything neither the generic nor the fallback parser understands.
pub fn parse_host_naive(text: &str) -> Option<NaiveDateTime> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed == MISSING_VALUE {
        return None;
    }
    parse_generic(trimmed).or_else(|| parse_fallback(trimmed))
}

/// Parses host date text as local time.
pub fn parse_host_date(text: &str) -> Option<DateTime<Utc>> {
    parse_host_date_in(text, &Local)
}

/// Parses host date text as wall-clock time in `tz`.
pub fn parse_host_date_in<Tz: TimeZone>(text: &str, tz: &Tz) -> Option<DateTime<Utc>> {
    let naive = parse_host_naive(text)?;
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(value) => Some(value.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
        LocalResult::None => None,
    }
}

pub fn to_iso(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_generic(text: &str) -> Option<NaiveDateTime> {
    let rest = match text.split_once(char::is_whitespace) {
        Some((first, rest)) if is_weekday_token(first) => rest,
        _ => text,
    };
    let normalized = rest.replace(" at ", " ").replace(',', "");
    let normalized = normalized.trim();
    GENERIC_FORMATS
        .iter()
        .filter_map(|format| NaiveDateTime::parse_from_str(normalized, format).ok())
        .find(|value| value.year() >= MIN_YEAR)
}

/// `Wednesday` or `Wednesday,`.
fn is_weekday_token(token: &str) -> bool {
    let word = token.strip_suffix(',').unwrap_or(token);
    !word.is_empty() && word.chars().all(char::is_alphabetic)
}

fn parse_fallback(text: &str) -> Option<NaiveDateTime> {
    let caps = fallback_regex().captures(text)?;
    let number = |idx: usize| caps.get(idx).and_then(|m| m.as_str().parse::<u32>().ok());
    let month_name = caps.get(2)?.as_str();
    let month = MONTHS.iter().position(|name| *name == month_name)? as u32 + 1;
    let year = caps.get(3)?.as_str().parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, month, number(1)?)?
        .and_hms_opt(number(4)?, number(5)?, number(6)?)
}
