//! Work durations: `2h`, `30min`, `1.5h`, `1h 30m`.
//!
//! Everything is seconds internally. Three textual conventions are rendered
//! from the same arithmetic: Jira's `1h 30m`, the list view's `1h30min`, and
//! the details view's `1h 30min`.

use regex::Regex;
use std::sync::OnceLock;

use crate::error::{JghError, Result};

const SECONDS_PER_HOUR: u64 = 3600;
const SECONDS_PER_MINUTE: u64 = 60;

static HOURS_RE: OnceLock<Regex> = OnceLock::new();
static MINUTES_RE: OnceLock<Regex> = OnceLock::new();
static JIRA_HOURS_RE: OnceLock<Regex> = OnceLock::new();
static JIRA_MINUTES_RE: OnceLock<Regex> = OnceLock::new();

fn hours_re() -> &'static Regex {
    HOURS_RE.get_or_init(|| Regex::new(r"([0-9]+(?:\.[0-9]+)?)h").unwrap())
}

fn minutes_re() -> &'static Regex {
    MINUTES_RE.get_or_init(|| Regex::new(r"([0-9]+)m(?:in)?").unwrap())
}

fn jira_hours_re() -> &'static Regex {
    JIRA_HOURS_RE.get_or_init(|| Regex::new(r"([0-9]+)h").unwrap())
}

fn jira_minutes_re() -> &'static Regex {
    JIRA_MINUTES_RE.get_or_init(|| Regex::new(r"([0-9]+)m").unwrap())
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Parse a user-supplied duration into seconds.
///
/// Accepts an optional hour part (`2h`, `1.5h`) and an optional minute part
/// (`30min`, `30m`). A result of zero is rejected.
pub fn parse_duration(text: &str) -> Result<u64> {
    let mut seconds = 0u64;

    if let Some(caps) = hours_re().captures(text) {
        let hours: f64 = caps[1].parse().map_err(|_| invalid(text))?;
        let product = (hours * SECONDS_PER_HOUR as f64).round();
        // `as u64` saturates, so anything past u64::MAX must be caught first.
        if !product.is_finite() || product >= u64::MAX as f64 {
            return Err(invalid(text));
        }
        seconds = product as u64;
    }

    if let Some(caps) = minutes_re().captures(text) {
        let minutes: u64 = caps[1].parse().map_err(|_| invalid(text))?;
        seconds = minutes
            .checked_mul(SECONDS_PER_MINUTE)
            .and_then(|m| seconds.checked_add(m))
            .ok_or_else(|| invalid(text))?;
    }

    if seconds == 0 {
        return Err(invalid(text));
    }
    Ok(seconds)
}

fn invalid(text: &str) -> JghError {
    JghError::Validation(format!(
        "invalid duration format '{text}'. Use formats like: 30min, 2h, 1.5h"
    ))
}

/// Lenient parse of a Jira time-tracking string (`3h 20m`). Unknown or empty
/// text yields 0.
pub fn parse_jira_time(text: &str) -> u64 {
    let hours = jira_hours_re()
        .captures(text)
        .and_then(|c| c[1].parse::<u64>().ok())
        .unwrap_or(0);
    let minutes = jira_minutes_re()
        .captures(text)
        .and_then(|c| c[1].parse::<u64>().ok())
        .unwrap_or(0);
    hours
        .saturating_mul(SECONDS_PER_HOUR)
        .saturating_add(minutes.saturating_mul(SECONDS_PER_MINUTE))
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DurationStyle {
    /// `1h 30m`, what Jira's timetracking fields accept.
    Jira,
    /// `1h30min`
    Compact,
    /// `1h 30min`
    Spaced,
}

impl DurationStyle {
    fn minute_suffix(self) -> &'static str {
        match self {
            DurationStyle::Jira => "m",
            DurationStyle::Compact | DurationStyle::Spaced => "min",
        }
    }

    fn separator(self) -> &'static str {
        match self {
            DurationStyle::Compact => "",
            DurationStyle::Jira | DurationStyle::Spaced => " ",
        }
    }
}

/// Render seconds as hours and/or minutes. Leftover seconds are dropped.
pub fn format_seconds(seconds: u64, style: DurationStyle) -> String {
    let hours = seconds / SECONDS_PER_HOUR;
    let minutes = (seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE;
    let suffix = style.minute_suffix();

    match (hours, minutes) {
        (0, m) => format!("{m}{suffix}"),
        (h, 0) => format!("{h}h"),
        (h, m) => format!("{h}h{}{m}{suffix}", style.separator()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hours_minutes_and_fractions() {
        assert_eq!(parse_duration("2h").unwrap(), 7200);
        assert_eq!(parse_duration("30min").unwrap(), 1800);
        assert_eq!(parse_duration("30m").unwrap(), 1800);
        assert_eq!(parse_duration("1.5h").unwrap(), 5400);
        assert_eq!(parse_duration("1h 30min").unwrap(), 5400);
        assert_eq!(parse_duration("1h30m").unwrap(), 5400);
        assert_eq!(parse_duration("0.25h").unwrap(), 900);
    }

    #[test]
    fn rejects_empty_and_zero() {
        for text in ["", "soon", "0h", "0min", "45s"] {
            let err = parse_duration(text).unwrap_err();
            assert!(matches!(err, JghError::Validation(_)), "input: {text}");
        }
    }

    #[test]
    fn rejects_amounts_that_overflow() {
        for text in [
            "400000000000000000min",
            "18446744073709551615min",
            "99999999999999999999h",
            "5124095576030431h 400000000000000000min",
        ] {
            let err = parse_duration(text).unwrap_err();
            assert!(matches!(err, JghError::Validation(_)), "input: {text}");
        }
    }

    #[test]
    fn only_ascii_digits_count() {
        assert!(parse_duration("\u{0662}h").is_err());
        assert_eq!(parse_jira_time("\u{0663}h"), 0);
    }

    #[test]
    fn jira_time_saturates_instead_of_wrapping() {
        assert_eq!(parse_jira_time("18446744073709551615h"), u64::MAX);
    }

    #[test]
    fn jira_time_is_lenient() {
        assert_eq!(parse_jira_time("3h 20m"), 12000);
        assert_eq!(parse_jira_time("45m"), 2700);
        assert_eq!(parse_jira_time(""), 0);
        assert_eq!(parse_jira_time("2d"), 0);
    }

    #[test]
    fn formats_each_style() {
        assert_eq!(format_seconds(5400, DurationStyle::Jira), "1h 30m");
        assert_eq!(format_seconds(5400, DurationStyle::Compact), "1h30min");
        assert_eq!(format_seconds(5400, DurationStyle::Spaced), "1h 30min");
        assert_eq!(format_seconds(7200, DurationStyle::Compact), "2h");
        assert_eq!(format_seconds(1800, DurationStyle::Jira), "30m");
        assert_eq!(format_seconds(0, DurationStyle::Compact), "0min");
        assert_eq!(format_seconds(59, DurationStyle::Jira), "0m");
    }

    #[test]
    fn formatted_text_parses_back() {
        for secs in [1800, 3600, 5400, 9000, 60] {
            for style in [DurationStyle::Jira, DurationStyle::Compact, DurationStyle::Spaced] {
                let text = format_seconds(secs, style);
                assert_eq!(parse_duration(&text).unwrap(), secs, "{text}");
            }
        }
    }
}
