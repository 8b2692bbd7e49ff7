use colored::Colorize;
use jgh_core::duration::{format_seconds, DurationStyle};
use jgh_core::report::{ListEntry, TimeSummary, Trend};
use jgh_core::sync::Identity;
use jgh_core::types::{Step, StepStatus, SyncState};
use serde::Serialize;

const TITLE_WIDTH: usize = 50;
const MAX_WORKLOG_LINES: usize = 5;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

pub fn progress(message: &str) {
    println!("{}", format!("⌛ {message}").yellow());
}

pub fn warning(message: &str) {
    println!("{}", format!("⚠️  {message}").yellow());
}

pub fn print_steps(steps: &[Step]) {
    for step in steps {
        let line = format!("[{}] {}", step.tracker, step.message);
        match step.status {
            StepStatus::Applied => println!("{}", format!("🆗 {line}").cyan()),
            StepStatus::Warning => warning(&line),
        }
    }
}

/// Cut to 50 characters, the last three replaced by `...`.
pub fn truncate(title: &str) -> String {
    if title.chars().count() <= TITLE_WIDTH {
        return title.to_string();
    }
    let mut short: String = title.chars().take(TITLE_WIDTH - 3).collect();
    short.push_str("...");
    short
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

pub fn state_icon(state: SyncState) -> &'static str {
    match state {
        SyncState::Synced => "🔄",
        SyncState::GithubOnly => "💻",
        SyncState::JiraOnly => "🗂️",
    }
}

/// `👤@me`, the Jira assignee's first name, or the GitHub login.
pub fn assignee_tag(entry: &ListEntry, me: &Identity) -> Option<String> {
    let jira = entry.status.jira.as_ref().and_then(|j| j.assignee.as_deref());
    let github = entry.status.github.as_ref().and_then(|g| g.assignee.as_deref());
    if me.is_jira_me(jira) || me.is_github_me(github) {
        return Some("👤@me".to_string());
    }
    match (jira, github) {
        (Some(name), _) => Some(format!("👤@{}", name.split(' ').next().unwrap_or(name))),
        (None, Some(login)) => Some(format!("👤@{login}")),
        (None, None) => None,
    }
}

/// `1h30min/2h 📉 -25%`, or `None` when nothing is estimated or logged.
pub fn time_badge(summary: &TimeSummary) -> Option<String> {
    if summary.is_empty() {
        return None;
    }
    let logged = format_seconds(summary.logged_seconds, DurationStyle::Compact);
    let estimate = format_seconds(summary.estimate_seconds, DurationStyle::Compact);
    let trend = match summary.trend() {
        Trend::NotStarted => "⏱️".to_string(),
        Trend::NoEstimate => "🆗".to_string(),
        Trend::OnTrack => "🆗 0%".to_string(),
        Trend::Over(pct) => format!("📈 +{pct}%"),
        Trend::Under(pct) => format!("📉 -{pct}%"),
    };
    Some(format!("{logged}/{estimate} {trend}"))
}

pub fn list_line(entry: &ListEntry, me: &Identity) -> String {
    let status = &entry.status;
    let head = format!("{} {}", state_icon(status.state), status.key);
    let head = match status.state {
        SyncState::Synced => head.green(),
        SyncState::JiraOnly => head.bright_yellow(),
        SyncState::GithubOnly => head.white(),
    };

    let mut line = format!("{head} {}", truncate(&status.title).dimmed());
    if !status.labels.is_empty() {
        line.push_str(&format!(" +{}", status.labels.join(" +")));
    }
    if let Some(tag) = assignee_tag(entry, me) {
        line.push_str(&format!(" {}", tag.cyan()));
    }
    if let Some(badge) = entry.time.summary().and_then(time_badge) {
        line.push_str(&format!(" · {}", badge.yellow()));
    }
    line
}

// ---------------------------------------------------------------------------
// details
// ---------------------------------------------------------------------------

/// The time-tracking block of `jgh details`, one string per line.
pub fn time_lines(summary: &TimeSummary) -> Vec<String> {
    let spaced = |secs: u64| format_seconds(secs, DurationStyle::Spaced);
    let mut lines = Vec::new();

    lines.push(match summary.estimate_seconds {
        0 => "Original Estimate: Not set".to_string(),
        secs => format!("Original Estimate: {}", spaced(secs)),
    });
    lines.push(match summary.logged_seconds {
        0 => "Time Logged: None".to_string(),
        secs => format!("Time Logged: {}", spaced(secs)),
    });

    if summary.estimate_seconds > 0 && summary.logged_seconds > 0 {
        lines.push(match summary.trend() {
            Trend::Over(pct) => format!("Status: 📈 Over estimate by {pct}%"),
            Trend::Under(pct) => format!("Status: 📉 Under estimate by {pct}%"),
            _ => "Status: 🆗 On track".to_string(),
        });
        let remaining = summary.remaining_seconds();
        lines.push(if remaining >= 0 {
            format!("Remaining: {}", spaced(remaining.unsigned_abs()))
        } else {
            format!("Over by: {}", spaced(remaining.unsigned_abs()))
        });
    }

    if !summary.worklogs.is_empty() {
        lines.push(format!("Worklogs ({}):", summary.worklogs.len()));
        for (i, log) in summary.worklogs.iter().take(MAX_WORKLOG_LINES).enumerate() {
            let mut entry = format!("  {}. {}", i + 1, spaced(log.time_spent_seconds));
            if let Some(date) = &log.start_date {
                entry.push_str(&format!(" on {date}"));
            }
            lines.push(entry);
        }
        if summary.worklogs.len() > MAX_WORKLOG_LINES {
            lines.push(format!(
                "  ... and {} more entries",
                summary.worklogs.len() - MAX_WORKLOG_LINES
            ));
        }
    }
    lines
}
