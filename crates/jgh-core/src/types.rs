use serde::{Deserialize, Serialize};
use std::fmt;

use crate::duration;

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    Express,
    High,
    Medium,
    Low,
}

impl Priority {
    /// Map a `!token` body (without the bang) to a priority. Case-insensitive.
    pub fn from_token(token: &str) -> Option<Priority> {
        match token.to_ascii_lowercase().as_str() {
            "asap" => Some(Priority::Express),
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }

    /// Jira priority name.
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Express => "Express",
            Priority::High => "High",
            Priority::Medium => "Medium",
            Priority::Low => "Low",
        }
    }

    /// The GitHub label that mirrors this priority. Express shares the high label.
    pub fn github_label(self) -> &'static LabelSpec {
        match self {
            Priority::Express | Priority::High => &PRIORITY_LABELS[0],
            Priority::Medium => &PRIORITY_LABELS[1],
            Priority::Low => &PRIORITY_LABELS[2],
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// GitHub labels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LabelSpec {
    pub name: &'static str,
    pub color: &'static str,
    pub description: &'static str,
}

pub const PRIORITY_LABELS: [LabelSpec; 3] = [
    LabelSpec {
        name: "high-priority",
        color: "d73a4a",
        description: "High priority issue",
    },
    LabelSpec {
        name: "medium-priority",
        color: "fbca04",
        description: "Medium priority issue",
    },
    LabelSpec {
        name: "low-priority",
        color: "0e8a16",
        description: "Low priority issue",
    },
];

pub const AUTO_LABEL_COLOR: &str = "d73a4a";
pub const AUTO_LABEL_DESCRIPTION: &str = "Auto-created label";

// ---------------------------------------------------------------------------
// Issues
// ---------------------------------------------------------------------------

/// An open Jira issue as returned by the project search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JiraIssue {
    pub key: String,
    pub summary: String,
    pub status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    pub url: String,
}

/// An open GitHub issue as listed by `gh issue list`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GithubIssue {
    pub number: u64,
    pub title: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignee: Option<String>,
    #[serde(default)]
    pub labels: Vec<String>,
    pub url: String,
    /// Jira key found in the title, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedIssue {
    pub key: String,
    pub id: String,
    pub url: String,
}

/// Fields for a new Jira issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewIssue {
    pub project: String,
    pub summary: String,
    pub description: String,
    pub issue_type: String,
    pub assignee: Option<String>,
    pub priority: Option<Priority>,
}

/// Fields for a new GitHub issue.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewGithubIssue {
    pub title: String,
    pub body: String,
    pub assign_self: bool,
    pub labels: Vec<String>,
}

// ---------------------------------------------------------------------------
// Sync status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncState {
    Synced,
    JiraOnly,
    GithubOnly,
}

impl SyncState {
    pub fn as_str(self) -> &'static str {
        match self {
            SyncState::Synced => "synced",
            SyncState::JiraOnly => "jira-only",
            SyncState::GithubOnly => "github-only",
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logical issue across both trackers, keyed by its Jira key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncStatus {
    pub key: String,
    pub title: String,
    pub labels: Vec<String>,
    pub state: SyncState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira: Option<JiraIssue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub github: Option<GithubIssue>,
}

// ---------------------------------------------------------------------------
// Time tracking
// ---------------------------------------------------------------------------

/// Jira `timetracking` field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeTracking {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_estimate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining_estimate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_estimate_seconds: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_spent_seconds: Option<u64>,
}

impl TimeTracking {
    /// Original estimate in seconds, 0 when unset.
    pub fn estimate_seconds(&self) -> u64 {
        self.original_estimate_seconds.unwrap_or_else(|| {
            self.original_estimate
                .as_deref()
                .map(duration::parse_jira_time)
                .unwrap_or(0)
        })
    }
}

/// A Tempo worklog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Worklog {
    pub time_spent_seconds: u64,
    #[serde(default)]
    pub start_date: Option<String>,
    #[serde(default)]
    pub start_time: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorklog {
    pub author_account_id: String,
    pub issue_id: u64,
    pub time_spent_seconds: u64,
    pub start_date: String,
    pub description: String,
}

// ---------------------------------------------------------------------------
// Workflow steps
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tracker {
    Jira,
    Github,
}

impl fmt::Display for Tracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tracker::Jira => "Jira",
            Tracker::Github => "GitHub",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Applied,
    Warning,
}

/// One side effect a workflow attempted, in the order it happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Step {
    pub tracker: Tracker,
    pub status: StepStatus,
    pub message: String,
}

impl Step {
    pub fn applied(tracker: Tracker, message: impl Into<String>) -> Self {
        Self {
            tracker,
            status: StepStatus::Applied,
            message: message.into(),
        }
    }

    pub fn warning(tracker: Tracker, message: impl Into<String>) -> Self {
        Self {
            tracker,
            status: StepStatus::Warning,
            message: message.into(),
        }
    }

    pub fn is_warning(&self) -> bool {
        self.status == StepStatus::Warning
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn priority_tokens_are_case_insensitive() {
        assert_eq!(Priority::from_token("ASAP"), Some(Priority::Express));
        assert_eq!(Priority::from_token("High"), Some(Priority::High));
        assert_eq!(Priority::from_token("medium"), Some(Priority::Medium));
        assert_eq!(Priority::from_token("lOw"), Some(Priority::Low));
        assert_eq!(Priority::from_token("urgent"), None);
    }

    #[test]
    fn express_and_high_share_a_github_label() {
        assert_eq!(Priority::Express.github_label().name, "high-priority");
        assert_eq!(Priority::High.github_label().name, "high-priority");
        assert_eq!(Priority::Medium.github_label().color, "fbca04");
        assert_eq!(Priority::Low.github_label().name, "low-priority");
    }

    #[test]
    fn sync_state_serializes_kebab_case() {
        let json = serde_json::to_string(&SyncState::JiraOnly).unwrap();
        assert_eq!(json, "\"jira-only\"");
        assert_eq!(SyncState::GithubOnly.to_string(), "github-only");
    }

    #[test]
    fn estimate_prefers_seconds_field() {
        let tt = TimeTracking {
            original_estimate: Some("1h".into()),
            original_estimate_seconds: Some(5400),
            ..Default::default()
        };
        assert_eq!(tt.estimate_seconds(), 5400);
    }

    #[test]
    fn estimate_falls_back_to_text() {
        let tt = TimeTracking {
            original_estimate: Some("2h 15m".into()),
            ..Default::default()
        };
        assert_eq!(tt.estimate_seconds(), 8100);
        assert_eq!(TimeTracking::default().estimate_seconds(), 0);
    }

    #[test]
    fn worklog_reads_tempo_fields() {
        let json = r#"{"timeSpentSeconds": 3600, "startDate": "2026-03-02", "startTime": "09:00:00"}"#;
        let log: Worklog = serde_json::from_str(json).unwrap();
        assert_eq!(log.time_spent_seconds, 3600);
        assert_eq!(log.start_date.as_deref(), Some("2026-03-02"));
        assert!(log.description.is_none());
    }
}
