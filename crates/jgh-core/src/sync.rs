//! Pairing Jira issues with GitHub issues.
//!
//! A GitHub issue is linked to a Jira issue when its title contains the Jira
//! key (`Fix login PROJ-42`). Nothing else is stored; every `list`/`update`
//! rebuilds the pairing from a fresh fetch of both trackers.

use regex::Regex;
use serde::Serialize;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::types::{GithubIssue, JiraIssue, SyncState, SyncStatus};

static KEY_RE: OnceLock<Regex> = OnceLock::new();

fn key_re() -> &'static Regex {
    KEY_RE.get_or_init(|| Regex::new(r"[A-Z]+-[0-9]+").unwrap())
}

/// First Jira-key-shaped substring in a title.
pub fn extract_issue_key(title: &str) -> Option<String> {
    key_re().find(title).map(|m| m.as_str().to_string())
}

/// Case-insensitive ordering with a byte-order tiebreak.
pub fn key_order(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

// ---------------------------------------------------------------------------
// Reconcile
// ---------------------------------------------------------------------------

/// Merge both issue lists into one entry per Jira key, sorted by key.
///
/// GitHub issues without a key in their title have nothing to pair on and do
/// not appear in the result.
pub fn reconcile(jira: &[JiraIssue], github: &[GithubIssue]) -> Vec<SyncStatus> {
    let mut by_key: HashMap<String, SyncStatus> = HashMap::with_capacity(jira.len());

    for issue in jira {
        by_key.insert(
            issue.key.clone(),
            SyncStatus {
                key: issue.key.clone(),
                title: issue.summary.clone(),
                labels: issue.labels.clone(),
                state: SyncState::JiraOnly,
                jira: Some(issue.clone()),
                github: None,
            },
        );
    }

    for issue in github {
        let Some(key) = issue.jira_key.as_ref() else {
            continue;
        };
        match by_key.get_mut(key) {
            Some(existing) => {
                existing.state = SyncState::Synced;
                existing.github = Some(issue.clone());
            }
            None => {
                by_key.insert(
                    key.clone(),
                    SyncStatus {
                        key: key.clone(),
                        title: issue.title.clone(),
                        labels: issue.labels.clone(),
                        state: SyncState::GithubOnly,
                        jira: None,
                        github: Some(issue.clone()),
                    },
                );
            }
        }
    }

    let mut statuses: Vec<SyncStatus> = by_key.into_values().collect();
    statuses.sort_by(|a, b| key_order(&a.key, &b.key));
    statuses
}

/// The synced entry for `key`, if both trackers carry it.
pub fn find_synced<'a>(statuses: &'a [SyncStatus], key: &str) -> Option<&'a SyncStatus> {
    statuses
        .iter()
        .find(|s| s.key == key && s.state == SyncState::Synced)
}

// ---------------------------------------------------------------------------
// "Assigned to me"
// ---------------------------------------------------------------------------

/// Who "me" is on each tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    /// Jira display name; matched exactly or as a case-insensitive substring.
    pub display_name: String,
    /// GitHub login. When unknown, any GitHub assignee counts as me.
    pub github_login: Option<String>,
}

impl Identity {
    pub fn new(display_name: Option<&str>, github_login: Option<String>) -> Self {
        Self {
            display_name: display_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or("me")
                .to_string(),
            github_login,
        }
    }

    pub fn is_jira_me(&self, assignee: Option<&str>) -> bool {
        match assignee {
            Some(a) => {
                a == self.display_name
                    || a.to_lowercase()
                        .contains(&self.display_name.to_lowercase())
            }
            None => false,
        }
    }

    pub fn is_github_me(&self, assignee: Option<&str>) -> bool {
        match (assignee, self.github_login.as_deref()) {
            (None, _) => false,
            (Some(a), _) if a == "me" => true,
            (Some(a), Some(login)) => a.eq_ignore_ascii_case(login),
            (Some(a), None) => !a.is_empty(),
        }
    }

    pub fn owns(&self, status: &SyncStatus) -> bool {
        self.is_jira_me(status.jira.as_ref().and_then(|j| j.assignee.as_deref()))
            || self.is_github_me(status.github.as_ref().and_then(|g| g.assignee.as_deref()))
    }
}

/// Entries assigned to `me` on either side.
pub fn assigned_to<'a>(statuses: &'a [SyncStatus], me: &Identity) -> Vec<&'a SyncStatus> {
    statuses.iter().filter(|s| me.owns(s)).collect()
}

// ---------------------------------------------------------------------------
// Summary
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub total: usize,
    pub synced: usize,
    pub jira_only: usize,
    pub github_only: usize,
    pub assigned_to_me: usize,
}

impl SyncSummary {
    pub fn tally<'a>(statuses: impl IntoIterator<Item = &'a SyncStatus>, me: &Identity) -> Self {
        let mut summary = SyncSummary::default();
        for s in statuses {
            summary.total += 1;
            match s.state {
                SyncState::Synced => summary.synced += 1,
                SyncState::JiraOnly => summary.jira_only += 1,
                SyncState::GithubOnly => summary.github_only += 1,
            }
            if me.owns(s) {
                summary.assigned_to_me += 1;
            }
        }
        summary
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
