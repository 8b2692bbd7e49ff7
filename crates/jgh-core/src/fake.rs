//! In-process stand-ins for Jira, `gh` and Tempo.
//!
//! Each fake keeps its state behind a `Mutex`, records every call as a short
//! string (`"set_priority PROJ-1 High"`), and can be told to fail a named
//! operation so degraded paths are testable.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::duration;
use crate::error::{JghError, Result};
use crate::github::IssueHost;
use crate::jira::IssueTracker;
use crate::paths;
use crate::sync::extract_issue_key;
use crate::tempo::WorklogStore;
use crate::types::{
    CreatedIssue, GithubIssue, JiraIssue, NewGithubIssue, NewIssue, NewWorklog, Priority,
    TimeTracking, Transition, Worklog,
};

const FAKE_JIRA_URL: &str = "https://fake.atlassian.net";
const FAKE_REPO_URL: &str = "https://github.com/acme/app";

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn injected(service: &'static str, op: &str) -> JghError {
    JghError::remote(service, format!("injected failure: {op}"))
}

// ---------------------------------------------------------------------------
// FakeTracker
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct TrackerState {
    pub issues: Vec<JiraIssue>,
    pub transitions: Vec<Transition>,
    pub account_id: Option<String>,
    pub priorities: HashMap<String, Priority>,
    pub time_tracking: HashMap<String, TimeTracking>,
    pub created: Vec<NewIssue>,
    pub calls: Vec<String>,
    failing: HashSet<String>,
    next_number: u64,
}

#[derive(Debug, Default)]
pub struct FakeTracker {
    state: Mutex<TrackerState>,
}

impl FakeTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_issue(self, issue: JiraIssue) -> Self {
        lock(&self.state).issues.push(issue);
        self
    }

    pub fn with_transitions(self, names: &[&str]) -> Self {
        lock(&self.state).transitions = names
            .iter()
            .enumerate()
            .map(|(i, name)| Transition {
                id: format!("{}", (i + 1) * 10 + 1),
                name: name.to_string(),
            })
            .collect();
        self
    }

    pub fn with_account_id(self, id: &str) -> Self {
        lock(&self.state).account_id = Some(id.to_string());
        self
    }

    pub fn with_time_tracking(self, key: &str, tt: TimeTracking) -> Self {
        lock(&self.state).time_tracking.insert(key.to_string(), tt);
        self
    }

    /// Make every call to `op` fail with a remote error.
    pub fn failing(self, op: &str) -> Self {
        lock(&self.state).failing.insert(op.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.state).calls.clone()
    }

    pub fn issue(&self, key: &str) -> Option<JiraIssue> {
        lock(&self.state).issues.iter().find(|i| i.key == key).cloned()
    }

    pub fn state(&self) -> MutexGuard<'_, TrackerState> {
        lock(&self.state)
    }

    fn enter(&self, op: &str, detail: String) -> Result<MutexGuard<'_, TrackerState>> {
        let mut state = lock(&self.state);
        state.calls.push(if detail.is_empty() {
            op.to_string()
        } else {
            format!("{op} {detail}")
        });
        if state.failing.contains(op) {
            return Err(injected("Jira", op));
        }
        Ok(state)
    }
}

impl TrackerState {
    fn issue_mut(&mut self, key: &str) -> Result<&mut JiraIssue> {
        self.issues
            .iter_mut()
            .find(|i| i.key == key)
            .ok_or_else(|| JghError::IssueNotFound(key.to_string()))
    }
}

impl IssueTracker for FakeTracker {
    async fn find_account_id(&self, email: &str) -> Result<String> {
        let state = self.enter("find_account_id", email.to_string())?;
        state
            .account_id
            .clone()
            .ok_or_else(|| JghError::remote("Jira", format!("no user found for {email}")))
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue> {
        let mut state = self.enter("create_issue", issue.summary.clone())?;
        state.next_number += 1;
        let key = format!("{}-{}", issue.project, 100 + state.next_number);
        let url = paths::browse_url(FAKE_JIRA_URL, &key);
        state.issues.push(JiraIssue {
            key: key.clone(),
            summary: issue.summary.clone(),
            status: "To Do".into(),
            assignee: issue.assignee.clone(),
            labels: Vec::new(),
            url: url.clone(),
        });
        if let Some(p) = issue.priority {
            state.priorities.insert(key.clone(), p);
        }
        state.created.push(issue.clone());
        Ok(CreatedIssue {
            id: format!("{}", 10_000 + state.next_number),
            key,
            url,
        })
    }

    async fn transitions(&self, key: &str) -> Result<Vec<Transition>> {
        let state = self.enter("transitions", key.to_string())?;
        Ok(state.transitions.clone())
    }

    async fn apply_transition(&self, key: &str, transition_id: &str) -> Result<()> {
        let mut state = self.enter("apply_transition", format!("{key} {transition_id}"))?;
        let name = state
            .transitions
            .iter()
            .find(|t| t.id == transition_id)
            .map(|t| t.name.clone())
            .unwrap_or_default();
        if let Ok(issue) = state.issue_mut(key) {
            issue.status = name;
        }
        Ok(())
    }

    async fn search_open_issues(&self, project: &str) -> Result<Vec<JiraIssue>> {
        let state = self.enter("search_open_issues", project.to_string())?;
        let prefix = format!("{project}-");
        Ok(state
            .issues
            .iter()
            .filter(|i| i.key.starts_with(&prefix))
            .cloned()
            .collect())
    }

    async fn issue_labels(&self, key: &str) -> Result<Vec<String>> {
        let mut state = self.enter("issue_labels", key.to_string())?;
        Ok(state.issue_mut(key)?.labels.clone())
    }

    async fn set_priority(&self, key: &str, priority: Priority) -> Result<()> {
        let mut state = self.enter("set_priority", format!("{key} {priority}"))?;
        state.priorities.insert(key.to_string(), priority);
        Ok(())
    }

    async fn set_labels(&self, key: &str, labels: &[String]) -> Result<()> {
        let mut state = self.enter("set_labels", format!("{key} {}", labels.join(",")))?;
        state.issue_mut(key)?.labels = labels.to_vec();
        Ok(())
    }

    async fn set_assignee(&self, key: &str, account_id: Option<&str>) -> Result<()> {
        let mut state = self.enter(
            "set_assignee",
            format!("{key} {}", account_id.unwrap_or("<none>")),
        )?;
        state.issue_mut(key)?.assignee = account_id.map(str::to_string);
        Ok(())
    }

    async fn time_tracking(&self, key: &str) -> Result<TimeTracking> {
        let state = self.enter("time_tracking", key.to_string())?;
        Ok(state.time_tracking.get(key).cloned().unwrap_or_default())
    }

    async fn set_original_estimate(&self, key: &str, estimate: &str) -> Result<()> {
        let mut state = self.enter("set_original_estimate", format!("{key} {estimate}"))?;
        let entry = state.time_tracking.entry(key.to_string()).or_default();
        entry.original_estimate = Some(estimate.to_string());
        entry.original_estimate_seconds = Some(duration::parse_jira_time(estimate));
        Ok(())
    }

    async fn issue_id(&self, key: &str) -> Result<u64> {
        let _state = self.enter("issue_id", key.to_string())?;
        key.rsplit('-')
            .next()
            .and_then(|n| n.parse::<u64>().ok())
            .map(|n| 10_000 + n)
            .ok_or_else(|| JghError::IssueNotFound(key.to_string()))
    }
}

// ---------------------------------------------------------------------------
// FakeHost
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct HostState {
    pub issues: Vec<GithubIssue>,
    /// Labels that exist in the repository.
    pub repo_labels: BTreeSet<String>,
    pub login: Option<String>,
    pub installed: bool,
    pub calls: Vec<String>,
    failing: HashSet<String>,
}

impl Default for HostState {
    fn default() -> Self {
        Self {
            issues: Vec::new(),
            repo_labels: BTreeSet::new(),
            login: None,
            installed: true,
            calls: Vec::new(),
            failing: HashSet::new(),
        }
    }
}

impl HostState {
    fn issue_mut(&mut self, number: u64) -> Result<&mut GithubIssue> {
        self.issues
            .iter_mut()
            .find(|i| i.number == number)
            .ok_or_else(|| JghError::remote("GitHub", format!("could not resolve to an Issue with the number of {number}")))
    }
}

#[derive(Debug, Default)]
pub struct FakeHost {
    state: Mutex<HostState>,
}

impl FakeHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an existing issue; its Jira key is extracted from the title.
    pub fn with_issue(self, number: u64, title: &str, assignee: Option<&str>, labels: &[&str]) -> Self {
        lock(&self.state).issues.push(GithubIssue {
            number,
            title: title.to_string(),
            state: "OPEN".into(),
            assignee: assignee.map(str::to_string),
            labels: labels.iter().map(|l| l.to_string()).collect(),
            url: format!("{FAKE_REPO_URL}/issues/{number}"),
            jira_key: extract_issue_key(title),
        });
        self
    }

    pub fn with_label(self, name: &str) -> Self {
        lock(&self.state).repo_labels.insert(name.to_string());
        self
    }

    pub fn with_login(self, login: &str) -> Self {
        lock(&self.state).login = Some(login.to_string());
        self
    }

    pub fn not_installed(self) -> Self {
        lock(&self.state).installed = false;
        self
    }

    pub fn failing(self, op: &str) -> Self {
        lock(&self.state).failing.insert(op.to_string());
        self
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.state).calls.clone()
    }

    pub fn issue(&self, number: u64) -> Option<GithubIssue> {
        lock(&self.state)
            .issues
            .iter()
            .find(|i| i.number == number)
            .cloned()
    }

    pub fn state(&self) -> MutexGuard<'_, HostState> {
        lock(&self.state)
    }

    fn enter(&self, op: &str, detail: String) -> Result<MutexGuard<'_, HostState>> {
        let mut state = lock(&self.state);
        state.calls.push(if detail.is_empty() {
            op.to_string()
        } else {
            format!("{op} {detail}")
        });
        if !state.installed {
            return Err(JghError::GhNotInstalled);
        }
        if state.failing.contains(op) {
            return Err(injected("GitHub", op));
        }
        Ok(state)
    }
}

impl IssueHost for FakeHost {
    async fn ensure_available(&self) -> Result<()> {
        self.enter("ensure_available", String::new())?;
        Ok(())
    }

    async fn create_issue(&self, issue: &NewGithubIssue) -> Result<String> {
        let mut state = self.enter("create_issue", issue.title.clone())?;
        if let Some(missing) = issue.labels.iter().find(|l| !state.repo_labels.contains(*l)) {
            return Err(JghError::remote(
                "GitHub",
                format!("could not add label: '{missing}' not found"),
            ));
        }
        let number = state.issues.iter().map(|i| i.number).max().unwrap_or(0) + 1;
        let url = format!("{FAKE_REPO_URL}/issues/{number}");
        let assignee = if issue.assign_self {
            Some(state.login.clone().unwrap_or_else(|| "me".into()))
        } else {
            None
        };
        state.issues.push(GithubIssue {
            number,
            title: issue.title.clone(),
            state: "OPEN".into(),
            assignee,
            labels: issue.labels.clone(),
            url: url.clone(),
            jira_key: extract_issue_key(&issue.title),
        });
        Ok(url)
    }

    async fn list_open_issues(&self) -> Result<Vec<GithubIssue>> {
        let state = self.enter("list_open_issues", String::new())?;
        Ok(state
            .issues
            .iter()
            .filter(|i| i.state == "OPEN")
            .cloned()
            .collect())
    }

    async fn add_label(&self, number: u64, label: &str) -> Result<()> {
        let mut state = self.enter("add_label", format!("{number} {label}"))?;
        if !state.repo_labels.contains(label) {
            return Err(JghError::remote(
                "GitHub",
                format!("'{label}' not found"),
            ));
        }
        let issue = state.issue_mut(number)?;
        if !issue.labels.iter().any(|l| l == label) {
            issue.labels.push(label.to_string());
        }
        Ok(())
    }

    async fn remove_label(&self, number: u64, label: &str) -> Result<()> {
        let mut state = self.enter("remove_label", format!("{number} {label}"))?;
        state.issue_mut(number)?.labels.retain(|l| l != label);
        Ok(())
    }

    async fn assign_self(&self, number: u64) -> Result<()> {
        let mut state = self.enter("assign_self", number.to_string())?;
        let login = state.login.clone().unwrap_or_else(|| "me".into());
        state.issue_mut(number)?.assignee = Some(login);
        Ok(())
    }

    async fn unassign_self(&self, number: u64) -> Result<()> {
        let mut state = self.enter("unassign_self", number.to_string())?;
        state.issue_mut(number)?.assignee = None;
        Ok(())
    }

    async fn close_issue(&self, number: u64) -> Result<()> {
        let mut state = self.enter("close_issue", number.to_string())?;
        state.issue_mut(number)?.state = "CLOSED".into();
        Ok(())
    }

    async fn ensure_label(&self, name: &str, color: &str, _description: &str) -> Result<()> {
        let mut state = self.enter("ensure_label", format!("{name} {color}"))?;
        state.repo_labels.insert(name.to_string());
        Ok(())
    }

    async fn current_login(&self) -> Result<String> {
        let state = self.enter("current_login", String::new())?;
        state
            .login
            .clone()
            .ok_or_else(|| JghError::remote("GitHub", "not logged in"))
    }
}

// ---------------------------------------------------------------------------
// FakeWorklogs
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct WorklogState {
    pub by_issue: HashMap<String, Vec<Worklog>>,
    pub posted: Vec<NewWorklog>,
    pub calls: Vec<String>,
    failing: HashSet<String>,
}

#[derive(Debug, Default)]
pub struct FakeWorklogs {
    state: Mutex<WorklogState>,
}

impl FakeWorklogs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed logged entries, in seconds, for `key`.
    pub fn with_logged(self, key: &str, seconds: &[u64]) -> Self {
        let logs = seconds
            .iter()
            .map(|&s| Worklog {
                time_spent_seconds: s,
                start_date: Some("2026-03-02".into()),
                start_time: None,
                description: None,
            })
            .collect();
        lock(&self.state).by_issue.insert(key.to_string(), logs);
        self
    }

    pub fn failing(self, op: &str) -> Self {
        lock(&self.state).failing.insert(op.to_string());
        self
    }

    pub fn posted(&self) -> Vec<NewWorklog> {
        lock(&self.state).posted.clone()
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.state).calls.clone()
    }

    fn enter(&self, op: &str, detail: String) -> Result<MutexGuard<'_, WorklogState>> {
        let mut state = lock(&self.state);
        state.calls.push(format!("{op} {detail}"));
        if state.failing.contains(op) {
            return Err(injected("Tempo", op));
        }
        Ok(state)
    }
}

impl WorklogStore for FakeWorklogs {
    async fn log_work(&self, worklog: &NewWorklog) -> Result<u64> {
        let mut state = self.enter("log_work", worklog.issue_id.to_string())?;
        state.posted.push(worklog.clone());
        Ok(500 + state.posted.len() as u64)
    }

    async fn worklogs_for_issue(&self, key: &str) -> Result<Vec<Worklog>> {
        let state = self.enter("worklogs_for_issue", key.to_string())?;
        Ok(state.by_issue.get(key).cloned().unwrap_or_default())
    }
}
