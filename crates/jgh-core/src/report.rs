//! Read-only views: the joint fetch, `list`, `details`, and the time-tracking
//! decoration both of them share.

use serde::Serialize;

use crate::config::Config;
use crate::error::{JghError, Result};
use crate::github::IssueHost;
use crate::jira::IssueTracker;
use crate::sync::{self, Identity, SyncSummary};
use crate::tempo::WorklogStore;
use crate::types::{GithubIssue, JiraIssue, SyncStatus, Worklog};

/// Over/under threshold, in percent of the estimate.
const TREND_TOLERANCE: f64 = 5.0;

// ---------------------------------------------------------------------------
// Fetch
// ---------------------------------------------------------------------------

/// Open issues from both trackers, fetched concurrently. Either failure aborts.
pub async fn fetch_issues<T, H>(
    jira: &T,
    gh: &H,
    project: &str,
) -> Result<(Vec<JiraIssue>, Vec<GithubIssue>)>
where
    T: IssueTracker,
    H: IssueHost,
{
    let github = async {
        gh.ensure_available().await?;
        gh.list_open_issues().await
    };
    let (jira_issues, github_issues) = tokio::join!(jira.search_open_issues(project), github);
    let (jira_issues, github_issues) = (jira_issues?, github_issues?);
    tracing::debug!(
        jira = jira_issues.len(),
        github = github_issues.len(),
        "fetched open issues"
    );
    Ok((jira_issues, github_issues))
}

pub async fn fetch_statuses<T, H>(jira: &T, gh: &H, project: &str) -> Result<Vec<SyncStatus>>
where
    T: IssueTracker,
    H: IssueHost,
{
    let (jira_issues, github_issues) = fetch_issues(jira, gh, project).await?;
    Ok(sync::reconcile(&jira_issues, &github_issues))
}

/// Who "me" is. The GitHub login lookup is best-effort.
pub async fn resolve_identity<H: IssueHost>(cfg: &Config, gh: &H) -> Identity {
    let login = match gh.current_login().await {
        Ok(login) => Some(login),
        Err(e) => {
            tracing::debug!(error = %e, "could not resolve GitHub login");
            None
        }
    };
    Identity::new(cfg.display_name.as_deref(), login)
}

// ---------------------------------------------------------------------------
// Time tracking
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "trend", content = "percent", rename_all = "kebab-case")]
pub enum Trend {
    /// Estimated, nothing logged yet.
    NotStarted,
    /// Logged with no estimate to compare against.
    NoEstimate,
    OnTrack,
    Over(u64),
    Under(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TimeSummary {
    pub estimate_seconds: u64,
    pub logged_seconds: u64,
    pub worklogs: Vec<Worklog>,
}

impl TimeSummary {
    pub fn new(estimate_seconds: u64, worklogs: Vec<Worklog>) -> Self {
        let logged_seconds = worklogs.iter().map(|w| w.time_spent_seconds).sum();
        Self {
            estimate_seconds,
            logged_seconds,
            worklogs,
        }
    }

    /// Nothing estimated and nothing logged.
    pub fn is_empty(&self) -> bool {
        self.estimate_seconds == 0 && self.logged_seconds == 0
    }

    pub fn trend(&self) -> Trend {
        match (self.estimate_seconds, self.logged_seconds) {
            (0, _) => Trend::NoEstimate,
            (_, 0) => Trend::NotStarted,
            (estimate, logged) => {
                let diff = (logged as f64 - estimate as f64) / estimate as f64 * 100.0;
                if diff > TREND_TOLERANCE {
                    Trend::Over(diff.round() as u64)
                } else if diff < -TREND_TOLERANCE {
                    Trend::Under((-diff).round() as u64)
                } else {
                    Trend::OnTrack
                }
            }
        }
    }

    /// Estimate minus logged; negative when over.
    pub fn remaining_seconds(&self) -> i64 {
        self.estimate_seconds as i64 - self.logged_seconds as i64
    }
}

/// Outcome of the optional time-tracking lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "data", rename_all = "kebab-case")]
pub enum TimeInfo {
    /// No Tempo token configured.
    Unavailable,
    Failed(String),
    Loaded(TimeSummary),
}

impl TimeInfo {
    pub fn summary(&self) -> Option<&TimeSummary> {
        match self {
            TimeInfo::Loaded(summary) => Some(summary),
            _ => None,
        }
    }
}

/// Jira estimate plus Tempo worklogs for one issue.
pub async fn time_summary<T, W>(jira: &T, tempo: &W, key: &str) -> Result<TimeSummary>
where
    T: IssueTracker,
    W: WorklogStore,
{
    let (tracking, worklogs) = tokio::join!(jira.time_tracking(key), tempo.worklogs_for_issue(key));
    Ok(TimeSummary::new(tracking?.estimate_seconds(), worklogs?))
}

async fn time_info<T, W>(jira: &T, tempo: Option<&W>, key: &str) -> TimeInfo
where
    T: IssueTracker,
    W: WorklogStore,
{
    let Some(tempo) = tempo else {
        return TimeInfo::Unavailable;
    };
    match time_summary(jira, tempo, key).await {
        Ok(summary) => TimeInfo::Loaded(summary),
        Err(e) => {
            tracing::warn!(key, error = %e, "time tracking unavailable");
            TimeInfo::Failed(e.to_string())
        }
    }
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct ListEntry {
    #[serde(flatten)]
    pub status: SyncStatus,
    pub mine: bool,
    pub time: TimeInfo,
}

#[derive(Debug, Clone, Serialize)]
pub struct ListReport {
    pub mine_only: bool,
    pub me: Identity,
    pub entries: Vec<ListEntry>,
    /// Counts over the shown entries when `mine_only`, over everything otherwise.
    pub summary: SyncSummary,
}

pub async fn list_issues<T, H, W>(
    cfg: &Config,
    jira: &T,
    gh: &H,
    tempo: Option<&W>,
    mine_only: bool,
) -> Result<ListReport>
where
    T: IssueTracker,
    H: IssueHost,
    W: WorklogStore,
{
    let statuses = fetch_statuses(jira, gh, &cfg.jira.project).await?;
    let me = resolve_identity(cfg, gh).await;

    let summary = if mine_only {
        SyncSummary::tally(sync::assigned_to(&statuses, &me), &me)
    } else {
        SyncSummary::tally(&statuses, &me)
    };

    let mut entries = Vec::new();
    for status in statuses {
        let mine = me.owns(&status);
        if mine_only && !mine {
            continue;
        }
        let time = match status.jira {
            Some(_) => time_info(jira, tempo, &status.key).await,
            None => TimeInfo::Unavailable,
        };
        entries.push(ListEntry { status, mine, time });
    }

    Ok(ListReport {
        mine_only,
        me,
        entries,
        summary,
    })
}

// ---------------------------------------------------------------------------
// details
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct IssueDetails {
    pub jira: JiraIssue,
    pub github: Option<GithubIssue>,
    pub time: TimeInfo,
}

pub async fn issue_details<T, H, W>(
    cfg: &Config,
    jira: &T,
    gh: &H,
    tempo: Option<&W>,
    key: &str,
) -> Result<IssueDetails>
where
    T: IssueTracker,
    H: IssueHost,
    W: WorklogStore,
{
    let key = key.to_uppercase();
    let (jira_issues, github_issues) = fetch_issues(jira, gh, &cfg.jira.project).await?;

    let issue = jira_issues
        .into_iter()
        .find(|i| i.key == key)
        .ok_or_else(|| JghError::IssueNotFound(key.clone()))?;
    let github = github_issues
        .into_iter()
        .find(|g| g.jira_key.as_deref() == Some(key.as_str()));
    let time = time_info(jira, tempo, &key).await;

    Ok(IssueDetails {
        jira: issue,
        github,
        time,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
