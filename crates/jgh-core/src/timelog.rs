//! `jgh time` and `jgh estimate`.

use chrono::{Local, NaiveDate};
use serde::Serialize;

use crate::config::Config;
use crate::duration::{self, DurationStyle};
use crate::error::{JghError, Result};
use crate::jira::IssueTracker;
use crate::tempo::WorklogStore;
use crate::types::NewWorklog;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, Default)]
pub struct TimeRequest {
    pub key: String,
    pub duration: String,
    pub description: Option<String>,
    /// `YYYY-MM-DD`; today when absent.
    pub date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoggedWork {
    pub key: String,
    pub worklog_id: u64,
    pub seconds: u64,
    pub date: String,
    pub description: String,
}

/// A worklog that passed the local checks but has no Jira issue id yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorklogDraft {
    pub key: String,
    pub author_account_id: String,
    pub time_spent_seconds: u64,
    pub start_date: String,
    pub description: String,
}

impl WorklogDraft {
    pub fn for_issue(&self, issue_id: u64) -> NewWorklog {
        NewWorklog {
            author_account_id: self.author_account_id.clone(),
            issue_id,
            time_spent_seconds: self.time_spent_seconds,
            start_date: self.start_date.clone(),
            description: self.description.clone(),
        }
    }
}

/// Checks the preconditions that do not need the network, in the order a
/// user would fix them: Tempo token, duration, account id, date.
pub fn prepare_worklog(cfg: &Config, req: &TimeRequest) -> Result<WorklogDraft> {
    if cfg.tempo_token().is_none() {
        return Err(JghError::Validation(
            "Tempo token not configured. Run 'jgh setup' to add one.".into(),
        ));
    }
    let seconds = duration::parse_duration(&req.duration)?;
    let account_id = cfg.account_id().ok_or_else(|| {
        JghError::Validation(
            "Jira account id not configured. Run 'jgh reconfigure' to resolve it.".into(),
        )
    })?;
    let date = match req.date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
        Some(raw) => NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| {
            JghError::Validation(format!("invalid date \"{raw}\": expected YYYY-MM-DD"))
        })?,
        None => Local::now().date_naive(),
    };

    let key = req.key.to_uppercase();
    let description = req
        .description
        .clone()
        .filter(|d| !d.trim().is_empty())
        .unwrap_or_else(|| format!("Work on {key}"));

    Ok(WorklogDraft {
        key,
        author_account_id: account_id.to_string(),
        time_spent_seconds: seconds,
        start_date: date.format(DATE_FORMAT).to_string(),
        description,
    })
}

pub async fn log_time<T, W>(cfg: &Config, jira: &T, tempo: &W, req: &TimeRequest) -> Result<LoggedWork>
where
    T: IssueTracker,
    W: WorklogStore,
{
    let draft = prepare_worklog(cfg, req)?;
    let issue_id = jira.issue_id(&draft.key).await?;
    let worklog_id = tempo.log_work(&draft.for_issue(issue_id)).await?;
    tracing::info!(key = %draft.key, worklog_id, seconds = draft.time_spent_seconds, "work logged");

    Ok(LoggedWork {
        key: draft.key,
        worklog_id,
        seconds: draft.time_spent_seconds,
        date: draft.start_date,
        description: draft.description,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EstimateSet {
    pub key: String,
    pub seconds: u64,
    /// As sent to Jira, e.g. `2h 30m`.
    pub estimate: String,
}

pub async fn set_estimate<T: IssueTracker>(jira: &T, key: &str, duration_text: &str) -> Result<EstimateSet> {
    let seconds = duration::parse_duration(duration_text)?;
    let key = key.to_uppercase();
    let estimate = duration::format_seconds(seconds, DurationStyle::Jira);
    jira.set_original_estimate(&key, &estimate).await?;
    Ok(EstimateSet {
        key,
        seconds,
        estimate,
    })
}
