//! `jgh update PROJ-1 (In Review) +qa -wip !high @me`
//!
//! The Jira transition is the only hard failure. Every other change is applied
//! best-effort and reported as a [`Step`]; GitHub changes need a synced twin.

use serde::Serialize;

use crate::command::{self, ParsedCommand};
use crate::config::Config;
use crate::error::Result;
use crate::github::IssueHost;
use crate::jira::IssueTracker;
use crate::report;
use crate::sync;
use crate::types::{Step, Tracker, AUTO_LABEL_COLOR, AUTO_LABEL_DESCRIPTION, PRIORITY_LABELS};

/// Status names that also close the GitHub issue.
const CLOSING_STATUSES: &[&str] = &["closed", "rejected", "done", "completed", "resolved", "finished"];

pub fn closes_github_issue(status: &str) -> bool {
    let status = status.to_lowercase();
    CLOSING_STATUSES.contains(&status.as_str())
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateReport {
    pub key: String,
    pub parsed: ParsedCommand,
    pub github_number: Option<u64>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "kebab-case")]
pub enum UpdateOutcome {
    /// The update string carried no actionable token.
    NoUpdates,
    Updated(UpdateReport),
}

pub async fn update_issue<T, H>(
    cfg: &Config,
    jira: &T,
    gh: &H,
    key: &str,
    update: &str,
) -> Result<UpdateOutcome>
where
    T: IssueTracker,
    H: IssueHost,
{
    let parsed = command::parse(update);
    if !parsed.has_updates() {
        return Ok(UpdateOutcome::NoUpdates);
    }

    let key = key.to_uppercase();
    let statuses = report::fetch_statuses(jira, gh, &cfg.jira.project).await?;
    let github_number = sync::find_synced(&statuses, &key)
        .and_then(|s| s.github.as_ref())
        .map(|g| g.number);

    let mut steps = Vec::new();
    update_jira(cfg, jira, &key, &parsed, &mut steps).await?;

    match github_number {
        Some(number) => update_github(gh, number, &parsed, &mut steps).await,
        None => steps.push(Step::warning(
            Tracker::Github,
            format!("No synced GitHub issue found for {key}"),
        )),
    }

    Ok(UpdateOutcome::Updated(UpdateReport {
        key,
        parsed,
        github_number,
        steps,
    }))
}

async fn update_jira<T: IssueTracker>(
    cfg: &Config,
    jira: &T,
    key: &str,
    parsed: &ParsedCommand,
    steps: &mut Vec<Step>,
) -> Result<()> {
    if let Some(status) = &parsed.status {
        jira.transition_issue(key, status).await?;
        steps.push(Step::applied(
            Tracker::Jira,
            format!("{key} transitioned to \"{status}\""),
        ));
    }

    if let Some(priority) = parsed.priority {
        steps.push(match jira.set_priority(key, priority).await {
            Ok(()) => Step::applied(Tracker::Jira, format!("priority set to {priority}")),
            Err(e) => Step::warning(Tracker::Jira, format!("could not set priority: {e}")),
        });
    }

    if !parsed.add_labels.is_empty() || !parsed.remove_labels.is_empty() {
        let result = async {
            let current = jira.issue_labels(key).await?;
            let merged = merge_labels(&current, &parsed.add_labels, &parsed.remove_labels);
            jira.set_labels(key, &merged).await
        }
        .await;
        match result {
            Ok(()) => {
                if !parsed.add_labels.is_empty() {
                    steps.push(Step::applied(
                        Tracker::Jira,
                        format!("added labels: {}", parsed.add_labels.join(", ")),
                    ));
                }
                if !parsed.remove_labels.is_empty() {
                    steps.push(Step::applied(
                        Tracker::Jira,
                        format!("removed labels: {}", parsed.remove_labels.join(", ")),
                    ));
                }
            }
            Err(e) => steps.push(Step::warning(
                Tracker::Jira,
                format!("could not update labels: {e}"),
            )),
        }
    }

    if parsed.unassign {
        steps.push(match jira.set_assignee(key, None).await {
            Ok(()) => Step::applied(Tracker::Jira, format!("unassigned {key}")),
            Err(e) => Step::warning(Tracker::Jira, format!("could not unassign: {e}")),
        });
    } else if parsed.assign_me {
        steps.push(match cfg.account_id() {
            None => Step::warning(
                Tracker::Jira,
                "account id not configured; run 'jgh reconfigure' to assign issues",
            ),
            Some(account_id) => match jira.set_assignee(key, Some(account_id)).await {
                Ok(()) => Step::applied(Tracker::Jira, format!("assigned {key} to you")),
                Err(e) => Step::warning(Tracker::Jira, format!("could not assign: {e}")),
            },
        });
    }

    Ok(())
}

async fn update_github<H: IssueHost>(
    gh: &H,
    number: u64,
    parsed: &ParsedCommand,
    steps: &mut Vec<Step>,
) {
    let mut to_add: Vec<String> = Vec::new();

    if let Some(priority) = parsed.priority {
        for old in &PRIORITY_LABELS {
            if let Err(e) = gh.remove_label(number, old.name).await {
                tracing::debug!(label = old.name, error = %e, "priority label not removed");
            }
        }
        let label = priority.github_label();
        if let Err(e) = gh.ensure_label(label.name, label.color, label.description).await {
            tracing::debug!(label = label.name, error = %e, "could not ensure priority label");
        }
        to_add.push(label.name.to_string());
    }

    for label in &parsed.add_labels {
        if let Err(e) = gh
            .ensure_label(label, AUTO_LABEL_COLOR, AUTO_LABEL_DESCRIPTION)
            .await
        {
            tracing::debug!(label = %label, error = %e, "could not ensure label");
        }
        if !to_add.contains(label) {
            to_add.push(label.clone());
        }
    }

    for label in &to_add {
        steps.push(match gh.add_label(number, label).await {
            Ok(()) => Step::applied(Tracker::Github, format!("added label {label}")),
            Err(e) => Step::warning(Tracker::Github, format!("could not add label \"{label}\": {e}")),
        });
    }

    for label in &parsed.remove_labels {
        steps.push(match gh.remove_label(number, label).await {
            Ok(()) => Step::applied(Tracker::Github, format!("removed label {label}")),
            Err(e) => Step::warning(
                Tracker::Github,
                format!("could not remove label \"{label}\": {e}"),
            ),
        });
    }

    if parsed.unassign {
        steps.push(match gh.unassign_self(number).await {
            Ok(()) => Step::applied(Tracker::Github, format!("unassigned #{number}")),
            Err(e) => Step::warning(Tracker::Github, format!("could not unassign: {e}")),
        });
    } else if parsed.assign_me {
        steps.push(match gh.assign_self(number).await {
            Ok(()) => Step::applied(Tracker::Github, format!("assigned #{number} to you")),
            Err(e) => Step::warning(Tracker::Github, format!("could not assign: {e}")),
        });
    }

    if let Some(status) = parsed.status.as_deref().filter(|s| closes_github_issue(s)) {
        steps.push(match gh.close_issue(number).await {
            Ok(()) => Step::applied(Tracker::Github, format!("closed #{number} ({status})")),
            Err(e) => Step::warning(Tracker::Github, format!("could not close issue: {e}")),
        });
    }
}

/// `current` plus `add` (no duplicates), then minus `remove`.
pub fn merge_labels(current: &[String], add: &[String], remove: &[String]) -> Vec<String> {
    let mut merged: Vec<String> = Vec::with_capacity(current.len() + add.len());
    for label in current.iter().chain(add) {
        if !merged.contains(label) {
            merged.push(label.clone());
        }
    }
    merged.retain(|l| !remove.contains(l));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn merge_adds_without_duplicates_then_removes() {
        let merged = merge_labels(
            &strings(&["backend", "wip"]),
            &strings(&["qa", "backend", "qa"]),
            &strings(&["wip"]),
        );
        assert_eq!(merged, strings(&["backend", "qa"]));
    }

    #[test]
    fn remove_wins_over_add() {
        let merged = merge_labels(&[], &strings(&["x"]), &strings(&["x"]));
        assert!(merged.is_empty());
    }

    #[test]
    fn closing_statuses_are_case_insensitive() {
        for s in ["Done", "CLOSED", "resolved", "Finished", "rejected", "Completed"] {
            assert!(closes_github_issue(s), "{s}");
        }
        assert!(!closes_github_issue("In Review"));
        assert!(!closes_github_issue("Done-ish"));
    }
}
