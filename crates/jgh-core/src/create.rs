//! Create a Jira issue and its GitHub twin.

use serde::Serialize;

use crate::command;
use crate::config::Config;
use crate::error::{JghError, Result};
use crate::github::IssueHost;
use crate::jira::IssueTracker;
use crate::types::{
    CreatedIssue, NewGithubIssue, NewIssue, Priority, Step, Tracker, AUTO_LABEL_COLOR,
    AUTO_LABEL_DESCRIPTION,
};

/// Flags given alongside the title. `labels` and `status` replace whatever
/// the title itself carried.
#[derive(Debug, Clone, Default)]
pub struct CreateRequest {
    pub title: String,
    pub description: Option<String>,
    pub issue_type: Option<String>,
    pub assign_me: bool,
    /// Comma-separated.
    pub labels: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CreateReport {
    pub jira: CreatedIssue,
    pub github_title: String,
    pub github_url: String,
    pub labels: Vec<String>,
    pub priority: Option<Priority>,
    pub assigned: bool,
    /// Requested status; `transitioned` says whether Jira accepted it.
    pub status: Option<String>,
    pub transitioned: bool,
    /// Warnings only; successful side effects are implied by the fields above.
    pub warnings: Vec<Step>,
}

/// Split `a, b,,c` into `["a", "b", "c"]`.
pub fn split_labels(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

pub async fn create_linked_issue<T, H>(
    cfg: &Config,
    jira: &T,
    gh: &H,
    req: &CreateRequest,
) -> Result<CreateReport>
where
    T: IssueTracker,
    H: IssueHost,
{
    let parsed = command::parse(&req.title);
    if parsed.clean_title.is_empty() {
        return Err(JghError::Validation(
            "issue title is empty once command tokens are removed".into(),
        ));
    }

    let assign = req.assign_me || parsed.assign_me;
    let labels = match &req.labels {
        Some(raw) => split_labels(raw),
        None => parsed.add_labels.clone(),
    };
    let status = req
        .status
        .clone()
        .filter(|s| !s.trim().is_empty())
        .or_else(|| parsed.status.clone());
    let description = req.description.clone().unwrap_or_default();
    let mut warnings = Vec::new();

    // Fail before anything is created in Jira.
    gh.ensure_available().await?;

    let assignee = if assign {
        let id = cfg.account_id().map(str::to_string);
        if id.is_none() {
            warnings.push(Step::warning(
                Tracker::Jira,
                "account id not configured; Jira issue left unassigned",
            ));
        }
        id
    } else {
        None
    };

    let created = jira
        .create_issue(&NewIssue {
            project: cfg.jira.project.clone(),
            summary: parsed.clean_title.clone(),
            description: description.clone(),
            issue_type: req
                .issue_type
                .clone()
                .unwrap_or_else(|| cfg.jira.issue_type.clone()),
            assignee,
            priority: parsed.priority,
        })
        .await?;
    tracing::info!(key = %created.key, "jira issue created");

    let mut transitioned = false;
    if let Some(status) = &status {
        match jira.transition_issue(&created.key, status).await {
            Ok(_) => transitioned = true,
            Err(e) => warnings.push(Step::warning(Tracker::Jira, e.to_string())),
        }
    }

    let github_title = format!("{} {}", parsed.clean_title, created.key);
    let body = github_body(&description, &created.url, &labels, parsed.priority);

    let mut github_labels = labels.clone();
    for label in &labels {
        if let Err(e) = gh
            .ensure_label(label, AUTO_LABEL_COLOR, AUTO_LABEL_DESCRIPTION)
            .await
        {
            warnings.push(Step::warning(
                Tracker::Github,
                format!("could not create label \"{label}\": {e}"),
            ));
        }
    }
    if let Some(priority) = parsed.priority {
        let spec = priority.github_label();
        if let Err(e) = gh.ensure_label(spec.name, spec.color, spec.description).await {
            warnings.push(Step::warning(
                Tracker::Github,
                format!("could not create label \"{}\": {e}", spec.name),
            ));
        }
        if !github_labels.iter().any(|l| l == spec.name) {
            github_labels.push(spec.name.to_string());
        }
    }

    let github_url = gh
        .create_issue(&NewGithubIssue {
            title: github_title.clone(),
            body,
            assign_self: assign,
            labels: github_labels.clone(),
        })
        .await?;

    Ok(CreateReport {
        jira: created,
        github_title,
        github_url,
        labels: github_labels,
        priority: parsed.priority,
        assigned: assign,
        status,
        transitioned,
        warnings,
    })
}

fn github_body(description: &str, jira_url: &str, labels: &[String], priority: Option<Priority>) -> String {
    let mut body = if description.is_empty() {
        format!("Linked to Jira issue: {jira_url}")
    } else {
        description.to_string()
    };
    if !labels.is_empty() {
        let tags: Vec<String> = labels.iter().map(|l| format!("+{l}")).collect();
        body.push_str(&format!("\n\nLabels: {}", tags.join(" ")));
    }
    if let Some(priority) = priority {
        body.push_str(&format!("\n\nPriority: {priority}"));
    }
    body
}
