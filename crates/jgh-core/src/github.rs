//! GitHub issues through the `gh` CLI.
//!
//! Every call is an argv vector handed to `tokio::process::Command`; nothing
//! goes through a shell. `-R owner/name` is appended to repo-scoped commands
//! when a repository override is configured.

use serde::Deserialize;
use std::path::PathBuf;
use std::process::{Output, Stdio};
use tokio::process::Command;

use crate::error::{JghError, Result};
use crate::sync::extract_issue_key;
use crate::types::{GithubIssue, NewGithubIssue};

const SERVICE: &str = "GitHub";
const LIST_FIELDS: &str = "number,title,state,assignees,labels,url";
const LIST_LIMIT: &str = "1000";

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

#[allow(async_fn_in_trait)]
pub trait IssueHost {
    /// Fails with [`JghError::GhNotInstalled`] when the tool cannot run.
    async fn ensure_available(&self) -> Result<()>;

    /// Returns the new issue's URL.
    async fn create_issue(&self, issue: &NewGithubIssue) -> Result<String>;

    async fn list_open_issues(&self) -> Result<Vec<GithubIssue>>;

    async fn add_label(&self, number: u64, label: &str) -> Result<()>;

    async fn remove_label(&self, number: u64, label: &str) -> Result<()>;

    async fn assign_self(&self, number: u64) -> Result<()>;

    async fn unassign_self(&self, number: u64) -> Result<()>;

    async fn close_issue(&self, number: u64) -> Result<()>;

    /// Create the label unless it already exists.
    async fn ensure_label(&self, name: &str, color: &str, description: &str) -> Result<()>;

    /// Login of the authenticated user.
    async fn current_login(&self) -> Result<String>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct RawIssue {
    number: u64,
    title: String,
    #[serde(default)]
    state: String,
    #[serde(default)]
    assignees: Vec<RawLogin>,
    #[serde(default)]
    labels: Vec<RawLabel>,
    #[serde(default)]
    url: String,
}

#[derive(Debug, Deserialize)]
struct RawLogin {
    login: String,
}

#[derive(Debug, Deserialize)]
struct RawLabel {
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawRepo {
    owner: RawLogin,
    name: String,
}

/// Decode `gh issue list --json ...` output.
pub fn parse_issue_list(stdout: &str) -> Result<Vec<GithubIssue>> {
    let raw: Vec<RawIssue> = serde_json::from_str(stdout)?;
    Ok(raw
        .into_iter()
        .map(|issue| GithubIssue {
            jira_key: extract_issue_key(&issue.title),
            number: issue.number,
            title: issue.title,
            state: issue.state,
            assignee: issue.assignees.into_iter().next().map(|a| a.login),
            labels: issue.labels.into_iter().map(|l| l.name).collect(),
            url: issue.url,
        })
        .collect())
}

/// Error for a non-zero exit, carrying gh's stderr summary.
fn failure(args: &[&str], output: &Output) -> JghError {
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let message = if stderr.is_empty() {
        match output.status.code() {
            Some(code) => format!("gh {} exited with code {code}", args.join(" ")),
            None => format!("gh {} terminated by signal", args.join(" ")),
        }
    } else {
        stderr
    };
    JghError::remote(SERVICE, message)
}

/// `gh api` prints the 422 body on stdout and only a summary on stderr.
fn is_already_exists(output: &Output) -> bool {
    [&output.stdout, &output.stderr]
        .iter()
        .any(|stream| String::from_utf8_lossy(stream).contains("already_exists"))
}

// ---------------------------------------------------------------------------
// GhCli
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct GhCli {
    program: PathBuf,
    repo: Option<String>,
}

impl GhCli {
    /// Locate `gh` on `PATH`.
    pub fn locate(repo: Option<String>) -> Result<Self> {
        let program = which::which("gh").map_err(|_| JghError::GhNotInstalled)?;
        Ok(Self::with_program(program, repo))
    }

    /// Use a specific executable; tests point this at a script.
    pub fn with_program(program: impl Into<PathBuf>, repo: Option<String>) -> Self {
        Self {
            program: program.into(),
            repo: repo.filter(|r| !r.trim().is_empty()),
        }
    }

    async fn spawn(&self, args: &[&str]) -> Result<Output> {
        tracing::debug!(?args, "gh");
        Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| match e.kind() {
                std::io::ErrorKind::NotFound => JghError::GhNotInstalled,
                _ => JghError::Io(e),
            })
    }

    async fn run(&self, args: &[&str]) -> Result<String> {
        let output = self.spawn(args).await?;
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }
        Err(failure(args, &output))
    }

    /// Run a repo-scoped command, honoring the repository override.
    async fn run_in_repo(&self, args: &[&str]) -> Result<String> {
        match &self.repo {
            Some(repo) => {
                let mut scoped = args.to_vec();
                scoped.extend(["-R", repo.as_str()]);
                self.run(&scoped).await
            }
            None => self.run(args).await,
        }
    }

    async fn edit(&self, number: u64, flag: &str, value: &str) -> Result<()> {
        let number = number.to_string();
        self.run_in_repo(&["issue", "edit", &number, flag, value])
            .await?;
        Ok(())
    }

    /// `owner/name` of the target repository.
    async fn repo_slug(&self) -> Result<String> {
        if let Some(repo) = &self.repo {
            return Ok(repo.clone());
        }
        let out = self.run(&["repo", "view", "--json", "owner,name"]).await?;
        let repo: RawRepo = serde_json::from_str(&out)?;
        Ok(format!("{}/{}", repo.owner.login, repo.name))
    }
}

impl IssueHost for GhCli {
    async fn ensure_available(&self) -> Result<()> {
        self.run(&["--version"]).await.map_err(|e| match e {
            JghError::Io(_) => JghError::GhNotInstalled,
            other => other,
        })?;
        Ok(())
    }

    async fn create_issue(&self, issue: &NewGithubIssue) -> Result<String> {
        let labels = issue.labels.join(",");
        let mut args = vec![
            "issue",
            "create",
            "--title",
            issue.title.as_str(),
            "--body",
            issue.body.as_str(),
        ];
        if issue.assign_self {
            args.extend(["--assignee", "@me"]);
        }
        if !issue.labels.is_empty() {
            args.extend(["--label", labels.as_str()]);
        }
        let out = self.run_in_repo(&args).await?;
        Ok(out.trim().to_string())
    }

    async fn list_open_issues(&self) -> Result<Vec<GithubIssue>> {
        let out = self
            .run_in_repo(&[
                "issue",
                "list",
                "--state",
                "open",
                "--json",
                LIST_FIELDS,
                "--limit",
                LIST_LIMIT,
            ])
            .await?;
        parse_issue_list(&out)
    }

    async fn add_label(&self, number: u64, label: &str) -> Result<()> {
        self.edit(number, "--add-label", label).await
    }

    async fn remove_label(&self, number: u64, label: &str) -> Result<()> {
        self.edit(number, "--remove-label", label).await
    }

    async fn assign_self(&self, number: u64) -> Result<()> {
        self.edit(number, "--add-assignee", "@me").await
    }

    async fn unassign_self(&self, number: u64) -> Result<()> {
        self.edit(number, "--remove-assignee", "@me").await
    }

    async fn close_issue(&self, number: u64) -> Result<()> {
        let number = number.to_string();
        self.run_in_repo(&["issue", "close", &number]).await?;
        Ok(())
    }

    async fn ensure_label(&self, name: &str, color: &str, description: &str) -> Result<()> {
        let slug = self.repo_slug().await?;
        let endpoint = format!("repos/{slug}/labels");
        let name_field = format!("name={name}");
        let color_field = format!("color={color}");
        let description_field = format!("description={description}");
        let args = [
            "api",
            endpoint.as_str(),
            "-f",
            name_field.as_str(),
            "-f",
            color_field.as_str(),
            "-f",
            description_field.as_str(),
        ];
        let output = self.spawn(&args).await?;
        if output.status.success() {
            return Ok(());
        }
        if is_already_exists(&output) {
            tracing::debug!(name, "gh: label already exists");
            return Ok(());
        }
        Err(failure(&args, &output))
    }

    async fn current_login(&self) -> Result<String> {
        let out = self.run(&["api", "user", "--jq", ".login"]).await?;
        let login = out.trim().to_string();
        if login.is_empty() {
            return Err(JghError::remote(SERVICE, "empty login from gh api user"));
        }
        Ok(login)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
