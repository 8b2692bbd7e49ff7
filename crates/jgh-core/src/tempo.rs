//! Tempo worklogs (REST v4).

use reqwest::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{JghError, Result};
use crate::paths;
use crate::types::{NewWorklog, Worklog};

const SERVICE: &str = "Tempo";

#[allow(async_fn_in_trait)]
pub trait WorklogStore {
    /// Record time against an issue; returns the Tempo worklog id.
    async fn log_work(&self, worklog: &NewWorklog) -> Result<u64>;

    async fn worklogs_for_issue(&self, key: &str) -> Result<Vec<Worklog>>;
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedWorklog {
    tempo_worklog_id: u64,
}

#[derive(Debug, Deserialize)]
struct WorklogPage {
    #[serde(default)]
    results: Vec<Worklog>,
}

#[derive(Debug, Clone)]
pub struct TempoClient {
    base_url: String,
    token: String,
    http: Client,
}

impl TempoClient {
    /// Client against the default (or `JGH_TEMPO_URL`) endpoint.
    pub fn new(token: &str) -> Result<Self> {
        Self::with_base_url(&paths::tempo_base_url(), token)
    }

    pub fn with_base_url(base_url: &str, token: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("jgh/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(transport)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            http,
        })
    }
}

impl WorklogStore for TempoClient {
    async fn log_work(&self, worklog: &NewWorklog) -> Result<u64> {
        tracing::debug!(
            issue_id = worklog.issue_id,
            seconds = worklog.time_spent_seconds,
            "tempo: log work"
        );
        let resp = self
            .http
            .post(format!("{}/worklogs", self.base_url))
            .bearer_auth(&self.token)
            .json(&json!({
                "authorAccountId": worklog.author_account_id,
                "issueId": worklog.issue_id,
                "timeSpentSeconds": worklog.time_spent_seconds,
                "startDate": worklog.start_date,
                "description": worklog.description,
            }))
            .send()
            .await
            .map_err(transport)?;
        let created: CreatedWorklog = check(resp).await?.json().await.map_err(transport)?;
        Ok(created.tempo_worklog_id)
    }

    async fn worklogs_for_issue(&self, key: &str) -> Result<Vec<Worklog>> {
        let resp = self
            .http
            .get(format!("{}/worklogs/issue/{key}", self.base_url))
            .bearer_auth(&self.token)
            .send()
            .await
            .map_err(transport)?;
        let page: WorklogPage = check(resp).await?.json().await.map_err(transport)?;
        tracing::debug!(key, count = page.results.len(), "tempo: worklogs");
        Ok(page.results)
    }
}

fn transport(err: reqwest::Error) -> JghError {
    JghError::remote(SERVICE, err.to_string())
}

async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or_else(|| status.to_string());
    Err(JghError::remote(SERVICE, message))
}

/// Tempo reports `{"errors": [{"message": ..}]}`; some gateways send a single object.
fn error_message(body: &str) -> Option<String> {
    let value: Value = serde_json::from_str(body).ok()?;
    let errors = value.get("errors")?;
    let first = match errors {
        Value::Array(items) => items.first()?,
        other => other,
    };
    first.get("message")?.as_str().map(str::to_string)
}
