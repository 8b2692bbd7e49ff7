//! Jira Cloud REST v3.
//!
//! [`IssueTracker`] is the seam the workflows use; [`JiraClient`] is the real
//! implementation and `crate::fake::FakeTracker` the in-process one.

use reqwest::{Client, Response, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::BTreeMap;

use crate::config::JiraSettings;
use crate::error::{JghError, Result};
use crate::paths;
use crate::types::{CreatedIssue, JiraIssue, NewIssue, Priority, TimeTracking, Transition};

const SERVICE: &str = "Jira";
const PAGE_SIZE: &str = "1000";
const SEARCH_FIELDS: &str = "key,summary,status,assignee,labels";

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

#[allow(async_fn_in_trait)]
pub trait IssueTracker {
    /// Account id of the first user matching `email`.
    async fn find_account_id(&self, email: &str) -> Result<String>;

    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue>;

    async fn transitions(&self, key: &str) -> Result<Vec<Transition>>;

    async fn apply_transition(&self, key: &str, transition_id: &str) -> Result<()>;

    /// Move `key` through the transition named `status` (case-insensitive).
    async fn transition_issue(&self, key: &str, status: &str) -> Result<Transition> {
        let available = self.transitions(key).await?;
        let chosen = select_transition(&available, status)?.clone();
        self.apply_transition(key, &chosen.id).await?;
        Ok(chosen)
    }

    /// Every unresolved issue in `project`.
    async fn search_open_issues(&self, project: &str) -> Result<Vec<JiraIssue>>;

    async fn issue_labels(&self, key: &str) -> Result<Vec<String>>;

    async fn set_priority(&self, key: &str, priority: Priority) -> Result<()>;

    async fn set_labels(&self, key: &str, labels: &[String]) -> Result<()>;

    /// `None` clears the assignee.
    async fn set_assignee(&self, key: &str, account_id: Option<&str>) -> Result<()>;

    async fn time_tracking(&self, key: &str) -> Result<TimeTracking>;

    async fn set_original_estimate(&self, key: &str, estimate: &str) -> Result<()>;

    /// Numeric id behind an issue key.
    async fn issue_id(&self, key: &str) -> Result<u64>;
}

pub fn select_transition<'a>(available: &'a [Transition], status: &str) -> Result<&'a Transition> {
    let wanted = status.to_lowercase();
    available
        .iter()
        .find(|t| t.name.to_lowercase() == wanted)
        .ok_or_else(|| JghError::TransitionNotFound {
            status: status.to_string(),
            available: available.iter().map(|t| t.name.clone()).collect(),
        })
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default, rename = "errorMessages")]
    error_messages: Vec<String>,
    #[serde(default)]
    errors: BTreeMap<String, String>,
}

/// Labels arrive as plain strings, older payloads use `{ "name": .. }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum LabelValue {
    Name(String),
    Object { name: String },
}

impl LabelValue {
    fn into_name(self) -> String {
        match self {
            LabelValue::Name(n) | LabelValue::Object { name: n } => n,
        }
    }
}

fn label_names(values: Option<Vec<LabelValue>>) -> Vec<String> {
    values
        .unwrap_or_default()
        .into_iter()
        .map(LabelValue::into_name)
        .collect()
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRecord {
    account_id: String,
}

#[derive(Debug, Deserialize)]
struct CreateResponse {
    id: String,
    key: String,
}

#[derive(Debug, Deserialize)]
struct TransitionsResponse {
    #[serde(default)]
    transitions: Vec<Transition>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchPage {
    #[serde(default)]
    issues: Vec<SearchIssue>,
    #[serde(default)]
    next_page_token: Option<String>,
    #[serde(default)]
    is_last: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct SearchIssue {
    key: String,
    fields: SearchFields,
}

#[derive(Debug, Deserialize)]
struct SearchFields {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    status: Option<NamedField>,
    #[serde(default)]
    assignee: Option<AssigneeField>,
    #[serde(default)]
    labels: Option<Vec<LabelValue>>,
}

#[derive(Debug, Deserialize)]
struct NamedField {
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssigneeField {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IssueEnvelope<F> {
    #[serde(default)]
    id: Option<String>,
    fields: Option<F>,
}

#[derive(Debug, Default, Deserialize)]
struct LabelsField {
    #[serde(default)]
    labels: Option<Vec<LabelValue>>,
}

#[derive(Debug, Default, Deserialize)]
struct TimeTrackingField {
    #[serde(default)]
    timetracking: Option<TimeTracking>,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct JiraClient {
    base_url: String,
    email: String,
    token: String,
    http: Client,
}

impl JiraClient {
    pub fn new(base_url: &str, email: &str, token: &str) -> Result<Self> {
        let http = Client::builder()
            .user_agent(concat!("jgh/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(transport)?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            email: email.to_string(),
            token: token.to_string(),
            http,
        })
    }

    pub fn from_settings(settings: &JiraSettings) -> Result<Self> {
        Self::new(&settings.url, &settings.email, &settings.token)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .get(self.url(path))
            .basic_auth(&self.email, Some(&self.token))
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .post(self.url(path))
            .basic_auth(&self.email, Some(&self.token))
    }

    fn put(&self, path: &str) -> reqwest::RequestBuilder {
        self.http
            .put(self.url(path))
            .basic_auth(&self.email, Some(&self.token))
    }

    async fn update_fields(&self, key: &str, fields: Value) -> Result<()> {
        tracing::debug!(key, %fields, "jira: update fields");
        let resp = self
            .put(&format!("/rest/api/3/issue/{key}"))
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(transport)?;
        check(resp).await?;
        Ok(())
    }

    async fn issue_fields<F>(&self, key: &str, fields: &str) -> Result<IssueEnvelope<F>>
    where
        F: serde::de::DeserializeOwned,
    {
        let resp = self
            .get(&format!("/rest/api/3/issue/{key}"))
            .query(&[("fields", fields)])
            .send()
            .await
            .map_err(transport)?;
        let resp = check(resp).await?;
        resp.json().await.map_err(transport)
    }

    fn to_issue(&self, raw: SearchIssue) -> JiraIssue {
        JiraIssue {
            url: paths::browse_url(&self.base_url, &raw.key),
            key: raw.key,
            summary: raw.fields.summary,
            status: raw.fields.status.map(|s| s.name).unwrap_or_default(),
            assignee: raw.fields.assignee.and_then(|a| a.display_name),
            labels: label_names(raw.fields.labels),
        }
    }
}

impl IssueTracker for JiraClient {
    async fn find_account_id(&self, email: &str) -> Result<String> {
        tracing::debug!(email, "jira: user search");
        let resp = self
            .get("/rest/api/3/user/search")
            .query(&[("query", email)])
            .send()
            .await
            .map_err(transport)?;
        let users: Vec<UserRecord> = check(resp).await?.json().await.map_err(transport)?;
        users
            .into_iter()
            .next()
            .map(|u| u.account_id)
            .ok_or_else(|| JghError::remote(SERVICE, format!("no user found for {email}")))
    }

    async fn create_issue(&self, issue: &NewIssue) -> Result<CreatedIssue> {
        let mut fields = json!({
            "project": { "key": issue.project },
            "summary": issue.summary,
            "description": adf_paragraph(if issue.description.is_empty() {
                &issue.summary
            } else {
                &issue.description
            }),
            "issuetype": { "name": issue.issue_type },
        });
        if let Some(account_id) = &issue.assignee {
            fields["assignee"] = json!({ "accountId": account_id });
        }
        if let Some(priority) = issue.priority {
            fields["priority"] = json!({ "name": priority.as_str() });
        }

        tracing::debug!(project = %issue.project, "jira: create issue");
        let resp = self
            .post("/rest/api/3/issue")
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(transport)?;
        let created: CreateResponse = check(resp).await?.json().await.map_err(transport)?;
        Ok(CreatedIssue {
            url: paths::browse_url(&self.base_url, &created.key),
            key: created.key,
            id: created.id,
        })
    }

    async fn transitions(&self, key: &str) -> Result<Vec<Transition>> {
        let resp = self
            .get(&format!("/rest/api/3/issue/{key}/transitions"))
            .send()
            .await
            .map_err(transport)?;
        let body: TransitionsResponse = check(resp).await?.json().await.map_err(transport)?;
        Ok(body.transitions)
    }

    async fn apply_transition(&self, key: &str, transition_id: &str) -> Result<()> {
        tracing::debug!(key, transition_id, "jira: transition");
        let resp = self
            .post(&format!("/rest/api/3/issue/{key}/transitions"))
            .json(&json!({ "transition": { "id": transition_id } }))
            .send()
            .await
            .map_err(transport)?;
        check(resp).await?;
        Ok(())
    }

    async fn search_open_issues(&self, project: &str) -> Result<Vec<JiraIssue>> {
        let jql = format!("project = {project} AND resolution = Unresolved");
        let mut issues = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut req = self.get("/rest/api/3/search/jql").query(&[
                ("jql", jql.as_str()),
                ("fields", SEARCH_FIELDS),
                ("maxResults", PAGE_SIZE),
            ]);
            if let Some(token) = &page_token {
                req = req.query(&[("nextPageToken", token.as_str())]);
            }
            let resp = req.send().await.map_err(transport)?;
            let page: SearchPage = check(resp).await?.json().await.map_err(transport)?;
            tracing::debug!(project, count = page.issues.len(), "jira: search page");

            let empty = page.issues.is_empty();
            issues.extend(page.issues.into_iter().map(|raw| self.to_issue(raw)));

            // An empty page or a repeated token would never advance.
            match page.next_page_token {
                Some(next)
                    if page.is_last != Some(true)
                        && !empty
                        && page_token.as_deref() != Some(next.as_str()) =>
                {
                    page_token = Some(next)
                }
                _ => break,
            }
        }
        Ok(issues)
    }

    async fn issue_labels(&self, key: &str) -> Result<Vec<String>> {
        let env: IssueEnvelope<LabelsField> = self.issue_fields(key, "labels").await?;
        Ok(label_names(env.fields.unwrap_or_default().labels))
    }

    async fn set_priority(&self, key: &str, priority: Priority) -> Result<()> {
        self.update_fields(key, json!({ "priority": { "name": priority.as_str() } }))
            .await
    }

    async fn set_labels(&self, key: &str, labels: &[String]) -> Result<()> {
        self.update_fields(key, json!({ "labels": labels })).await
    }

    async fn set_assignee(&self, key: &str, account_id: Option<&str>) -> Result<()> {
        let assignee = match account_id {
            Some(id) => json!({ "accountId": id }),
            None => Value::Null,
        };
        self.update_fields(key, json!({ "assignee": assignee })).await
    }

    async fn time_tracking(&self, key: &str) -> Result<TimeTracking> {
        let env: IssueEnvelope<TimeTrackingField> = self.issue_fields(key, "timetracking").await?;
        Ok(env
            .fields
            .and_then(|f| f.timetracking)
            .unwrap_or_default())
    }

    async fn set_original_estimate(&self, key: &str, estimate: &str) -> Result<()> {
        self.update_fields(
            key,
            json!({ "timetracking": { "originalEstimate": estimate } }),
        )
        .await
    }

    async fn issue_id(&self, key: &str) -> Result<u64> {
        let env: IssueEnvelope<Value> = self.issue_fields(key, "id").await?;
        env.id
            .as_deref()
            .and_then(|id| id.parse().ok())
            .ok_or_else(|| JghError::remote(SERVICE, format!("no numeric id returned for {key}")))
    }
}

/// Minimal Atlassian Document Format body: one paragraph of plain text.
fn adf_paragraph(text: &str) -> Value {
    json!({
        "type": "doc",
        "version": 1,
        "content": [{
            "type": "paragraph",
            "content": [{ "type": "text", "text": text }],
        }],
    })
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

fn transport(err: reqwest::Error) -> JghError {
    JghError::remote(SERVICE, err.to_string())
}

async fn check(resp: Response) -> Result<Response> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(JghError::remote(SERVICE, error_message(status, &body)))
}

/// Jira's own message when the body carries one, else the status line.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorBody>(body) {
        if let Some(first) = parsed.error_messages.into_iter().next() {
            return first;
        }
        if !parsed.errors.is_empty() {
            return parsed
                .errors
                .into_iter()
                .map(|(field, msg)| format!("{field}: {msg}"))
                .collect::<Vec<_>>()
                .join("; ");
        }
    }
    let body = body.trim();
    if body.is_empty() {
        status.to_string()
    } else {
        format!("{status}: {body}")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn client(server: &Server) -> JiraClient {
        JiraClient::new(&server.url(), "dev@acme.io", "secret").unwrap()
    }

    fn t(id: &str, name: &str) -> Transition {
        Transition {
            id: id.into(),
            name: name.into(),
        }
    }

    #[test]
    fn select_transition_is_case_insensitive() {
        let available = vec![t("11", "To Do"), t("21", "In Progress")];
        assert_eq!(select_transition(&available, "in progress").unwrap().id, "21");
        match select_transition(&available, "Shipped").unwrap_err() {
            JghError::TransitionNotFound { status, available } => {
                assert_eq!(status, "Shipped");
                assert_eq!(available, vec!["To Do", "In Progress"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn error_message_prefers_jira_text() {
        let body = r#"{"errorMessages":["Issue does not exist or you do not have permission to see it."],"errors":{}}"#;
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, body),
            "Issue does not exist or you do not have permission to see it."
        );
        let body = r#"{"errorMessages":[],"errors":{"summary":"required"}}"#;
        assert_eq!(error_message(StatusCode::BAD_REQUEST, body), "summary: required");
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, ""),
            "502 Bad Gateway"
        );
    }

    #[test]
    fn labels_accept_strings_and_objects() {
        let values: Vec<LabelValue> =
            serde_json::from_str(r#"["backend", {"name": "ui"}]"#).unwrap();
        assert_eq!(label_names(Some(values)), vec!["backend", "ui"]);
        assert!(label_names(None).is_empty());
    }

    #[tokio::test]
    async fn search_follows_page_tokens() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("GET", "/rest/api/3/search/jql")
            .match_query(Matcher::Regex("maxResults=1000$".into()))
            .match_header("authorization", Matcher::Regex("^Basic ".into()))
            .with_status(200)
            .with_body(
                r#"{"issues":[{"key":"PROJ-1","fields":{"summary":"First","status":{"name":"To Do"},"assignee":{"displayName":"Dana Scully"},"labels":["backend"]}}],"nextPageToken":"tok2","isLast":false}"#,
            )
            .create_async()
            .await;
        let second = server
            .mock("GET", "/rest/api/3/search/jql")
            .match_query(Matcher::Regex("nextPageToken=tok2$".into()))
            .with_status(200)
            .with_body(
                r#"{"issues":[{"key":"PROJ-2","fields":{"summary":"Second","status":{"name":"Done"},"assignee":null}}],"isLast":true}"#,
            )
            .create_async()
            .await;

        let issues = client(&server).search_open_issues("PROJ").await.unwrap();

        first.assert_async().await;
        second.assert_async().await;
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].key, "PROJ-1");
        assert_eq!(issues[0].assignee.as_deref(), Some("Dana Scully"));
        assert_eq!(issues[0].labels, vec!["backend"]);
        assert_eq!(issues[0].url, format!("{}/browse/PROJ-1", server.url()));
        assert_eq!(issues[1].status, "Done");
        assert!(issues[1].assignee.is_none());
        assert!(issues[1].labels.is_empty());
    }

    #[tokio::test]
    async fn search_stops_on_repeated_token() {
        let mut server = Server::new_async().await;
        let first = server
            .mock("GET", "/rest/api/3/search/jql")
            .match_query(Matcher::Regex("maxResults=1000$".into()))
            .with_status(200)
            .with_body(
                r#"{"issues":[{"key":"PROJ-1","fields":{"summary":"First","status":{"name":"To Do"}}}],"nextPageToken":"stuck"}"#,
            )
            .expect(1)
            .create_async()
            .await;
        let repeat = server
            .mock("GET", "/rest/api/3/search/jql")
            .match_query(Matcher::Regex("nextPageToken=stuck$".into()))
            .with_status(200)
            .with_body(
                r#"{"issues":[{"key":"PROJ-2","fields":{"summary":"Second","status":{"name":"To Do"}}}],"nextPageToken":"stuck"}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let issues = client(&server).search_open_issues("PROJ").await.unwrap();

        first.assert_async().await;
        repeat.assert_async().await;
        assert_eq!(issues.len(), 2);
    }

    #[tokio::test]
    async fn search_stops_on_empty_page() {
        let mut server = Server::new_async().await;
        let only = server
            .mock("GET", "/rest/api/3/search/jql")
            .match_query(Matcher::Regex("maxResults=1000$".into()))
            .with_status(200)
            .with_body(r#"{"issues":[],"nextPageToken":"more"}"#)
            .expect(1)
            .create_async()
            .await;

        let issues = client(&server).search_open_issues("PROJ").await.unwrap();

        only.assert_async().await;
        assert!(issues.is_empty());
    }

    #[tokio::test]
    async fn search_failure_carries_jira_message() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/rest/api/3/search/jql")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(r#"{"errorMessages":["The value 'NOPE' does not exist for the field 'project'."]}"#)
            .create_async()
            .await;

        let err = client(&server).search_open_issues("NOPE").await.unwrap_err();
        assert_eq!(
            err.to_string(),
            "Jira request failed: The value 'NOPE' does not exist for the field 'project'."
        );
    }

    #[tokio::test]
    async fn create_sends_adf_description_and_optional_fields() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/rest/api/3/issue")
            .match_body(Matcher::AllOf(vec![
                Matcher::PartialJson(json!({
                    "fields": {
                        "project": { "key": "PROJ" },
                        "summary": "Fix login",
                        "description": { "type": "doc", "version": 1 },
                        "issuetype": { "name": "Bug" },
                        "assignee": { "accountId": "acc-1" },
                        "priority": { "name": "High" }
                    }
                })),
                Matcher::Regex(r#""text":"Fix login""#.into()),
            ]))
            .with_status(201)
            .with_body(r#"{"id":"10042","key":"PROJ-42"}"#)
            .create_async()
            .await;

        let created = client(&server)
            .create_issue(&NewIssue {
                project: "PROJ".into(),
                summary: "Fix login".into(),
                description: String::new(),
                issue_type: "Bug".into(),
                assignee: Some("acc-1".into()),
                priority: Some(Priority::High),
            })
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(created.key, "PROJ-42");
        assert_eq!(created.id, "10042");
        assert_eq!(created.url, format!("{}/browse/PROJ-42", server.url()));
    }

    #[tokio::test]
    async fn transition_posts_matching_id() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/rest/api/3/issue/PROJ-1/transitions")
            .with_status(200)
            .with_body(r#"{"transitions":[{"id":"11","name":"To Do"},{"id":"31","name":"Done"}]}"#)
            .create_async()
            .await;
        let post = server
            .mock("POST", "/rest/api/3/issue/PROJ-1/transitions")
            .match_body(Matcher::Json(json!({ "transition": { "id": "31" } })))
            .with_status(204)
            .create_async()
            .await;

        let chosen = client(&server).transition_issue("PROJ-1", "done").await.unwrap();
        post.assert_async().await;
        assert_eq!(chosen.name, "Done");
    }

    #[tokio::test]
    async fn unassign_sends_null_assignee() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("PUT", "/rest/api/3/issue/PROJ-3")
            .match_body(Matcher::Json(json!({ "fields": { "assignee": null } })))
            .with_status(204)
            .create_async()
            .await;

        client(&server).set_assignee("PROJ-3", None).await.unwrap();
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn time_tracking_and_issue_id() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/rest/api/3/issue/PROJ-5")
            .match_query(Matcher::UrlEncoded("fields".into(), "timetracking".into()))
            .with_status(200)
            .with_body(r#"{"id":"10005","fields":{"timetracking":{"originalEstimate":"2h","originalEstimateSeconds":7200}}}"#)
            .create_async()
            .await;
        server
            .mock("GET", "/rest/api/3/issue/PROJ-5")
            .match_query(Matcher::UrlEncoded("fields".into(), "id".into()))
            .with_status(200)
            .with_body(r#"{"id":"10005","key":"PROJ-5"}"#)
            .create_async()
            .await;

        let jira = client(&server);
        let tt = jira.time_tracking("PROJ-5").await.unwrap();
        assert_eq!(tt.estimate_seconds(), 7200);
        assert_eq!(jira.issue_id("PROJ-5").await.unwrap(), 10005);
    }

    #[tokio::test]
    async fn account_lookup_takes_first_user() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/rest/api/3/user/search")
            .match_query(Matcher::UrlEncoded("query".into(), "dev@acme.io".into()))
            .with_status(200)
            .with_body(r#"[{"accountId":"acc-9","displayName":"Dev"}]"#)
            .create_async()
            .await;

        let jira = client(&server);
        assert_eq!(jira.find_account_id("dev@acme.io").await.unwrap(), "acc-9");
    }

    #[tokio::test]
    async fn account_lookup_with_no_match_fails() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/rest/api/3/user/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let err = client(&server).find_account_id("ghost@acme.io").await.unwrap_err();
        assert!(matches!(err, JghError::Remote { service: "Jira", .. }));
    }
}
