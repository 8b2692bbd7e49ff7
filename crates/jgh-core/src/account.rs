//! Jira account id resolution, used by `setup` and `reconfigure`.

use crate::config::{Config, ConfigField};
use crate::jira::IssueTracker;

/// Look up the account id for `email`. Failures are logged and yield `None`
/// so a setup can still be saved without it.
pub async fn resolve_account_id<T: IssueTracker>(jira: &T, email: &str) -> Option<String> {
    match jira.find_account_id(email).await {
        Ok(id) => Some(id),
        Err(e) => {
            tracing::debug!(email, error = %e, "account id lookup failed");
            None
        }
    }
}

/// Fields `reconfigure` should prompt for: those `validate` flags, minus the
/// account id, which is refreshed through the API instead.
pub fn fields_to_prompt(cfg: &Config) -> Vec<ConfigField> {
    let mut fields = Vec::new();
    for warning in cfg.validate() {
        if warning.field != ConfigField::AccountId && !fields.contains(&warning.field) {
            fields.push(warning.field);
        }
    }
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JiraSettings;
    use crate::fake::FakeTracker;

    fn cfg() -> Config {
        Config {
            jira: JiraSettings {
                url: "https://jira.internal".into(),
                email: "dev@acme.io".into(),
                token: String::new(),
                project: "PROJ".into(),
                issue_type: "Task".into(),
                account_id: None,
            },
            display_name: None,
            tempo_token: None,
        }
    }

    #[test]
    fn prompts_for_flagged_fields_only() {
        assert_eq!(
            fields_to_prompt(&cfg()),
            vec![ConfigField::Url, ConfigField::Token, ConfigField::DisplayName]
        );
    }

    #[tokio::test]
    async fn lookup_failure_is_none() {
        let jira = FakeTracker::new().failing("find_account_id");
        assert_eq!(resolve_account_id(&jira, "dev@acme.io").await, None);

        let jira = FakeTracker::new().with_account_id("acc-9");
        assert_eq!(
            resolve_account_id(&jira, "dev@acme.io").await.as_deref(),
            Some("acc-9")
        );
    }
}
