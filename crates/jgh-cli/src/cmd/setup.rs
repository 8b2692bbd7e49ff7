use anyhow::Context;
use colored::Colorize;
use jgh_core::account;
use jgh_core::config::{Config, ConfigField, JiraSettings};

use super::{block_on, jira_client, Ctx};
use crate::prompt;

pub fn run(ctx: &Ctx) -> anyhow::Result<()> {
    let path = ctx.config_path()?;
    println!("{}", "Configure jgh".bold());

    let url = prompt::ask(ConfigField::Url, None)?;
    let email = prompt::ask(ConfigField::Email, None)?;
    let token = prompt::ask(ConfigField::Token, None)?;
    let project = prompt::ask(ConfigField::Project, None)?;
    let issue_type = prompt::ask(ConfigField::IssueType, None)?;
    let display_name = prompt::ask(ConfigField::DisplayName, None)?;
    let tempo_token = prompt::ask_tempo_token()?;

    let mut cfg = Config {
        jira: JiraSettings {
            url: url.trim().trim_end_matches('/').to_string(),
            email: email.trim().to_string(),
            token: token.trim().to_string(),
            project: project.trim().to_uppercase(),
            issue_type,
            account_id: None,
        },
        display_name: Some(display_name.trim().to_string()),
        tempo_token,
    };

    println!("{}", "⌛ Looking up your Jira account id...".yellow());
    let jira = jira_client(&cfg)?;
    cfg.jira.account_id = block_on(account::resolve_account_id(&jira, &cfg.jira.email))?;

    cfg.save(&path)
        .with_context(|| format!("failed to write {}", path.display()))?;

    match cfg.account_id() {
        Some(id) => println!("{}", format!("✅ Configuration saved (account id {id})").green()),
        None => println!(
            "{}",
            "⚠️  Configuration saved without account ID. You can run setup again to retry."
                .yellow()
        ),
    }
    Ok(())
}
