use anyhow::Context;
use colored::Colorize;
use jgh_core::account;
use jgh_core::config::ConfigField;

use super::{block_on, jira_client, Ctx};
use crate::prompt;

pub fn run(ctx: &Ctx) -> anyhow::Result<()> {
    let path = ctx.config_path()?;
    let mut cfg = ctx.load_config()?;
    let mut changed: Vec<ConfigField> = Vec::new();

    let flagged = account::fields_to_prompt(&cfg);
    if !flagged.is_empty() {
        println!("{}", "Some settings are missing or look wrong:".yellow());
        for warning in cfg.validate() {
            if flagged.contains(&warning.field) {
                println!("  - {}", warning.message);
            }
        }
    }
    for field in flagged {
        let current = cfg.field(field).map(str::to_string);
        let answer = prompt::ask(field, current.as_deref())?;
        if cfg.set_field(field, &answer) {
            changed.push(field);
        }
    }

    let refresh = prompt::confirm(
        "Refresh your Jira account id?",
        cfg.account_id().is_none(),
    )?;
    if refresh {
        println!("{}", "⌛ Looking up your Jira account id...".yellow());
        let jira = jira_client(&cfg)?;
        match block_on(account::resolve_account_id(&jira, &cfg.jira.email))? {
            Some(id) => {
                if cfg.set_field(ConfigField::AccountId, &id) {
                    changed.push(ConfigField::AccountId);
                }
            }
            None => println!("{}", "⚠️  Could not resolve your account id".yellow()),
        }
    }

    if changed.is_empty() {
        println!("No changes made.");
        return Ok(());
    }

    cfg.save(&path)
        .with_context(|| format!("failed to write {}", path.display()))?;
    let names: Vec<&str> = changed.iter().map(|f| f.label()).collect();
    println!("{}", format!("✅ Updated: {}", names.join(", ")).green());
    Ok(())
}
