use colored::Colorize;
use jgh_core::config::{mask_secret, WarnLevel};

use super::Ctx;
use crate::output::print_json;

const NOT_SET: &str = "Not set";

pub fn run(ctx: &Ctx) -> anyhow::Result<()> {
    let cfg = ctx.load_config()?;
    let warnings = cfg.validate();
    let jira = &cfg.jira;

    if ctx.json {
        let value = serde_json::json!({
            "path": ctx.config_path()?.display().to_string(),
            "jira": {
                "url": jira.url,
                "email": jira.email,
                "project": jira.project,
                "issue_type": jira.issue_type,
                "token": mask_secret(&jira.token),
                "account_id": jira.account_id,
            },
            "display_name": cfg.display_name,
            "tempo_configured": cfg.tempo_token().is_some(),
            "warnings": warnings,
        });
        return print_json(&value);
    }

    println!("{}", "Current configuration:".blue());
    println!("Jira URL: {}", jira.url);
    println!("Jira Email: {}", jira.email);
    println!("Jira Project: {}", jira.project);
    println!("Default Issue Type: {}", jira.issue_type);
    println!("API Token: {}", mask_secret(&jira.token));
    println!("Account ID: {}", cfg.account_id().unwrap_or(NOT_SET));
    println!(
        "Jira Display Name: {}",
        cfg.display_name.as_deref().unwrap_or(NOT_SET)
    );
    println!(
        "Tempo Token: {}",
        if cfg.tempo_token().is_some() { "Configured" } else { NOT_SET }
    );

    if !warnings.is_empty() {
        println!();
        for w in &warnings {
            let line = format!("[{}] {}", w.field, w.message);
            match w.level {
                WarnLevel::Warning => println!("{}", line.yellow()),
                WarnLevel::Error => println!("{}", line.red()),
            }
        }
        println!("Run 'jgh reconfigure' to fix these.");
    }
    Ok(())
}
