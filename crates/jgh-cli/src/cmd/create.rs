use anyhow::Context;
use colored::Colorize;
use jgh_core::create::{create_linked_issue, CreateRequest};

use super::{block_on, jira_client, Ctx};
use crate::output::{self, print_json};

pub fn run(ctx: &Ctx, req: CreateRequest) -> anyhow::Result<()> {
    let cfg = ctx.load_config()?;
    let jira = jira_client(&cfg)?;
    let gh = ctx.gh()?;

    if !ctx.json {
        output::progress("Creating Jira and GitHub issues...");
    }
    let report = block_on(create_linked_issue(&cfg, &jira, &gh, &req))?
        .context("failed to create issue")?;

    if ctx.json {
        return print_json(&report);
    }

    for w in &report.warnings {
        output::warning(&format!("[{}] {}", w.tracker, w.message));
    }
    println!("{}", format!("🆗 Jira issue created: {}", report.jira.key).cyan());
    if let Some(priority) = report.priority {
        println!("{}", format!("🚨 Priority set to: {priority}").cyan());
    }
    if let (Some(status), true) = (&report.status, report.transitioned) {
        println!("{}", format!("🆗 Issue transitioned to \"{status}\"").cyan());
    }
    println!();
    println!("{}", format!("🔗 JIRA issue:     {}", report.jira.url).green());
    println!("{}", format!("🔗 GITHUB issue:   {}", report.github_url).green());
    if !report.labels.is_empty() {
        println!("{}", format!("🏷️  Applied labels: {}", report.labels.join(", ")).cyan());
    }
    if report.assigned {
        println!("{}", "👤 Assigned to you".cyan());
    }
    Ok(())
}
