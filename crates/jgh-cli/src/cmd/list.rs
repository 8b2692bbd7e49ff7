use anyhow::Context;
use colored::Colorize;
use jgh_core::report::list_issues;

use super::{block_on, jira_client, tempo_client, Ctx};
use crate::output::{self, print_json};

pub fn run(ctx: &Ctx, mine_only: bool) -> anyhow::Result<()> {
    let cfg = ctx.load_config()?;
    let jira = jira_client(&cfg)?;
    let gh = ctx.gh()?;
    let tempo = tempo_client(&cfg)?;

    if !ctx.json {
        output::progress("Fetching issues from Jira and GitHub...");
    }
    let report = block_on(list_issues(&cfg, &jira, &gh, tempo.as_ref(), mine_only))?
        .context("failed to list issues")?;

    if ctx.json {
        return print_json(&report);
    }

    if report.entries.is_empty() {
        let msg = if mine_only {
            "No issues assigned to you found."
        } else {
            "No open issues found."
        };
        println!("{}", msg.yellow());
        return Ok(());
    }

    let header = if mine_only { "📋 My Issues:" } else { "📋 Open Issues Status:" };
    println!("\n{}\n", header.cyan());
    for entry in &report.entries {
        println!("{}", output::list_line(entry, &report.me));
    }

    let s = report.summary;
    let footer = if mine_only {
        format!(
            "📊 My Issues: {} total ({} synced, {} Jira-only, {} GitHub-only)",
            s.total, s.synced, s.jira_only, s.github_only
        )
    } else {
        format!(
            "📊 Summary: {} synced, {} Jira-only, {} GitHub-only, {} assigned to me",
            s.synced, s.jira_only, s.github_only, s.assigned_to_me
        )
    };
    println!("\n{}", footer.dimmed());
    Ok(())
}
