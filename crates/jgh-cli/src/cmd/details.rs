use anyhow::Context;
use colored::Colorize;
use jgh_core::report::{issue_details, TimeInfo};

use super::{block_on, jira_client, tempo_client, Ctx};
use crate::output::{self, print_json};

pub fn run(ctx: &Ctx, key: &str) -> anyhow::Result<()> {
    let cfg = ctx.load_config()?;
    let jira = jira_client(&cfg)?;
    let gh = ctx.gh()?;
    let tempo = tempo_client(&cfg)?;
    let key = key.to_uppercase();

    if !ctx.json {
        output::progress(&format!("Fetching details for {key}..."));
    }
    let details = block_on(issue_details(&cfg, &jira, &gh, tempo.as_ref(), &key))?
        .with_context(|| format!("failed to load {key}"))?;

    if ctx.json {
        return print_json(&details);
    }

    let issue = &details.jira;
    println!("{}", format!("\n📋 Issue Details: {key}\n").blue());
    println!("Title: {}", issue.summary);
    println!("Status: {}", issue.status);
    println!("Assignee: {}", issue.assignee.as_deref().unwrap_or("Unassigned"));
    if !issue.labels.is_empty() {
        println!("Labels: {}", issue.labels.join(", "));
    }
    println!("Jira URL: {}", issue.url);

    match &details.github {
        Some(gh) => {
            println!("{}", "\n🔗 Linked GitHub Issue:".green());
            println!("  Number: #{}", gh.number);
            println!("  State: {}", gh.state);
            println!("  URL: {}", gh.url);
            if !gh.labels.is_empty() {
                println!("  Labels: {}", gh.labels.join(", "));
            }
        }
        None => println!("{}", "\n⚠️  No linked GitHub issue found".yellow()),
    }

    match &details.time {
        TimeInfo::Loaded(summary) => {
            println!("{}", "\n⏱️  Time Tracking:".blue());
            for line in output::time_lines(summary) {
                println!("  {line}");
            }
        }
        TimeInfo::Failed(_) => output::warning("Could not fetch time tracking data"),
        TimeInfo::Unavailable => {
            println!(
                "{}",
                "\n⚠️  Tempo token not configured - time tracking unavailable".dimmed()
            );
        }
    }
    Ok(())
}
