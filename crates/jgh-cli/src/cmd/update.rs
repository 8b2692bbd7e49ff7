use anyhow::Context;
use colored::Colorize;
use jgh_core::command;
use jgh_core::update::{update_issue, UpdateOutcome};

use super::{block_on, jira_client, Ctx};
use crate::output::{self, print_json};

pub fn run(ctx: &Ctx, key: &str, update: &str) -> anyhow::Result<()> {
    let cfg = ctx.load_config()?;

    // No actionable tokens: answer without gh or the network.
    let outcome = if command::parse(update).has_updates() {
        let jira = jira_client(&cfg)?;
        let gh = ctx.gh()?;
        if !ctx.json {
            output::progress(&format!("Updating issue {}...", key.to_uppercase()));
        }
        block_on(update_issue(&cfg, &jira, &gh, key, update))?
            .with_context(|| format!("failed to update {}", key.to_uppercase()))?
    } else {
        UpdateOutcome::NoUpdates
    };

    if ctx.json {
        return print_json(&outcome);
    }

    match outcome {
        UpdateOutcome::NoUpdates => {
            println!("{}", "No updates specified.".yellow());
            println!("Use (Status), !priority, +label, -label, @me or @unassign.");
        }
        UpdateOutcome::Updated(report) => {
            output::print_steps(&report.steps);
            println!("{}", format!("✅ Updated {}", report.key).green());
        }
    }
    Ok(())
}
