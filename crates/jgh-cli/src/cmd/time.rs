use anyhow::Context;
use colored::Colorize;
use jgh_core::duration::{format_seconds, DurationStyle};
use jgh_core::timelog::{log_time, prepare_worklog, TimeRequest};
use jgh_core::JghError;

use super::{block_on, jira_client, tempo_client, Ctx};
use crate::output::{self, print_json};

pub fn run(ctx: &Ctx, req: TimeRequest) -> anyhow::Result<()> {
    let cfg = ctx.load_config()?;
    // Local checks first so a missing token never builds clients.
    prepare_worklog(&cfg, &req)?;

    let jira = jira_client(&cfg)?;
    let tempo = tempo_client(&cfg)?.ok_or_else(|| {
        JghError::Validation("Tempo token not configured. Run 'jgh setup' to add one.".into())
    })?;

    if !ctx.json {
        output::progress(&format!("Logging {} to {}...", req.duration, req.key.to_uppercase()));
    }
    let logged = block_on(log_time(&cfg, &jira, &tempo, &req))?.context("failed to log time")?;

    if ctx.json {
        return print_json(&logged);
    }
    println!(
        "{}",
        format!(
            "🕒 Logged {} on {} ({})",
            format_seconds(logged.seconds, DurationStyle::Spaced),
            logged.key,
            logged.date
        )
        .cyan()
    );
    println!("Worklog ID: {}", logged.worklog_id);
    Ok(())
}
