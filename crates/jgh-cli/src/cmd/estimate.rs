use anyhow::Context;
use colored::Colorize;
use jgh_core::timelog::set_estimate;

use super::{block_on, jira_client, Ctx};
use crate::output::{self, print_json};

pub fn run(ctx: &Ctx, key: &str, duration: &str) -> anyhow::Result<()> {
    let cfg = ctx.load_config()?;
    let jira = jira_client(&cfg)?;

    if !ctx.json {
        output::progress(&format!("Setting estimate for {}...", key.to_uppercase()));
    }
    let set = block_on(set_estimate(&jira, key, duration))?.context("failed to set estimate")?;

    if ctx.json {
        return print_json(&set);
    }
    println!("{}", "✅ Estimate set successfully!".green());
    println!("{}", format!("📊 Estimated {} for {}", set.estimate, set.key).cyan());
    Ok(())
}
