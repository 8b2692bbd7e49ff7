pub mod config;
pub mod create;
pub mod details;
pub mod estimate;
pub mod list;
pub mod reconfigure;
pub mod setup;
pub mod time;
pub mod update;

use anyhow::Context;
use jgh_core::config::Config;
use jgh_core::github::GhCli;
use jgh_core::jira::JiraClient;
use jgh_core::paths;
use jgh_core::tempo::TempoClient;
use std::future::Future;
use std::path::PathBuf;

/// Global flags every command sees.
pub struct Ctx {
    pub config: Option<PathBuf>,
    pub repo: Option<String>,
    pub json: bool,
}

impl Ctx {
    pub fn config_path(&self) -> anyhow::Result<PathBuf> {
        Ok(paths::config_path(self.config.as_deref())?)
    }

    pub fn load_config(&self) -> anyhow::Result<Config> {
        let path = self.config_path()?;
        Config::load(&path).with_context(|| format!("failed to load {}", path.display()))
    }

    pub fn gh(&self) -> anyhow::Result<GhCli> {
        Ok(GhCli::locate(self.repo.clone())?)
    }
}

pub fn jira_client(cfg: &Config) -> anyhow::Result<JiraClient> {
    JiraClient::from_settings(&cfg.jira).context("failed to build Jira client")
}

/// Tempo client when a token is configured.
pub fn tempo_client(cfg: &Config) -> anyhow::Result<Option<TempoClient>> {
    cfg.tempo_token()
        .map(TempoClient::new)
        .transpose()
        .context("failed to build Tempo client")
}

/// Run one command's async body on a fresh runtime.
pub fn block_on<F: Future>(fut: F) -> anyhow::Result<F::Output> {
    let rt = tokio::runtime::Runtime::new().context("failed to start async runtime")?;
    Ok(rt.block_on(fut))
}
