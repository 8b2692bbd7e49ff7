use crate::error::{JghError, Result};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

pub const TEMPO_URL_ENV: &str = "JGH_TEMPO_URL";

pub const CONFIG_DIR: &str = ".config/jgh";
pub const CONFIG_FILE: &str = "config.yaml";

pub const DEFAULT_TEMPO_URL: &str = "https://api.tempo.io/4";

/// Resolve the config file location.
///
/// Priority:
/// 1. `--config` flag / `JGH_CONFIG` env var (passed in as `explicit`)
/// 2. `~/.config/jgh/config.yaml`
pub fn config_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(p) = explicit {
        return Ok(p.to_path_buf());
    }
    let home = home::home_dir().ok_or(JghError::HomeNotFound)?;
    Ok(user_config_path(&home))
}

pub fn user_config_path(home: &Path) -> PathBuf {
    home.join(CONFIG_DIR).join(CONFIG_FILE)
}

/// Tempo base URL, overridable for self-hosted proxies and tests.
pub fn tempo_base_url() -> String {
    std::env::var(TEMPO_URL_ENV)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TEMPO_URL.to_string())
}

/// Jira browse link for an issue key.
pub fn browse_url(base: &str, key: &str) -> String {
    format!("{}/browse/{key}", base.trim_end_matches('/'))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_wins() {
        let p = Path::new("/tmp/custom/jgh.yaml");
        assert_eq!(config_path(Some(p)).unwrap(), PathBuf::from("/tmp/custom/jgh.yaml"));
    }

    #[test]
    fn user_config_lives_under_dot_config() {
        assert_eq!(
            user_config_path(Path::new("/home/dev")),
            PathBuf::from("/home/dev/.config/jgh/config.yaml")
        );
    }

    #[test]
    fn browse_url_ignores_trailing_slash() {
        assert_eq!(
            browse_url("https://acme.atlassian.net/", "PROJ-7"),
            "https://acme.atlassian.net/browse/PROJ-7"
        );
        assert_eq!(
            browse_url("https://acme.atlassian.net", "PROJ-7"),
            "https://acme.atlassian.net/browse/PROJ-7"
        );
    }
}
