use crate::error::{JghError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub field: ConfigField,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

/// Settings a user can be prompted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfigField {
    Url,
    Email,
    Token,
    Project,
    IssueType,
    DisplayName,
    AccountId,
}

impl ConfigField {
    pub fn as_str(self) -> &'static str {
        match self {
            ConfigField::Url => "url",
            ConfigField::Email => "email",
            ConfigField::Token => "token",
            ConfigField::Project => "project",
            ConfigField::IssueType => "issue_type",
            ConfigField::DisplayName => "display_name",
            ConfigField::AccountId => "account_id",
        }
    }

    /// Human name, as listed after a reconfigure.
    pub fn label(self) -> &'static str {
        match self {
            ConfigField::Url => "Jira URL",
            ConfigField::Email => "Jira Email",
            ConfigField::Token => "API Token",
            ConfigField::Project => "Project",
            ConfigField::IssueType => "Issue Type",
            ConfigField::DisplayName => "Display Name",
            ConfigField::AccountId => "Account ID",
        }
    }
}

impl fmt::Display for ConfigField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub const ISSUE_TYPES: &[&str] = &["Task", "Bug", "Story", "Epic"];
pub const DEFAULT_ISSUE_TYPE: &str = "Task";

// ---------------------------------------------------------------------------
// Stored file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JiraSettings {
    pub url: String,
    pub email: String,
    pub token: String,
    pub project: String,
    #[serde(default = "default_issue_type")]
    pub issue_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub account_id: Option<String>,
}

fn default_issue_type() -> String {
    DEFAULT_ISSUE_TYPE.to_string()
}

/// What lives on disk. Every section is optional so a half-finished setup
/// still reads back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jira: Option<JiraSettings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo_token: Option<String>,
}

impl ConfigFile {
    /// Read the store; a missing file is an empty store.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)?;
        if data.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&data)?)
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        tracing::debug!(path = %path.display(), "writing config");
        crate::io::atomic_write_private(path, data.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

/// Settings for one invocation. Built by [`Config::load`] and passed down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub jira: JiraSettings,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tempo_token: Option<String>,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let file = ConfigFile::read(path)?;
        Self::try_from(file)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        ConfigFile::from(self.clone()).write(path)
    }

    /// Tempo token, if one was configured and is non-blank.
    pub fn tempo_token(&self) -> Option<&str> {
        self.tempo_token.as_deref().filter(|t| !t.trim().is_empty())
    }

    pub fn account_id(&self) -> Option<&str> {
        self.jira.account_id.as_deref().filter(|a| !a.is_empty())
    }

    pub fn field(&self, field: ConfigField) -> Option<&str> {
        let jira = &self.jira;
        match field {
            ConfigField::Url => Some(jira.url.as_str()),
            ConfigField::Email => Some(jira.email.as_str()),
            ConfigField::Token => Some(jira.token.as_str()),
            ConfigField::Project => Some(jira.project.as_str()),
            ConfigField::IssueType => Some(jira.issue_type.as_str()),
            ConfigField::DisplayName => self.display_name.as_deref(),
            ConfigField::AccountId => jira.account_id.as_deref(),
        }
    }

    /// Apply an answer to a prompt. Blank answers keep the current value.
    /// Returns whether the stored value changed.
    pub fn set_field(&mut self, field: ConfigField, value: &str) -> bool {
        let value = value.trim();
        if value.is_empty() || self.field(field) == Some(value) {
            return false;
        }
        let value = value.to_string();
        let jira = &mut self.jira;
        match field {
            ConfigField::Url => jira.url = value.trim_end_matches('/').to_string(),
            ConfigField::Email => jira.email = value,
            ConfigField::Token => jira.token = value,
            ConfigField::Project => jira.project = value.to_uppercase(),
            ConfigField::IssueType => jira.issue_type = value,
            ConfigField::DisplayName => self.display_name = Some(value),
            ConfigField::AccountId => jira.account_id = Some(value),
        }
        true
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let jira = &self.jira;

        let mut push = |level, field, message: String| {
            warnings.push(ConfigWarning {
                level,
                field,
                message,
            })
        };

        if jira.url.trim().is_empty() {
            push(WarnLevel::Error, ConfigField::Url, "Jira URL is empty".into());
        } else if !jira.url.contains("atlassian.net") {
            push(
                WarnLevel::Warning,
                ConfigField::Url,
                format!("Jira URL '{}' does not look like an atlassian.net site", jira.url),
            );
        }

        if !jira.email.contains('@') {
            push(
                WarnLevel::Error,
                ConfigField::Email,
                format!("email '{}' is not a valid address", jira.email),
            );
        }

        if jira.token.trim().is_empty() {
            push(WarnLevel::Error, ConfigField::Token, "API token is empty".into());
        }
        if jira.project.trim().is_empty() {
            push(WarnLevel::Error, ConfigField::Project, "project key is empty".into());
        }
        if jira.issue_type.trim().is_empty() {
            push(
                WarnLevel::Warning,
                ConfigField::IssueType,
                "default issue type is empty".into(),
            );
        }

        if self
            .display_name
            .as_deref()
            .map_or(true, |n| n.trim().is_empty())
        {
            push(
                WarnLevel::Warning,
                ConfigField::DisplayName,
                "display name is not set; 'list mine' matches on 'me'".into(),
            );
        }

        if self.account_id().is_none() {
            push(
                WarnLevel::Warning,
                ConfigField::AccountId,
                "Jira account id is not set; assignment and time logging need it".into(),
            );
        }

        warnings
    }
}

impl TryFrom<ConfigFile> for Config {
    type Error = JghError;

    fn try_from(file: ConfigFile) -> Result<Self> {
        let jira = file.jira.ok_or(JghError::NotConfigured)?;
        Ok(Config {
            jira,
            display_name: file.display_name,
            tempo_token: file.tempo_token,
        })
    }
}

impl From<Config> for ConfigFile {
    fn from(cfg: Config) -> Self {
        ConfigFile {
            jira: Some(cfg.jira),
            display_name: cfg.display_name,
            tempo_token: cfg.tempo_token,
        }
    }
}

/// One `*` per character.
pub fn mask_secret(secret: &str) -> String {
    "*".repeat(secret.chars().count())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Config {
        Config {
            jira: JiraSettings {
                url: "https://acme.atlassian.net".into(),
                email: "dev@acme.io".into(),
                token: "secret-token".into(),
                project: "PROJ".into(),
                issue_type: "Task".into(),
                account_id: Some("acc-123".into()),
            },
            display_name: Some("Dana".into()),
            tempo_token: None,
        }
    }

    #[test]
    fn load_without_file_is_not_configured() {
        let dir = TempDir::new().unwrap();
        let err = Config::load(&dir.path().join("missing.yaml")).unwrap_err();
        assert!(matches!(err, JghError::NotConfigured));
    }

    #[test]
    fn load_without_jira_section_is_not_configured() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "display_name: Dana\n").unwrap();
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, JghError::NotConfigured));
    }

    #[test]
    fn save_then_load() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("jgh/config.yaml");
        let cfg = sample();
        cfg.save(&path).unwrap();
        assert_eq!(Config::load(&path).unwrap(), cfg);
    }

    #[test]
    fn issue_type_defaults_to_task() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(
            &path,
            "jira:\n  url: https://acme.atlassian.net\n  email: a@b.c\n  token: t\n  project: P\n",
        )
        .unwrap();
        let cfg = Config::load(&path).unwrap();
        assert_eq!(cfg.jira.issue_type, "Task");
        assert!(cfg.jira.account_id.is_none());
    }

    #[test]
    fn empty_optional_fields_are_not_serialized() {
        let yaml = serde_yaml::to_string(&ConfigFile::from(sample())).unwrap();
        assert!(!yaml.contains("tempo_token"));
        assert!(yaml.contains("account_id: acc-123"));
    }

    #[test]
    fn complete_config_has_no_warnings() {
        assert!(sample().validate().is_empty());
    }

    #[test]
    fn validate_flags_each_bad_field() {
        let mut cfg = sample();
        cfg.jira.url = "https://jira.example.com".into();
        cfg.jira.email = "not-an-email".into();
        cfg.jira.token = "".into();
        cfg.display_name = None;
        cfg.jira.account_id = None;

        let fields: Vec<ConfigField> = cfg.validate().iter().map(|w| w.field).collect();
        assert_eq!(
            fields,
            vec![
                ConfigField::Url,
                ConfigField::Email,
                ConfigField::Token,
                ConfigField::DisplayName,
                ConfigField::AccountId,
            ]
        );
    }

    #[test]
    fn blank_tempo_token_counts_as_missing() {
        let mut cfg = sample();
        cfg.tempo_token = Some("  ".into());
        assert!(cfg.tempo_token().is_none());
        cfg.tempo_token = Some("tempo".into());
        assert_eq!(cfg.tempo_token(), Some("tempo"));
    }

    #[test]
    fn set_field_keeps_current_value_on_blank() {
        let mut cfg = sample();
        assert!(!cfg.set_field(ConfigField::Email, "   "));
        assert!(!cfg.set_field(ConfigField::Project, "PROJ"));
        assert_eq!(cfg.jira.email, "dev@acme.io");

        assert!(cfg.set_field(ConfigField::Project, "ops"));
        assert_eq!(cfg.jira.project, "OPS");
        assert!(cfg.set_field(ConfigField::Url, "https://new.atlassian.net/"));
        assert_eq!(cfg.jira.url, "https://new.atlassian.net");
        assert!(cfg.set_field(ConfigField::DisplayName, "Robin"));
        assert_eq!(cfg.field(ConfigField::DisplayName), Some("Robin"));
        assert_eq!(ConfigField::Token.label(), "API Token");
    }

    #[test]
    fn mask_hides_every_character() {
        assert_eq!(mask_secret("abc"), "***");
        assert_eq!(mask_secret(""), "");
    }
}
