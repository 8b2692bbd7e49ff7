//! Interactive prompts for `setup` and `reconfigure`.

use anyhow::Context;
use inquire::validator::Validation;
use inquire::{Confirm, CustomUserError, Password, PasswordDisplayMode, Select, Text};
use jgh_core::config::{ConfigField, ISSUE_TYPES};

/// Why an answer for `field` is unacceptable.
pub fn check(field: ConfigField, input: &str) -> Result<(), &'static str> {
    let input = input.trim();
    match field {
        ConfigField::Url if !input.contains("atlassian.net") => {
            Err("Please enter a valid Atlassian URL (https://<site>.atlassian.net)")
        }
        ConfigField::Email if !input.contains('@') => Err("Please enter a valid email address"),
        _ if input.is_empty() => Err("This value is required"),
        _ => Ok(()),
    }
}

fn question(field: ConfigField) -> &'static str {
    match field {
        ConfigField::Url => "Jira URL:",
        ConfigField::Email => "Jira email:",
        ConfigField::Token => "Jira API token:",
        ConfigField::Project => "Jira project key:",
        ConfigField::IssueType => "Default issue type:",
        ConfigField::DisplayName => "Your Jira display name:",
        ConfigField::AccountId => "Jira account id:",
    }
}

/// Ask for one setting. With `current`, a blank answer is accepted and
/// returned as-is so the caller keeps the old value.
pub fn ask(field: ConfigField, current: Option<&str>) -> anyhow::Result<String> {
    let keep_blank = current.is_some();
    let validator = move |input: &str| -> Result<Validation, CustomUserError> {
        if keep_blank && input.trim().is_empty() {
            return Ok(Validation::Valid);
        }
        Ok(match check(field, input) {
            Ok(()) => Validation::Valid,
            Err(msg) => Validation::Invalid(msg.into()),
        })
    };

    let answer = match field {
        ConfigField::Token => {
            let mut password = Password::new(question(field))
                .without_confirmation()
                .with_display_mode(PasswordDisplayMode::Masked)
                .with_validator(validator);
            if keep_blank {
                password = password.with_help_message("leave blank to keep the current token");
            }
            password.prompt()
        }
        ConfigField::IssueType => {
            let start = current
                .and_then(|c| ISSUE_TYPES.iter().position(|t| *t == c))
                .unwrap_or(0);
            Select::new(question(field), ISSUE_TYPES.to_vec())
                .with_starting_cursor(start)
                .prompt()
                .map(str::to_string)
        }
        _ => {
            let mut text = Text::new(question(field)).with_validator(validator);
            if let Some(current) = current {
                text = text.with_placeholder(current);
            }
            text.prompt()
        }
    };
    answer.with_context(|| format!("failed to read {field}"))
}

/// Optional Tempo token; blank means none.
pub fn ask_tempo_token() -> anyhow::Result<Option<String>> {
    let token = Password::new("Tempo API token (optional, for time tracking):")
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .prompt()
        .context("failed to read Tempo token")?;
    Ok(Some(token.trim().to_string()).filter(|t| !t.is_empty()))
}

pub fn confirm(message: &str, default: bool) -> anyhow::Result<bool> {
    Confirm::new(message)
        .with_default(default)
        .prompt()
        .context("failed to read answer")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_must_be_atlassian() {
        assert!(check(ConfigField::Url, "https://acme.atlassian.net").is_ok());
        assert!(check(ConfigField::Url, "https://jira.acme.io").is_err());
    }

    #[test]
    fn email_needs_at_sign() {
        assert!(check(ConfigField::Email, "dev@acme.io").is_ok());
        assert!(check(ConfigField::Email, "dev").is_err());
    }

    #[test]
    fn other_fields_need_a_value() {
        assert!(check(ConfigField::Project, "  ").is_err());
        assert!(check(ConfigField::DisplayName, "Dana").is_ok());
        assert!(check(ConfigField::Token, "").is_err());
    }
}
