use thiserror::Error;

#[derive(Debug, Error)]
pub enum JghError {
    #[error("not configured: run 'jgh setup' first")]
    NotConfigured,

    #[error("{service} request failed: {message}")]
    Remote {
        service: &'static str,
        message: String,
    },

    #[error("GitHub CLI (gh) is not installed. Please install it from https://cli.github.com/")]
    GhNotInstalled,

    #[error("{0}")]
    Validation(String),

    #[error("transition \"{status}\" not found. Available transitions: {}", available.join(", "))]
    TransitionNotFound {
        status: String,
        available: Vec<String>,
    },

    #[error("issue not found: {0}")]
    IssueNotFound(String),

    #[error("home directory not found: set HOME or JGH_CONFIG")]
    HomeNotFound,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl JghError {
    pub fn remote(service: &'static str, message: impl Into<String>) -> Self {
        JghError::Remote {
            service,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, JghError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transition_not_found_lists_available_names() {
        let err = JghError::TransitionNotFound {
            status: "Shipped".into(),
            available: vec!["To Do".into(), "In Progress".into()],
        };
        assert_eq!(
            err.to_string(),
            "transition \"Shipped\" not found. Available transitions: To Do, In Progress"
        );
    }

    #[test]
    fn remote_error_names_the_service() {
        let err = JghError::remote("Jira", "Issue does not exist");
        assert_eq!(err.to_string(), "Jira request failed: Issue does not exist");
    }
}
