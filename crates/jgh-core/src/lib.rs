pub mod account;
pub mod command;
pub mod config;
pub mod create;
pub mod duration;
pub mod error;
pub mod fake;
pub mod github;
pub mod io;
pub mod jira;
pub mod paths;
pub mod report;
pub mod sync;
pub mod tempo;
pub mod timelog;
pub mod types;
pub mod update;

pub use error::{JghError, Result};
