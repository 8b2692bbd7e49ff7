//! Free-form command strings: `Fix login @me +backend -triage (In Progress) !high`.
//!
//! Parsing is an ordered table of extraction rules. Each rule sees the residual
//! text left by the rules before it, records what it matched into the
//! [`ParsedCommand`], and removes the match. Whatever survives every rule is the
//! clean title.
//!
//! | order | token        | reach | effect                         |
//! |-------|--------------|-------|--------------------------------|
//! | 1     | `@me`        | all   | `assign_me = true`             |
//! | 2     | `@unassign`  | all   | `unassign = true`              |
//! | 3     | `+word`      | all   | push onto `add_labels`         |
//! | 4     | `-word`      | all   | push onto `remove_labels`      |
//! | 5     | `(text)`     | first | `status = text`                |
//! | 6     | `!priority`  | first | `priority` (asap/high/medium/low) |
//!
//! Because the status group is lifted out whole before the priority rule runs,
//! a `!high` written inside the parentheses stays part of the status text.

use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use crate::types::Priority;

// ---------------------------------------------------------------------------
// ParsedCommand
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedCommand {
    pub clean_title: String,
    pub assign_me: bool,
    pub unassign: bool,
    pub add_labels: Vec<String>,
    pub remove_labels: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
}

impl ParsedCommand {
    /// True when the string asked for at least one change to an existing issue.
    pub fn has_updates(&self) -> bool {
        self.status.is_some()
            || self.priority.is_some()
            || !self.add_labels.is_empty()
            || !self.remove_labels.is_empty()
            || self.assign_me
            || self.unassign
    }
}

// ---------------------------------------------------------------------------
// Rules
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reach {
    All,
    First,
}

struct Rule {
    id: &'static str,
    pattern: fn() -> &'static Regex,
    reach: Reach,
    record: fn(&mut ParsedCommand, &Captures),
}

impl Rule {
    fn apply(&self, residual: &str, parsed: &mut ParsedCommand) -> String {
        let re = (self.pattern)();
        match self.reach {
            Reach::All => {
                let mut matched = false;
                for caps in re.captures_iter(residual) {
                    tracing::trace!(rule = self.id, token = &caps[0], "command token");
                    (self.record)(parsed, &caps);
                    matched = true;
                }
                if !matched {
                    return residual.to_string();
                }
                re.replace_all(residual, "").trim().to_string()
            }
            Reach::First => match re.captures(residual) {
                Some(caps) => {
                    tracing::trace!(rule = self.id, token = &caps[0], "command token");
                    (self.record)(parsed, &caps);
                    re.replace(residual, "").trim().to_string()
                }
                None => residual.to_string(),
            },
        }
    }
}

static ASSIGN_RE: OnceLock<Regex> = OnceLock::new();
static UNASSIGN_RE: OnceLock<Regex> = OnceLock::new();
static ADD_LABEL_RE: OnceLock<Regex> = OnceLock::new();
static REMOVE_LABEL_RE: OnceLock<Regex> = OnceLock::new();
static STATUS_RE: OnceLock<Regex> = OnceLock::new();
static PRIORITY_RE: OnceLock<Regex> = OnceLock::new();

// Label names are ASCII word characters.
fn assign_re() -> &'static Regex {
    ASSIGN_RE.get_or_init(|| Regex::new(r"@me").unwrap())
}

fn unassign_re() -> &'static Regex {
    UNASSIGN_RE.get_or_init(|| Regex::new(r"@unassign").unwrap())
}

fn add_label_re() -> &'static Regex {
    ADD_LABEL_RE.get_or_init(|| Regex::new(r"\+([0-9A-Za-z_]+)").unwrap())
}

fn remove_label_re() -> &'static Regex {
    REMOVE_LABEL_RE.get_or_init(|| Regex::new(r"-([0-9A-Za-z_]+)").unwrap())
}

fn status_re() -> &'static Regex {
    STATUS_RE.get_or_init(|| Regex::new(r"\(([^)]+)\)").unwrap())
}

fn priority_re() -> &'static Regex {
    PRIORITY_RE.get_or_init(|| Regex::new(r"(?i)!(asap|high|medium|low)").unwrap())
}

const RULES: &[Rule] = &[
    Rule {
        id: "assign",
        pattern: assign_re,
        reach: Reach::All,
        record: |p, _| p.assign_me = true,
    },
    Rule {
        id: "unassign",
        pattern: unassign_re,
        reach: Reach::All,
        record: |p, _| p.unassign = true,
    },
    Rule {
        id: "add-label",
        pattern: add_label_re,
        reach: Reach::All,
        record: |p, caps| p.add_labels.push(caps[1].to_string()),
    },
    Rule {
        id: "remove-label",
        pattern: remove_label_re,
        reach: Reach::All,
        record: |p, caps| p.remove_labels.push(caps[1].to_string()),
    },
    Rule {
        id: "status",
        pattern: status_re,
        reach: Reach::First,
        record: |p, caps| p.status = Some(caps[1].to_string()),
    },
    Rule {
        id: "priority",
        pattern: priority_re,
        reach: Reach::First,
        record: |p, caps| p.priority = Priority::from_token(&caps[1]),
    },
];

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Parse a title or update string. Never fails; unknown text stays in the title.
pub fn parse(input: &str) -> ParsedCommand {
    let mut parsed = ParsedCommand::default();
    let residual = RULES
        .iter()
        .fold(input.to_string(), |residual, rule| rule.apply(&residual, &mut parsed));
    parsed.clean_title = residual.trim().to_string();
    parsed
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_command_string() {
        let p = parse("Fix bug @me +urgent -docs (In Progress) !asap");
        assert_eq!(p.clean_title, "Fix bug");
        assert!(p.assign_me);
        assert!(!p.unassign);
        assert_eq!(p.add_labels, vec!["urgent"]);
        assert_eq!(p.remove_labels, vec!["docs"]);
        assert_eq!(p.status.as_deref(), Some("In Progress"));
        assert_eq!(p.priority, Some(Priority::Express));
    }

    #[test]
    fn plain_title_is_untouched() {
        let p = parse("Just a title");
        assert_eq!(
            p,
            ParsedCommand {
                clean_title: "Just a title".into(),
                ..Default::default()
            }
        );
        assert!(!p.has_updates());
    }

    #[test]
    fn tokens_may_appear_in_any_order() {
        let p = parse("!low (Done) -old +new @unassign Refactor");
        assert_eq!(p.clean_title, "Refactor");
        assert!(p.unassign);
        assert_eq!(p.add_labels, vec!["new"]);
        assert_eq!(p.remove_labels, vec!["old"]);
        assert_eq!(p.status.as_deref(), Some("Done"));
        assert_eq!(p.priority, Some(Priority::Low));
    }

    #[test]
    fn assign_and_unassign_can_both_be_set() {
        let p = parse("@me @unassign");
        assert!(p.assign_me);
        assert!(p.unassign);
        assert_eq!(p.clean_title, "");
    }

    #[test]
    fn every_self_assign_occurrence_is_removed() {
        let p = parse("@me review @me");
        assert!(p.assign_me);
        assert_eq!(p.clean_title, "review");
    }

    #[test]
    fn duplicate_labels_are_kept_in_order() {
        let p = parse("+ui +api +ui");
        assert_eq!(p.add_labels, vec!["ui", "api", "ui"]);
    }

    #[test]
    fn only_first_status_group_is_taken() {
        let p = parse("Ship it (In Review) (later)");
        assert_eq!(p.status.as_deref(), Some("In Review"));
        assert_eq!(p.clean_title, "Ship it  (later)");
    }

    #[test]
    fn priority_inside_status_group_stays_in_status() {
        let p = parse("Task (Blocked !high)");
        assert_eq!(p.status.as_deref(), Some("Blocked !high"));
        assert_eq!(p.priority, None);
        assert_eq!(p.clean_title, "Task");
    }

    #[test]
    fn only_first_priority_is_taken() {
        let p = parse("Deploy !HIGH !low");
        assert_eq!(p.priority, Some(Priority::High));
        assert_eq!(p.clean_title, "Deploy  !low");
    }

    #[test]
    fn unknown_bang_words_stay_in_title() {
        let p = parse("Deploy !urgent");
        assert_eq!(p.priority, None);
        assert_eq!(p.clean_title, "Deploy !urgent");
    }

    #[test]
    fn inner_whitespace_is_preserved() {
        let p = parse("Fix @me login");
        assert_eq!(p.clean_title, "Fix  login");
    }

    #[test]
    fn hyphenated_words_lose_their_tail_as_remove_label() {
        let p = parse("re-enable cache");
        assert_eq!(p.remove_labels, vec!["enable"]);
        assert_eq!(p.clean_title, "re cache");
    }

    #[test]
    fn hyphen_inside_status_is_taken_by_remove_label_first() {
        let p = parse("(In-Progress)");
        assert_eq!(p.remove_labels, vec!["Progress"]);
        assert_eq!(p.status.as_deref(), Some("In"));
    }

    #[test]
    fn bare_sigils_are_left_alone() {
        let p = parse("a + b - c ( ) !");
        assert!(p.add_labels.is_empty());
        assert!(p.remove_labels.is_empty());
        assert_eq!(p.status.as_deref(), Some(" "));
        assert_eq!(p.clean_title, "a + b - c  !");
    }

    #[test]
    fn reparsing_the_clean_title_finds_nothing_new() {
        for input in [
            "Fix bug @me +urgent -docs (In Progress) !asap",
            "Plain words only",
            "+a +b -c @unassign (Done) !medium tail",
        ] {
            let first = parse(input);
            let second = parse(&first.clean_title);
            assert_eq!(second.clean_title, first.clean_title, "input: {input}");
            assert!(!second.has_updates(), "input: {input}");
        }
    }

    #[test]
    fn has_updates_detects_each_token_kind() {
        for input in ["@me", "@unassign", "+x", "-x", "(Done)", "!low"] {
            assert!(parse(input).has_updates(), "expected update for {input}");
        }
    }
}
