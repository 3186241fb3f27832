use indexmap::IndexMap;
use regex::Regex;

use crate::error::DefinitionError;
use crate::schema::OneOrMany;

/// Numeric log severities carried by wrangled output lines, on the classic
/// logging ladder so a rule can say "promote this line to 40".
pub mod severity {
    pub const NOTSET: u8 = 0;
    pub const DEBUG: u8 = 10;
    pub const INFO: u8 = 20;
    pub const WARNING: u8 = 30;
    pub const ERROR: u8 = 40;
    pub const CRITICAL: u8 = 50;
}

/// Terminal verdict for one task run. Set at most once per run; reset
/// explicitly between runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RuntimeStatus {
    #[default]
    Unknown,
    Success,
    Failure,
}

impl RuntimeStatus {
    pub fn is_failure(self) -> bool {
        self == RuntimeStatus::Failure
    }
}

/// One classification action attached to a wrangler rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WranglerAction {
    /// Reassign the line's log severity.
    Severity(u8),
    /// Drop the line entirely.
    Suppress,
    /// Declare the run successful, unless a verdict was already reached.
    DeclareSuccess,
    /// Declare the run failed, unless a verdict was already reached.
    DeclareFailure,
}

impl WranglerAction {
    fn parse(token: &str) -> Option<WranglerAction> {
        use severity::*;
        let action = match token {
            "NOTSET" => WranglerAction::Severity(NOTSET),
            "DEBUG" => WranglerAction::Severity(DEBUG),
            "INFO" => WranglerAction::Severity(INFO),
            "WARNING" | "WARN" => WranglerAction::Severity(WARNING),
            "ERROR" => WranglerAction::Severity(ERROR),
            "CRITICAL" | "FATAL" => WranglerAction::Severity(CRITICAL),
            "SUPPRESS" => WranglerAction::Suppress,
            "DECLARE_SUCCESS" => WranglerAction::DeclareSuccess,
            "DECLARE_FAILURE" => WranglerAction::DeclareFailure,
            _ => return None,
        };
        Some(action)
    }
}

/// A compiled output-classification rule.
#[derive(Debug, Clone)]
pub struct WranglerRule {
    pub regex: Regex,
    pub replace: Option<String>,
    pub actions: Vec<WranglerAction>,
}

/// Compile `management.wranglers` into rules, in declaration order. A bad
/// regex or an unrecognized action token is a definition-time error.
pub fn compile_wranglers(
    cab: &str,
    wranglers: &IndexMap<String, OneOrMany>,
) -> Result<Vec<WranglerRule>, DefinitionError> {
    let mut rules = Vec::with_capacity(wranglers.len());
    for (pattern, actions) in wranglers {
        let regex = Regex::new(pattern).map_err(|source| DefinitionError::BadWranglerRegex {
            cab: cab.to_string(),
            pattern: pattern.clone(),
            source,
        })?;
        let mut replace = None;
        let mut parsed = Vec::new();
        for token in actions.as_slice() {
            if let Some(template) = token.strip_prefix("replace:") {
                // Several replace templates on one rule: the last one wins.
                replace = Some(template.to_string());
            } else if let Some(action) = WranglerAction::parse(token) {
                parsed.push(action);
            } else {
                return Err(DefinitionError::UnknownWranglerAction {
                    cab: cab.to_string(),
                    pattern: pattern.clone(),
                    action: token.clone(),
                });
            }
        }
        rules.push(WranglerRule {
            regex,
            replace,
            actions: parsed,
        });
    }
    Ok(rules)
}

/// Run one output line through the rule list. Rules fire in order and act
/// on the line as rewritten by earlier rules. Returns the final line
/// (`None` when suppressed) and its severity.
pub fn wrangle_line(
    rules: &[WranglerRule],
    status: &mut RuntimeStatus,
    line: &str,
    severity: u8,
) -> (Option<String>, u8) {
    let mut text = line.to_string();
    let mut severity = severity;
    let mut suppress = false;
    for rule in rules {
        if !rule.regex.is_match(&text) {
            continue;
        }
        if let Some(template) = &rule.replace {
            text = rule.regex.replace_all(&text, template.as_str()).into_owned();
        }
        for action in &rule.actions {
            match action {
                WranglerAction::Severity(level) => severity = *level,
                WranglerAction::Suppress => suppress = true,
                WranglerAction::DeclareFailure => {
                    if *status == RuntimeStatus::Unknown {
                        *status = RuntimeStatus::Failure;
                        text = format!("[FAILURE] {text}");
                        severity = severity::ERROR;
                    }
                }
                WranglerAction::DeclareSuccess => {
                    if *status == RuntimeStatus::Unknown {
                        *status = RuntimeStatus::Success;
                        text = format!("[SUCCESS] {text}");
                    }
                }
            }
        }
    }
    if suppress {
        (None, severity::NOTSET)
    } else {
        (Some(text), severity)
    }
}
