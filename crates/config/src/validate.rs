//! Startup validation of a parsed [`BotConfig`].
//!
//! Errors are bootstrap-fatal; warnings and infos are only logged.

use std::collections::HashSet;

use crate::schema::BotConfig;

/// Severity level for a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warning => write!(f, "warning"),
            Self::Info => write!(f, "info"),
        }
    }
}

/// A single validation diagnostic.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    pub severity: Severity,
    /// Dotted path, e.g. "contexts.timeout_secs"
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationResult {
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .count()
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
    }

    fn push(&mut self, severity: Severity, path: &str, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            severity,
            path: path.to_string(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &BotConfig) -> ValidationResult {
    let mut result = ValidationResult::default();

    if config.bot_name.as_deref().is_none_or(|n| n.trim().is_empty()) {
        result.push(Severity::Error, "bot_name", "missing bot name");
    }

    match config.token() {
        None => result.push(Severity::Error, "slack_token", "missing platform token"),
        Some(token) if token.contains("${") => result.push(
            Severity::Error,
            "slack_token",
            "token references an environment variable that is not set",
        ),
        Some(_) => {},
    }

    let trigger = &config.command_trigger;
    if trigger.is_empty() {
        result.push(
            Severity::Warning,
            "command_trigger",
            "empty command trigger, command routing is disabled",
        );
    } else if trigger.chars().any(char::is_whitespace) {
        result.push(
            Severity::Error,
            "command_trigger",
            "command trigger must not contain whitespace",
        );
    }

    if config.contexts.timeout_secs == 0 {
        result.push(
            Severity::Error,
            "contexts.timeout_secs",
            "context timeout must be at least one second",
        );
    }
    if config.contexts.sweep_interval_secs == 0 {
        result.push(
            Severity::Error,
            "contexts.sweep_interval_secs",
            "sweep interval must be at least one second",
        );
    }

    let mut seen = HashSet::new();
    for name in &config.enabled_plugins {
        if !seen.insert(name.as_str()) {
            result.push(
                Severity::Warning,
                "enabled_plugins",
                format!("plugin '{name}' is listed more than once"),
            );
        }
    }

    if config.mention_plugin.trim().is_empty() {
        result.push(
            Severity::Info,
            "mention_plugin",
            "no mention plugin configured, mentions are ignored",
        );
    }

    if config.db.memory.persistence && config.db.memory.db_path.is_none() {
        result.push(
            Severity::Info,
            "db.memory.db_path",
            "no db_path given, the store file goes to the data directory",
        );
    }

    result
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, secrecy::Secret};

    fn valid() -> BotConfig {
        BotConfig {
            bot_name: Some("cibot".into()),
            slack_token: Some(Secret::new("xoxb-1".into())),
            ..BotConfig::default()
        }
    }

    #[test]
    fn minimal_config_is_valid() {
        let result = validate(&valid());
        assert!(!result.has_errors(), "{:?}", result.diagnostics);
    }

    #[test]
    fn unresolved_token_placeholder_is_fatal() {
        let cfg = BotConfig {
            slack_token: Some(Secret::new("${SLACK_TOKEN}".into())),
            ..valid()
        };
        let result = validate(&cfg);
        assert_eq!(result.errors().next().unwrap().path, "slack_token");
    }

    #[test]
    fn blank_token_counts_as_missing() {
        let cfg = BotConfig {
            slack_token: Some(Secret::new("  ".into())),
            ..valid()
        };
        assert!(validate(&cfg).has_errors());
    }

    #[test]
    fn zero_durations_are_rejected() {
        let mut cfg = valid();
        cfg.contexts.timeout_secs = 0;
        cfg.contexts.sweep_interval_secs = 0;
        assert_eq!(validate(&cfg).count(Severity::Error), 2);
    }

    #[test]
    fn duplicate_plugins_warn() {
        let cfg = BotConfig {
            enabled_plugins: vec!["a".into(), "a".into()],
            ..valid()
        };
        let result = validate(&cfg);
        assert!(!result.has_errors());
        assert_eq!(result.count(Severity::Warning), 1);
    }

    #[test]
    fn whitespace_trigger_is_fatal() {
        let cfg = BotConfig {
            command_trigger: "! ".into(),
            ..valid()
        };
        assert!(validate(&cfg).has_errors());
    }
}
