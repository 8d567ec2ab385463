//! Routing rules

use crate::core::LogLevel;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Logger name a rule applies to
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LoggerName {
    /// `*`: default for every logger
    Wildcard,
    Named(String),
}

impl LoggerName {
    pub const WILDCARD: &'static str = "*";

    pub fn is_wildcard(&self) -> bool {
        matches!(self, LoggerName::Wildcard)
    }

    /// Whether this names exactly `logger`
    pub fn names(&self, logger: &str) -> bool {
        match self {
            LoggerName::Named(name) => name == logger,
            LoggerName::Wildcard => false,
        }
    }
}

impl From<String> for LoggerName {
    fn from(name: String) -> Self {
        if name == Self::WILDCARD {
            LoggerName::Wildcard
        } else {
            LoggerName::Named(name)
        }
    }
}

impl From<&str> for LoggerName {
    fn from(name: &str) -> Self {
        LoggerName::from(name.to_string())
    }
}

impl From<LoggerName> for String {
    fn from(name: LoggerName) -> Self {
        match name {
            LoggerName::Wildcard => LoggerName::WILDCARD.to_string(),
            LoggerName::Named(name) => name,
        }
    }
}

impl fmt::Display for LoggerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggerName::Wildcard => f.write_str(Self::WILDCARD),
            LoggerName::Named(name) => f.write_str(name),
        }
    }
}

/// One declared routing rule
///
/// `output_mode` is a comma-separated list of target kind names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub logger_name: LoggerName,
    pub level: LogLevel,
    pub output_mode: String,
}

impl Rule {
    pub fn new(
        logger_name: impl Into<LoggerName>,
        level: LogLevel,
        output_mode: impl Into<String>,
    ) -> Self {
        Self {
            logger_name: logger_name.into(),
            level,
            output_mode: output_mode.into(),
        }
    }

    /// Individual output mode names, trimmed, empty entries skipped
    pub fn output_modes(&self) -> impl Iterator<Item = &str> {
        self.output_mode
            .split(',')
            .map(str::trim)
            .filter(|mode| !mode.is_empty())
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{{{}, {}, {}}}",
            self.logger_name,
            self.level.label(),
            self.output_mode
        )
    }
}

/// Stock rule set: console from info, file for debug and error
pub fn default_rules() -> Vec<Rule> {
    vec![
        Rule::new(LoggerName::Wildcard, LogLevel::Info, "console"),
        Rule::new(LoggerName::Wildcard, LogLevel::Debug, "file"),
        Rule::new(LoggerName::Wildcard, LogLevel::Error, "file"),
    ]
}
