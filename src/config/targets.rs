//! Target (output mode) configuration

use crate::core::{LoggerError, PrettyOptions, Result};
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kinds of output a rule can route to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Console,
    File,
    Remote,
    Elastic,
}

impl TargetKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TargetKind::Console => "console",
            TargetKind::File => "file",
            TargetKind::Remote => "remote",
            TargetKind::Elastic => "elastic",
        }
    }
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetKind {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "console" => Ok(TargetKind::Console),
            "file" => Ok(TargetKind::File),
            "remote" => Ok(TargetKind::Remote),
            "elastic" => Ok(TargetKind::Elastic),
            other => Err(LoggerError::unknown_output_mode(other)),
        }
    }
}

/// Pretty-print overrides declared in configuration
///
/// Unset keys keep the value of the base options they are applied to.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrettyConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub single_line: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub colorize: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level_first: Option<bool>,
    /// strftime pattern for the rendered time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translate_time: Option<String>,
    /// Comma-separated keys left out of the rendered body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore: Option<String>,
}

impl PrettyConfig {
    pub fn new(single_line: bool, colorize: bool) -> Self {
        Self {
            single_line: Some(single_line),
            colorize: Some(colorize),
            ..Self::default()
        }
    }

    /// Reject a `translate_time` pattern chrono cannot render
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` naming the offending pattern.
    pub fn validate(&self) -> Result<()> {
        match self.translate_time {
            Some(ref pattern) if !is_valid_strftime(pattern) => Err(LoggerError::config(
                "prettyConfig.translateTime",
                format!("invalid time pattern '{}'", pattern),
            )),
            _ => Ok(()),
        }
    }

    /// Overlay the declared keys onto `base`
    pub fn apply(&self, mut base: PrettyOptions) -> PrettyOptions {
        if let Some(single_line) = self.single_line {
            base.single_line = single_line;
        }
        if let Some(colorize) = self.colorize {
            base.colorize = colorize;
        }
        if let Some(level_first) = self.level_first {
            base.level_first = level_first;
        }
        if let Some(ref translate_time) = self.translate_time {
            base.translate_time = Some(translate_time.clone());
        }
        if let Some(ref ignore) = self.ignore {
            base.ignore = ignore
                .split(',')
                .map(str::trim)
                .filter(|key| !key.is_empty())
                .map(String::from)
                .collect();
        }
        base
    }
}

fn is_valid_strftime(pattern: &str) -> bool {
    !StrftimeItems::new(pattern).any(|item| matches!(item, Item::Error))
}

/// Size threshold of a rotating file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SizeLimit(pub u64);

impl FromStr for SizeLimit {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_lowercase();
        let (digits, multiplier) = match s.chars().last() {
            Some('k') => (&s[..s.len() - 1], 1024),
            Some('m') => (&s[..s.len() - 1], 1024 * 1024),
            Some('g') => (&s[..s.len() - 1], 1024 * 1024 * 1024),
            _ => (s.as_str(), 1),
        };
        let invalid = || LoggerError::config("file.size", format!("invalid size '{}'", s));
        digits
            .trim()
            .parse::<u64>()
            .map_err(|_| invalid())?
            .checked_mul(multiplier)
            .map(SizeLimit)
            .ok_or_else(|| LoggerError::config("file.size", format!("size '{}' is too large", s)))
    }
}

impl TryFrom<String> for SizeLimit {
    type Error = LoggerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<SizeLimit> for String {
    fn from(limit: SizeLimit) -> Self {
        limit.0.to_string()
    }
}

/// How many rotated files are kept
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Retention {
    /// Keep at most this many backups
    Count(usize),
    /// Delete backups older than this many days
    Days(u64),
}

impl FromStr for Retention {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let invalid = || LoggerError::config("file.maxLogs", format!("invalid retention '{}'", s));
        match s.strip_suffix(['d', 'D']) {
            Some(days) => days.trim().parse().map(Retention::Days).map_err(|_| invalid()),
            None => s.parse().map(Retention::Count).map_err(|_| invalid()),
        }
    }
}

impl TryFrom<String> for Retention {
    type Error = LoggerError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Retention> for String {
    fn from(retention: Retention) -> Self {
        match retention {
            Retention::Count(n) => n.to_string(),
            Retention::Days(n) => format!("{}d", n),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleTarget {
    #[serde(flatten)]
    pub pretty: PrettyConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileTarget {
    /// File name template, `%fileName%` and `%DATE%` are substituted
    pub file_name: String,
    pub ext: String,
    pub max_logs: Retention,
    /// Carried for completeness; rotation is size based only
    pub frequency: String,
    pub size: SizeLimit,
    /// day.js style pattern rendered into `%DATE%`
    pub date_format: String,
    pub compress: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pretty_config: Option<PrettyConfig>,
}

impl Default for FileTarget {
    fn default() -> Self {
        Self {
            file_name: "%fileName%-%DATE%".to_string(),
            ext: "log".to_string(),
            max_logs: Retention::Days(10),
            frequency: "24h".to_string(),
            size: SizeLimit(1024 * 1024),
            date_format: "YYYY-MM-DD".to_string(),
            compress: false,
            pretty_config: Some(PrettyConfig::new(false, false)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RemoteTarget {
    pub url: String,
    pub method: String,
    pub format: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pretty_config: Option<PrettyConfig>,
}

impl Default for RemoteTarget {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: "POST".to_string(),
            format: String::new(),
            pretty_config: Some(PrettyConfig::new(false, false)),
        }
    }
}

/// Maps a document field to a record key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMapping {
    pub field_name: String,
    pub value_index: String,
}

impl FieldMapping {
    pub fn new(field_name: impl Into<String>, value_index: impl Into<String>) -> Self {
        Self {
            field_name: field_name.into(),
            value_index: value_index.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ElasticTarget {
    pub uri: String,
    pub index_name: String,
    pub doc_type: String,
    pub fields: Vec<FieldMapping>,
}

impl Default for ElasticTarget {
    fn default() -> Self {
        Self {
            uri: String::new(),
            index_name: String::new(),
            doc_type: "log".to_string(),
            fields: vec![
                FieldMapping::new("level", "logLevel"),
                FieldMapping::new("details", "message"),
            ],
        }
    }
}

/// Declared targets; an absent entry makes its kind unusable in rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub console: Option<ConsoleTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<FileTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteTarget>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elastic: Option<ElasticTarget>,
}

impl TargetsConfig {
    /// No target declared
    pub fn empty() -> Self {
        Self {
            console: None,
            file: None,
            remote: None,
            elastic: None,
        }
    }

    pub fn is_declared(&self, kind: TargetKind) -> bool {
        match kind {
            TargetKind::Console => self.console.is_some(),
            TargetKind::File => self.file.is_some(),
            TargetKind::Remote => self.remote.is_some(),
            TargetKind::Elastic => self.elastic.is_some(),
        }
    }
}

impl Default for TargetsConfig {
    fn default() -> Self {
        Self {
            console: Some(ConsoleTarget {
                pretty: PrettyConfig::new(false, true),
            }),
            file: Some(FileTarget::default()),
            remote: Some(RemoteTarget::default()),
            elastic: Some(ElasticTarget::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LoggerConfig;

    #[test]
    fn test_size_limit_parsing() {
        assert_eq!("1m".parse::<SizeLimit>().unwrap(), SizeLimit(1024 * 1024));
        assert_eq!("512k".parse::<SizeLimit>().unwrap(), SizeLimit(512 * 1024));
        assert_eq!("2G".parse::<SizeLimit>().unwrap(), SizeLimit(2 * 1024 * 1024 * 1024));
        assert_eq!("4096".parse::<SizeLimit>().unwrap(), SizeLimit(4096));
        assert!("lots".parse::<SizeLimit>().is_err());
    }

    #[test]
    fn test_oversized_limit_is_config_error() {
        let err = "99999999999g".parse::<SizeLimit>().unwrap_err();
        assert!(err.is_config_error());
        let json = r#"{"targets":{"file":{"size":"99999999999g"}}}"#;
        assert!(LoggerConfig::from_json_str(json).is_err());
    }

    #[test]
    fn test_invalid_translate_time_is_rejected() {
        let config = PrettyConfig {
            translate_time: Some("%Q".to_string()),
            ..PrettyConfig::default()
        };
        assert!(config.validate().unwrap_err().is_config_error());

        let valid = PrettyConfig {
            translate_time: Some("%H:%M:%S".to_string()),
            ..PrettyConfig::default()
        };
        assert!(valid.validate().is_ok());
        assert!(PrettyConfig::default().validate().is_ok());
    }

    #[test]
    fn test_retention_parsing() {
        assert_eq!("10d".parse::<Retention>().unwrap(), Retention::Days(10));
        assert_eq!("7".parse::<Retention>().unwrap(), Retention::Count(7));
        assert!("ten".parse::<Retention>().is_err());
    }

    #[test]
    fn test_unknown_target_kind() {
        let err = "syslog".parse::<TargetKind>().unwrap_err();
        assert!(matches!(err, LoggerError::UnknownOutputMode { ref mode } if mode == "syslog"));
    }

    #[test]
    fn test_file_target_from_json() {
        let target: FileTarget = serde_json::from_str(
            r#"{
                "fileName": "%fileName%",
                "ext": "txt",
                "maxLogs": "3",
                "size": "10k",
                "prettyConfig": {"singleLine": true}
            }"#,
        )
        .unwrap();
        assert_eq!(target.ext, "txt");
        assert_eq!(target.max_logs, Retention::Count(3));
        assert_eq!(target.size, SizeLimit(10 * 1024));
        assert_eq!(target.date_format, "YYYY-MM-DD");
        assert_eq!(target.pretty_config.unwrap().single_line, Some(true));
    }

    #[test]
    fn test_pretty_config_overlay() {
        let config = PrettyConfig {
            colorize: Some(false),
            ignore: Some("pid, hostname".to_string()),
            ..PrettyConfig::default()
        };
        let options = config.apply(PrettyOptions::file_defaults());
        assert!(!options.colorize);
        assert_eq!(options.ignore, vec!["pid", "hostname"]);
        assert!(options.translate_time.is_some());
    }

    #[test]
    fn test_partial_targets_leave_others_undeclared() {
        let targets: TargetsConfig =
            serde_json::from_str(r#"{"console":{"colorize":false}}"#).unwrap();
        assert!(targets.is_declared(TargetKind::Console));
        assert!(!targets.is_declared(TargetKind::File));
        assert_eq!(targets.console.unwrap().pretty.colorize, Some(false));
    }
}
