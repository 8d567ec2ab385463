//! Router configuration
//!
//! Rules and targets are read once at startup. `LoggerConfig::default()`
//! is the stock configuration; a `loggerConfig.json` found at the project
//! root replaces its top-level keys.

pub mod rules;
pub mod targets;

pub use rules::{default_rules, LoggerName, Rule};
pub use targets::{
    ConsoleTarget, ElasticTarget, FieldMapping, FileTarget, PrettyConfig, RemoteTarget, Retention,
    SizeLimit, TargetKind, TargetsConfig,
};

use crate::core::{LoggerError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File name looked up by [`LoggerConfig::load`]
pub const CONFIG_FILE_NAME: &str = "loggerConfig.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggerConfig {
    pub log_dir: PathBuf,
    pub targets: TargetsConfig,
    pub rules: Vec<Rule>,
    /// Loggers built without any binding
    #[serde(alias = "disableLogger", alias = "disabledLogger")]
    pub disabled_loggers: Vec<String>,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("logs"),
            targets: TargetsConfig::default(),
            rules: default_rules(),
            disabled_loggers: Vec::new(),
        }
    }
}

impl LoggerConfig {
    /// Parse a complete configuration; missing keys take their defaults
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            LoggerError::io_operation(
                "reading logger configuration",
                path.display().to_string(),
                e,
            )
        })?;
        Self::from_json_str(&content)
    }

    /// Replace every top-level key present in `json`, keep the others
    pub fn merge_override(&self, json: &str) -> Result<Self> {
        let overrides: serde_json::Value = serde_json::from_str(json)?;
        let serde_json::Value::Object(overrides) = overrides else {
            return Err(LoggerError::config(
                "loggerConfig",
                "override must be a JSON object",
            ));
        };

        let mut merged = serde_json::to_value(self)?;
        if let serde_json::Value::Object(ref mut base) = merged {
            for (key, value) in overrides {
                let key = match key.as_str() {
                    "disableLogger" | "disabledLogger" => "disabledLoggers".to_string(),
                    _ => key,
                };
                base.insert(key, value);
            }
        }
        Ok(serde_json::from_value(merged)?)
    }

    /// Stock configuration overridden by `<root>/loggerConfig.json` when present
    pub fn load(root: impl AsRef<Path>) -> Result<Self> {
        let path = root.as_ref().join(CONFIG_FILE_NAME);
        if !path.is_file() {
            eprintln!(
                "[WARN] {} not found in {}, using default logger configuration",
                CONFIG_FILE_NAME,
                root.as_ref().display()
            );
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path).map_err(|e| {
            LoggerError::io_operation(
                "reading logger configuration",
                path.display().to_string(),
                e,
            )
        })?;
        Self::default().merge_override(&content)
    }

    #[must_use]
    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = log_dir.into();
        self
    }

    #[must_use]
    pub fn with_rules(mut self, rules: Vec<Rule>) -> Self {
        self.rules = rules;
        self
    }

    #[must_use]
    pub fn with_targets(mut self, targets: TargetsConfig) -> Self {
        self.targets = targets;
        self
    }

    #[must_use]
    pub fn with_disabled_logger(mut self, name: impl Into<String>) -> Self {
        self.disabled_loggers.push(name.into());
        self
    }

    pub fn is_disabled(&self, name: &str) -> bool {
        self.disabled_loggers.iter().any(|disabled| disabled == name)
    }
}
