//! Per-logger shared state referenced by formatters
//!
//! A `LoggerInstance` is created once per logger name. Its shared bindings
//! (`pid`, `hostname`, `name`) are kept in serialized form, which the
//! dispatcher splices into every wire line, and are parsed into fields at
//! most once, the first time a formatter asks for them.

use super::log_context::{FieldValue, LogContext};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Default key of the message in rendered records
pub const DEFAULT_MESSAGE_KEY: &str = "message";

/// Transform applied to record fields before formatting
pub type LogFormatterFn = Arc<dyn Fn(LogContext) -> LogContext + Send + Sync>;
/// Transform applied to a single field value by key
pub type SerializerFn = Arc<dyn Fn(&FieldValue) -> FieldValue + Send + Sync>;
/// Transform applied to the whole merged mapping
pub type RedactFn = Arc<dyn Fn(LogContext) -> LogContext + Send + Sync>;

/// Formatting hooks attached to a logger instance
#[derive(Clone)]
pub struct LoggerHooks {
    pub log_formatter: Option<LogFormatterFn>,
    pub serializers: BTreeMap<String, SerializerFn>,
    pub redact: Option<RedactFn>,
    pub message_key: String,
}

impl Default for LoggerHooks {
    fn default() -> Self {
        Self {
            log_formatter: None,
            serializers: BTreeMap::new(),
            redact: None,
            message_key: DEFAULT_MESSAGE_KEY.to_string(),
        }
    }
}

impl fmt::Debug for LoggerHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggerHooks")
            .field("log_formatter", &self.log_formatter.is_some())
            .field("serializers", &self.serializers.keys().collect::<Vec<_>>())
            .field("redact", &self.redact.is_some())
            .field("message_key", &self.message_key)
            .finish()
    }
}

/// Shared, immutable state of one named logger
#[derive(Debug)]
pub struct LoggerInstance {
    name: String,
    chindings: String,
    parsed: OnceLock<LogContext>,
    hooks: LoggerHooks,
}

impl LoggerInstance {
    /// Create an instance with the process bindings (`pid`, `hostname`, `name`)
    pub fn new(name: impl Into<String>, hooks: LoggerHooks) -> Self {
        let name = name.into();
        let bindings = LogContext::new()
            .with_field("pid", std::process::id())
            .with_field("hostname", hostname())
            .with_field("name", name.as_str());
        Self::with_bindings(name, &bindings, hooks)
    }

    /// Create an instance with explicit shared bindings
    pub fn with_bindings(
        name: impl Into<String>,
        bindings: &LogContext,
        hooks: LoggerHooks,
    ) -> Self {
        Self {
            name: name.into(),
            chindings: serialize_chindings(bindings),
            parsed: OnceLock::new(),
            hooks,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Serialized shared bindings, without surrounding braces
    pub fn chindings(&self) -> &str {
        &self.chindings
    }

    pub fn hooks(&self) -> &LoggerHooks {
        &self.hooks
    }

    pub fn message_key(&self) -> &str {
        &self.hooks.message_key
    }

    /// Shared bindings as fields, parsed on first call and cached
    pub fn bindings(&self) -> &LogContext {
        self.parsed.get_or_init(|| {
            match serde_json::from_str::<LogContext>(&format!("{{{}}}", self.chindings)) {
                Ok(parsed) => parsed,
                Err(e) => {
                    eprintln!(
                        "[LOGGER ERROR] Failed to parse shared bindings of '{}': {}",
                        self.name, e
                    );
                    LogContext::new()
                }
            }
        })
    }

    /// Whether `bindings()` has been resolved for this instance
    pub fn bindings_parsed(&self) -> bool {
        self.parsed.get().is_some()
    }
}

fn serialize_chindings(bindings: &LogContext) -> String {
    bindings
        .iter()
        .filter_map(|(key, value)| {
            let key = serde_json::to_string(key).ok()?;
            let value = serde_json::to_string(value).ok()?;
            Some(format!("{}:{}", key, value))
        })
        .collect::<Vec<_>>()
        .join(",")
}

fn hostname() -> String {
    std::env::var("HOSTNAME")
        .ok()
        .filter(|h| !h.is_empty())
        .or_else(|| {
            std::fs::read_to_string("/etc/hostname")
                .ok()
                .map(|h| h.trim().to_string())
                .filter(|h| !h.is_empty())
        })
        .or_else(|| std::env::var("COMPUTERNAME").ok())
        .unwrap_or_else(|| "localhost".to_string())
}
