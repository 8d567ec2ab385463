//! Log record structure and its compact wire form

use super::error::Result;
use super::fault::ErrorPayload;
use super::log_context::{FieldValue, LogContext};
use super::log_level::LogLevel;
use super::timestamp::TimestampFormat;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};

/// Key of the originating logger name, added to every record
pub const LOGGER_KEY: &str = "logger";
/// Key of the lowercase level label, added to every record
pub const LEVEL_LABEL_KEY: &str = "logLevel";

/// One log call. Read-only once built.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub logger_name: String,
    pub level: LogLevel,
    pub time: DateTime<Utc>,
    pub message: Option<String>,
    pub fields: LogContext,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

impl LogRecord {
    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// to prevent attackers from injecting fake log entries.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn new(logger_name: impl Into<String>, level: LogLevel) -> Self {
        let logger_name = logger_name.into();
        let fields = LogContext::new()
            .with_field(LOGGER_KEY, logger_name.as_str())
            .with_field(LEVEL_LABEL_KEY, level.label());
        Self {
            logger_name,
            level,
            time: Utc::now(),
            message: None,
            fields,
            error: None,
        }
    }

    pub fn with_message(mut self, message: impl AsRef<str>) -> Self {
        self.message = Some(Self::sanitize_message(message.as_ref()));
        self
    }

    /// Merge caller fields; the mixin keys set at creation are not overridden
    pub fn with_fields(mut self, fields: LogContext) -> Self {
        for (key, value) in fields {
            if key != LOGGER_KEY && key != LEVEL_LABEL_KEY {
                self.fields.add_field(key, value);
            }
        }
        self
    }

    pub fn with_error(mut self, error: ErrorPayload) -> Self {
        if self.message.is_none() {
            self.message = Some(Self::sanitize_message(&error.message));
        }
        self.error = Some(error);
        self
    }

    pub fn with_time(mut self, time: DateTime<Utc>) -> Self {
        self.time = time;
        self
    }

    /// Record fields with the error payload flattened in; record fields win
    pub fn structured_fields(&self) -> LogContext {
        let mut fields = self.fields.clone();
        if let Some(ref error) = self.error {
            fields.merge_missing(&error.to_fields());
        }
        fields
    }

    /// Wire-form `time` value
    pub fn wire_time(&self) -> String {
        TimestampFormat::RecordTime.format(&self.time.with_timezone(&Local))
    }

    /// Serialize into the single-line wire form, splicing in the logger's
    /// pre-serialized shared bindings (`"pid":1,"hostname":"h",...`).
    pub fn to_wire(&self, chindings: &str, message_key: &str) -> Result<String> {
        let mut line = String::with_capacity(256);
        line.push_str("{\"level\":");
        line.push_str(&serde_json::to_string(self.level.to_str())?);
        line.push_str(",\"time\":");
        line.push_str(&serde_json::to_string(&self.wire_time())?);
        if !chindings.is_empty() {
            line.push(',');
            line.push_str(chindings);
        }
        for (key, value) in self.structured_fields().iter() {
            if key == message_key {
                continue;
            }
            push_member(&mut line, key, value)?;
        }
        let message = self
            .message
            .clone()
            .map(FieldValue::String)
            .or_else(|| self.fields.get(message_key).cloned());
        if let Some(message) = message {
            push_member(&mut line, message_key, &message)?;
        }
        line.push('}');
        Ok(line)
    }
}

fn push_member(line: &mut String, key: &str, value: &FieldValue) -> Result<()> {
    line.push(',');
    line.push_str(&serde_json::to_string(key)?);
    line.push(':');
    line.push_str(&serde_json::to_string(value)?);
    Ok(())
}
