//! Lazy pretty formatting in front of a sink
//!
//! A `LazyFormatter` never parses the wire line it is handed. It rebuilds
//! a readable entry from the side-channel values of the write (level,
//! message, structured record and originating logger), merges the logger's
//! shared bindings, renders it, and forwards the text to the wrapped sink
//! together with the same side-channel values, so formatters can be
//! chained.

use super::error::Result;
use super::log_context::{FieldValue, LogContext};
use super::log_level::LogLevel;
use super::pretty::Prettifier;
use super::sink::{Sink, WriteMeta};
use super::timestamp::TimestampFormat;

/// Message of the one-time warning emitted by `flush`
pub const FLUSH_WARNING_MESSAGE: &str =
    "final flush with pretty formatting does not support flushing";

/// Options of a lazy formatter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FormatOptions {
    /// Never emit the flush warning
    pub suppress_flush_warning: bool,
}

/// Side-channel values of the most recent write
#[derive(Debug, Default)]
pub struct FormatterState {
    last: Option<WriteMeta>,
}

impl FormatterState {
    pub fn last_level(&self) -> Option<LogLevel> {
        self.last.as_ref().map(|meta| meta.level)
    }

    pub fn last_message(&self) -> Option<&str> {
        self.last.as_ref().and_then(|meta| meta.message.as_deref())
    }

    pub fn last_meta(&self) -> Option<&WriteMeta> {
        self.last.as_ref()
    }

    pub fn has_record(&self) -> bool {
        self.last.is_some()
    }

    fn record(&mut self, meta: &WriteMeta) {
        self.last = Some(meta.clone());
    }
}

/// Formatting adapter wrapping the true destination
pub struct LazyFormatter {
    inner: Box<dyn Sink>,
    prettifier: Prettifier,
    options: FormatOptions,
    state: FormatterState,
    warned: bool,
    skipped: u64,
}

impl LazyFormatter {
    pub fn new(inner: Box<dyn Sink>, prettifier: Prettifier) -> Self {
        Self::with_options(inner, prettifier, FormatOptions::default())
    }

    pub fn with_options(
        inner: Box<dyn Sink>,
        prettifier: Prettifier,
        options: FormatOptions,
    ) -> Self {
        Self {
            inner,
            prettifier,
            options,
            state: FormatterState::default(),
            warned: false,
            skipped: 0,
        }
    }

    pub fn state(&self) -> &FormatterState {
        &self.state
    }

    /// Number of writes the prettifier opted out of
    pub fn skipped_count(&self) -> u64 {
        self.skipped
    }

    /// Build the flat mapping handed to the prettifier
    pub fn merge(meta: &WriteMeta) -> LogContext {
        let logger = &meta.logger;
        let hooks = logger.hooks();
        let message_key = logger.message_key();

        let mut fields = meta.record.structured_fields();
        if let Some(ref format) = hooks.log_formatter {
            fields = format(fields);
        }
        if let Some(ref message) = meta.message {
            if !fields.contains_key(message_key) {
                fields.add_field(message_key, message.as_str());
            }
        }

        let mut obj = LogContext::new()
            .with_field("level", meta.level.to_str())
            .with_field("time", meta.record.wire_time());
        for (key, value) in fields {
            obj.add_field(key, value);
        }

        obj.merge_missing(logger.bindings());

        for (key, serialize) in &hooks.serializers {
            if let Some(value) = obj.get_mut(key) {
                *value = serialize(value);
            }
        }

        match hooks.redact {
            Some(ref redact) => redact(obj),
            None => obj,
        }
    }

    fn emit(&mut self, obj: &LogContext, meta: &WriteMeta) -> Result<()> {
        match (self.prettifier)(obj) {
            Some(formatted) => self.inner.write(&formatted, meta),
            None => {
                self.skipped += 1;
                Ok(())
            }
        }
    }
}

impl Sink for LazyFormatter {
    fn write(&mut self, _chunk: &str, meta: &WriteMeta) -> Result<()> {
        self.state.record(meta);
        let obj = Self::merge(meta);
        self.emit(&obj, meta)
    }

    fn flush(&mut self) -> Result<()> {
        let Some(meta) = self.state.last.clone() else {
            return Ok(());
        };
        if !self.options.suppress_flush_warning && !self.warned {
            self.warned = true;
            let mut warning = LogContext::new()
                .with_field("level", LogLevel::Warn.to_str())
                .with_field(meta.logger.message_key(), FLUSH_WARNING_MESSAGE)
                .with_field("time", FieldValue::String(TimestampFormat::RecordTime.format_now()));
            warning.merge_missing(meta.logger.bindings());
            self.emit(&warning, &meta)?;
        }
        self.inner.flush()
    }

    fn name(&self) -> &str {
        self.inner.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::instance::{LoggerHooks, LoggerInstance};
    use crate::core::log_record::LogRecord;
    use crate::core::pretty::PrettyOptions;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Capture {
        lines: Arc<Mutex<Vec<(String, Option<LogLevel>)>>>,
    }

    impl Sink for Capture {
        fn write(&mut self, chunk: &str, meta: &WriteMeta) -> Result<()> {
            self.lines.lock().push((chunk.to_string(), Some(meta.level)));
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "capture"
        }
    }

    fn instance(hooks: LoggerHooks) -> Arc<LoggerInstance> {
        let bindings = LogContext::new()
            .with_field("pid", 9)
            .with_field("hostname", "box")
            .with_field("name", "payments")
            .with_field("region", "eu");
        Arc::new(LoggerInstance::with_bindings("payments", &bindings, hooks))
    }

    fn meta(
        logger: &Arc<LoggerInstance>,
        level: LogLevel,
        message: &str,
        fields: LogContext,
    ) -> WriteMeta {
        let record = LogRecord::new(logger.name(), level)
            .with_message(message)
            .with_fields(fields);
        WriteMeta::new(Arc::new(record), Arc::clone(logger))
    }

    fn json_prettifier() -> Prettifier {
        Arc::new(|obj: &LogContext| Some(format!("{}\n", obj.to_json_value())))
    }

    #[test]
    fn test_flush_before_write_is_noop() {
        let capture = Capture::default();
        let mut formatter = LazyFormatter::new(Box::new(capture.clone()), json_prettifier());

        formatter.flush().unwrap();
        formatter.flush().unwrap();
        assert!(capture.lines.lock().is_empty());
        assert!(!formatter.state().has_record());
    }

    #[test]
    fn test_flush_warns_exactly_once() {
        let capture = Capture::default();
        let mut formatter = LazyFormatter::new(Box::new(capture.clone()), json_prettifier());
        let logger = instance(LoggerHooks::default());

        formatter
            .write("{}\n", &meta(&logger, LogLevel::Info, "ready", LogContext::new()))
            .unwrap();
        formatter.flush().unwrap();
        formatter.flush().unwrap();

        let lines = capture.lines.lock();
        assert_eq!(lines.len(), 2);
        let warning: serde_json::Value = serde_json::from_str(lines[1].0.trim()).unwrap();
        assert_eq!(warning["level"], "WARN");
        assert_eq!(warning["message"], FLUSH_WARNING_MESSAGE);
        assert_eq!(warning["region"], "eu");
        // side channel re-propagated from the last record
        assert_eq!(lines[1].1, Some(LogLevel::Info));
    }

    #[test]
    fn test_flush_warning_can_be_suppressed() {
        let capture = Capture::default();
        let mut formatter = LazyFormatter::with_options(
            Box::new(capture.clone()),
            json_prettifier(),
            FormatOptions {
                suppress_flush_warning: true,
            },
        );
        let logger = instance(LoggerHooks::default());
        formatter
            .write("{}\n", &meta(&logger, LogLevel::Info, "ready", LogContext::new()))
            .unwrap();
        formatter.flush().unwrap();
        assert_eq!(capture.lines.lock().len(), 1);
    }

    #[test]
    fn test_record_fields_win_over_shared_bindings() {
        let logger = instance(LoggerHooks::default());
        let m = meta(
            &logger,
            LogLevel::Warn,
            "slow",
            LogContext::new()
                .with_field("region", "us")
                .with_field("latency_ms", 830),
        );
        let merged = LazyFormatter::merge(&m);

        assert_eq!(merged.get("region"), Some(&FieldValue::from("us")));
        assert_eq!(merged.get("latency_ms"), Some(&FieldValue::Int(830)));
        assert_eq!(merged.get("hostname"), Some(&FieldValue::from("box")));
        assert_eq!(merged.get("level"), Some(&FieldValue::from("WARN")));
        assert_eq!(merged.get("message"), Some(&FieldValue::from("slow")));
        assert!(merged.contains_key("time"));
    }

    #[test]
    fn test_hooks_are_applied() {
        let mut hooks = LoggerHooks::default();
        hooks.log_formatter = Some(Arc::new(|fields: LogContext| {
            fields.with_field("formatted", true)
        }));
        hooks.serializers.insert(
            "card".to_string(),
            Arc::new(|value: &FieldValue| {
                let digits = value.to_string();
                let tail = &digits[digits.len().saturating_sub(4)..];
                FieldValue::String(format!("****{}", tail))
            }),
        );
        hooks.redact = Some(Arc::new(|mut obj: LogContext| {
            obj.remove("secret");
            obj
        }));
        let logger = instance(hooks);

        let merged = LazyFormatter::merge(&meta(
            &logger,
            LogLevel::Info,
            "paid",
            LogContext::new()
                .with_field("card", "4111111111111111")
                .with_field("secret", "hunter2"),
        ));

        assert_eq!(merged.get("formatted"), Some(&FieldValue::Bool(true)));
        assert_eq!(merged.get("card"), Some(&FieldValue::from("****1111")));
        assert!(!merged.contains_key("secret"));
    }

    #[test]
    fn test_opt_out_drops_write() {
        let capture = Capture::default();
        let drop_all: Prettifier = Arc::new(|_: &LogContext| None);
        let mut formatter = LazyFormatter::new(Box::new(capture.clone()), drop_all);
        let logger = instance(LoggerHooks::default());

        formatter
            .write("{}\n", &meta(&logger, LogLevel::Info, "dropped", LogContext::new()))
            .unwrap();
        assert!(capture.lines.lock().is_empty());
        assert_eq!(formatter.skipped_count(), 1);
        assert_eq!(formatter.state().last_message(), Some("dropped"));
        assert_eq!(formatter.state().last_level(), Some(LogLevel::Info));
    }

    #[test]
    fn test_chained_formatters_see_same_side_channel() {
        let capture = Capture::default();
        let inner = LazyFormatter::new(Box::new(capture.clone()), json_prettifier());
        let mut outer = LazyFormatter::new(
            Box::new(inner),
            PrettyOptions::default().into_prettifier(),
        );
        let logger = instance(LoggerHooks::default());

        outer
            .write("{}\n", &meta(&logger, LogLevel::Error, "chained", LogContext::new()))
            .unwrap();

        let lines = capture.lines.lock();
        assert_eq!(lines.len(), 1);
        let parsed: serde_json::Value = serde_json::from_str(lines[0].0.trim()).unwrap();
        assert_eq!(parsed["message"], "chained");
        assert_eq!(parsed["level"], "ERROR");
    }

    #[test]
    fn test_bindings_resolved_once_per_logger() {
        let capture = Capture::default();
        let mut formatter = LazyFormatter::new(Box::new(capture), json_prettifier());
        let logger = instance(LoggerHooks::default());
        assert!(!logger.bindings_parsed());

        for i in 0..3 {
            formatter
                .write(
                    "{}\n",
                    &meta(&logger, LogLevel::Info, &format!("n{}", i), LogContext::new()),
                )
                .unwrap();
        }
        assert!(logger.bindings_parsed());
    }
}
