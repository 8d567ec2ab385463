//! Logger facade
//!
//! `trace`, `info` and `warn` log their message (and optional fields) as
//! given. `debug` and `error` take a [`Fault`], either a raised error or a
//! plain value, and log it enriched with the call site, the fault type, a
//! stack and the ambient request, if any.

use crate::core::{
    DispatchMetrics, ErrorPayload, Fault, LogContext, LogLevel, LogRecord, LoggerInstance,
};
use crate::routing::{BindingList, Dispatcher};
use std::panic::Location;
use std::sync::Arc;

#[derive(Debug)]
pub struct Logger {
    instance: Arc<LoggerInstance>,
    dispatcher: Dispatcher,
}

impl Logger {
    pub fn new(instance: Arc<LoggerInstance>, bindings: BindingList) -> Self {
        Self {
            instance,
            dispatcher: Dispatcher::new(bindings),
        }
    }

    pub fn name(&self) -> &str {
        self.instance.name()
    }

    pub fn instance(&self) -> &Arc<LoggerInstance> {
        &self.instance
    }

    pub fn bindings(&self) -> &BindingList {
        self.dispatcher.bindings()
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        self.dispatcher.metrics()
    }

    /// Whether a record at `level` would reach any sink
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        self.bindings().select(level).next().is_some()
    }

    pub fn log(&self, level: LogLevel, message: impl AsRef<str>) {
        self.log_record(LogRecord::new(self.name(), level).with_message(message));
    }

    pub fn log_with(&self, level: LogLevel, fields: LogContext, message: impl AsRef<str>) {
        self.log_record(
            LogRecord::new(self.name(), level)
                .with_fields(fields)
                .with_message(message),
        );
    }

    pub fn log_record(&self, record: LogRecord) {
        self.dispatcher.dispatch(&self.instance, record);
    }

    /// Log `fault` at `level`, enriched as if raised at `location`
    pub fn log_fault(&self, level: LogLevel, fault: &Fault, location: &Location<'_>) {
        let payload = ErrorPayload::capture(fault, location);
        self.log_record(LogRecord::new(self.name(), level).with_error(payload));
    }

    pub fn trace(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Trace, message);
    }

    pub fn trace_with(&self, fields: LogContext, message: impl AsRef<str>) {
        self.log_with(LogLevel::Trace, fields, message);
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Info, message);
    }

    pub fn info_with(&self, fields: LogContext, message: impl AsRef<str>) {
        self.log_with(LogLevel::Info, fields, message);
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn warn_with(&self, fields: LogContext, message: impl AsRef<str>) {
        self.log_with(LogLevel::Warn, fields, message);
    }

    #[track_caller]
    pub fn debug(&self, fault: impl Into<Fault>) {
        self.log_fault(LogLevel::Debug, &fault.into(), Location::caller());
    }

    #[track_caller]
    pub fn error(&self, fault: impl Into<Fault>) {
        self.log_fault(LogLevel::Error, &fault.into(), Location::caller());
    }

    #[track_caller]
    pub fn fatal(&self, fault: impl Into<Fault>) {
        self.log_fault(LogLevel::Fatal, &fault.into(), Location::caller());
    }

    /// Flush every sink of this logger
    pub fn flush(&self) {
        self.dispatcher.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LoggerHooks, Result, Sink, WriteMeta};
    use crate::routing::Binding;
    use parking_lot::Mutex;

    #[derive(Clone, Default)]
    struct Capture {
        records: Arc<Mutex<Vec<(String, WriteMeta)>>>,
    }

    impl Sink for Capture {
        fn write(&mut self, chunk: &str, meta: &WriteMeta) -> Result<()> {
            self.records.lock().push((chunk.to_string(), meta.clone()));
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "capture"
        }
    }

    fn logger(level: LogLevel) -> (Logger, Capture) {
        let capture = Capture::default();
        let mut bindings = BindingList::new();
        bindings.push(Binding::new(level, "capture", Box::new(capture.clone())));
        let instance = Arc::new(LoggerInstance::new("checkout", LoggerHooks::default()));
        (Logger::new(instance, bindings), capture)
    }

    #[test]
    fn test_info_passes_message_and_fields() {
        let (logger, capture) = logger(LogLevel::Info);
        logger.info_with(LogContext::new().with_field("cart", 3), "checkout started");

        let records = capture.records.lock();
        let parsed: serde_json::Value = serde_json::from_str(records[0].0.trim()).unwrap();
        assert_eq!(parsed["message"], "checkout started");
        assert_eq!(parsed["cart"], 3);
        assert_eq!(parsed["logger"], "checkout");
        assert_eq!(parsed["logLevel"], "info");
        assert_eq!(parsed["name"], "checkout");
    }

    #[test]
    fn test_error_is_enriched_with_call_site() {
        let (logger, capture) = logger(LogLevel::Error);
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "config missing");
        logger.error(io_err);
        let line = line!() - 1;

        let records = capture.records.lock();
        let meta = &records[0].1;
        let error = meta.record.error.as_ref().unwrap();
        assert_eq!(error.file_name, "logger.rs");
        assert!(error.line_number.starts_with(&format!("{}:", line)));
        assert_eq!(error.error_type, "Error");
        assert_eq!(meta.message.as_deref(), Some("config missing"));

        let parsed: serde_json::Value = serde_json::from_str(records[0].0.trim()).unwrap();
        assert_eq!(parsed["errorType"], "Error");
        assert_eq!(parsed["message"], "config missing");
        assert!(parsed["stack"].as_str().unwrap().contains("config missing"));
        assert!(parsed["env"].is_string());
    }

    #[test]
    fn test_debug_accepts_plain_values() {
        let (logger, capture) = logger(LogLevel::Debug);
        logger.debug("cache miss");

        let records = capture.records.lock();
        let error = records[0].1.record.error.as_ref().unwrap();
        assert_eq!(error.error_type, "Error");
        assert_eq!(error.message, "cache miss");
        assert_eq!(records[0].1.level, LogLevel::Debug);
    }

    #[test]
    fn test_is_enabled_follows_bindings() {
        let (logger, _capture) = logger(LogLevel::Warn);
        assert!(!logger.is_enabled(LogLevel::Info));
        assert!(logger.is_enabled(LogLevel::Warn));
        assert!(logger.is_enabled(LogLevel::Fatal));
    }
}
