//! Record dispatch
//!
//! A record is serialized once into its wire line and written to every
//! selected binding. Each sink call is isolated: an error or a panic in one
//! sink is reported on stderr and counted, and delivery continues with the
//! remaining sinks. Nothing is ever returned to the caller of a log call.

use super::assembler::{Binding, BindingList};
use crate::core::{DispatchMetrics, LogRecord, LoggerInstance, Result, WriteMeta};
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

#[derive(Debug)]
pub struct Dispatcher {
    bindings: BindingList,
    metrics: Arc<DispatchMetrics>,
}

impl Dispatcher {
    pub fn new(bindings: BindingList) -> Self {
        Self {
            bindings,
            metrics: Arc::new(DispatchMetrics::new()),
        }
    }

    pub fn bindings(&self) -> &BindingList {
        &self.bindings
    }

    pub fn metrics(&self) -> &Arc<DispatchMetrics> {
        &self.metrics
    }

    pub fn dispatch(&self, instance: &Arc<LoggerInstance>, record: LogRecord) {
        self.metrics.record_dispatched();

        let mut targets = self.bindings.select(record.level).peekable();
        if targets.peek().is_none() {
            self.metrics.record_unrouted();
            return;
        }

        let mut chunk = match record.to_wire(instance.chindings(), instance.message_key()) {
            Ok(line) => line,
            Err(e) => {
                eprintln!(
                    "[LOGGER ERROR] Failed to serialize record of '{}': {}",
                    instance.name(),
                    e
                );
                return;
            }
        };
        chunk.push('\n');
        let meta = WriteMeta::new(Arc::new(record), Arc::clone(instance));

        for binding in targets {
            let result =
                catch_unwind(AssertUnwindSafe(|| binding.sink().lock().write(&chunk, &meta)));
            if self.report(binding, "write", result) {
                self.metrics.record_sink_write();
            } else {
                self.metrics.record_sink_failure();
            }
        }
    }

    /// Flush every binding; failures are reported, never returned
    pub fn flush(&self) {
        for binding in self.bindings.iter() {
            let result = catch_unwind(AssertUnwindSafe(|| binding.sink().lock().flush()));
            self.report(binding, "flush", result);
        }
    }

    fn report(
        &self,
        binding: &Binding,
        operation: &str,
        result: std::thread::Result<Result<()>>,
    ) -> bool {
        match result {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                eprintln!(
                    "[LOGGER ERROR] Sink '{}' {} failed: {}",
                    binding.key(),
                    operation,
                    e
                );
                false
            }
            Err(panic_info) => {
                eprintln!(
                    "[LOGGER CRITICAL] Sink '{}' panicked during {}: {}. \
                     Other sinks continue to function.",
                    binding.key(),
                    operation,
                    panic_message(panic_info.as_ref())
                );
                false
            }
        }
    }
}

fn panic_message(panic_info: &(dyn Any + Send)) -> String {
    if let Some(s) = panic_info.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic_info.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogContext, LogLevel, LoggerError, LoggerHooks, Sink};
    use parking_lot::Mutex;

    #[derive(Clone, Default)]
    struct Capture {
        lines: Arc<Mutex<Vec<String>>>,
        flushes: Arc<Mutex<usize>>,
    }

    impl Sink for Capture {
        fn write(&mut self, chunk: &str, _meta: &WriteMeta) -> Result<()> {
            self.lines.lock().push(chunk.to_string());
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            *self.flushes.lock() += 1;
            Ok(())
        }

        fn name(&self) -> &str {
            "capture"
        }
    }

    struct Failing;

    impl Sink for Failing {
        fn write(&mut self, _chunk: &str, _meta: &WriteMeta) -> Result<()> {
            Err(LoggerError::sink_write("failing", "disk full"))
        }

        fn flush(&mut self) -> Result<()> {
            Err(LoggerError::sink_write("failing", "disk full"))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct Panicking;

    impl Sink for Panicking {
        fn write(&mut self, _chunk: &str, _meta: &WriteMeta) -> Result<()> {
            panic!("formatter exploded");
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    fn instance() -> Arc<LoggerInstance> {
        let bindings = LogContext::new().with_field("pid", 1).with_field("hostname", "box");
        Arc::new(LoggerInstance::with_bindings("orders", &bindings, LoggerHooks::default()))
    }

    #[test]
    fn test_wire_line_written_once_per_sink() {
        let capture = Capture::default();
        let mut bindings = BindingList::new();
        bindings.push(Binding::new(LogLevel::Info, "a", Box::new(capture.clone())));
        let dispatcher = Dispatcher::new(bindings);

        dispatcher.dispatch(
            &instance(),
            LogRecord::new("orders", LogLevel::Warn).with_message("late"),
        );

        let lines = capture.lines.lock();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("\"message\":\"late\"}\n"));
        let parsed: serde_json::Value = serde_json::from_str(lines[0].trim()).unwrap();
        assert_eq!(parsed["hostname"], "box");
        assert_eq!(parsed["level"], "WARN");
        assert_eq!(dispatcher.metrics().sink_writes(), 1);
    }

    #[test]
    fn test_failing_sinks_do_not_block_others() {
        let capture = Capture::default();
        let mut bindings = BindingList::new();
        bindings.push(Binding::new(LogLevel::Error, "failing", Box::new(Failing)));
        bindings.push(Binding::new(LogLevel::Error, "panicking", Box::new(Panicking)));
        bindings.push(Binding::new(LogLevel::Error, "capture", Box::new(capture.clone())));
        let dispatcher = Dispatcher::new(bindings);

        for message in ["one", "two"] {
            let record = LogRecord::new("orders", LogLevel::Error).with_message(message);
            dispatcher.dispatch(&instance(), record);
        }

        assert_eq!(capture.lines.lock().len(), 2);
        assert_eq!(dispatcher.metrics().sink_failures(), 4);
        assert_eq!(dispatcher.metrics().sink_writes(), 2);

        dispatcher.flush();
        assert_eq!(*capture.flushes.lock(), 1);
    }

    #[test]
    fn test_unrouted_records_are_counted() {
        let mut bindings = BindingList::new();
        bindings.push(Binding::new(LogLevel::Info, "capture", Box::new(Capture::default())));
        let dispatcher = Dispatcher::new(bindings);

        dispatcher.dispatch(&instance(), LogRecord::new("orders", LogLevel::Trace));
        assert_eq!(dispatcher.metrics().dispatched(), 1);
        assert_eq!(dispatcher.metrics().unrouted(), 1);
        assert_eq!(dispatcher.metrics().sink_writes(), 0);
    }
}
