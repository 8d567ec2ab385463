//! Logging macros with `format!`-style arguments.
//!
//! `trace!`, `info!` and `warn!` format a message. `debug!` and `error!`
//! format a value that is logged as a fault, enriched with the location of
//! the macro call.
//!
//! # Examples
//!
//! ```no_run
//! use log_router::prelude::*;
//! use log_router::{error, info};
//!
//! let manager = LogManager::new(LoggerConfig::default());
//! let logger = manager.get_logger("server").unwrap();
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//! error!(logger, "Bind failed on port {}", port);
//! ```

/// Log a formatted message at the given level.
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.log($level, format!($($arg)+))
    };
}

/// Log a trace-level message.
#[macro_export]
macro_rules! trace {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Trace, $($arg)+)
    };
}

/// Log an info-level message.
///
/// # Examples
///
/// ```no_run
/// # use log_router::prelude::*;
/// # let manager = LogManager::new(LoggerConfig::default());
/// # let logger = manager.get_logger("app").unwrap();
/// use log_router::info;
/// info!(logger, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Info, $($arg)+)
    };
}

/// Log a warning-level message.
#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $crate::log!($logger, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Log a formatted value as a debug-level fault.
#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $logger.debug(format!($($arg)+))
    };
}

/// Log a formatted value as an error-level fault.
///
/// # Examples
///
/// ```no_run
/// # use log_router::prelude::*;
/// # let manager = LogManager::new(LoggerConfig::default());
/// # let logger = manager.get_logger("app").unwrap();
/// use log_router::error;
/// error!(logger, "Connection refused by {}", "db-1");
/// ```
#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $logger.error(format!($($arg)+))
    };
}

#[cfg(test)]
mod tests {
    use crate::core::{LoggerHooks, LoggerInstance, Result, Sink, WriteMeta};
    use crate::logger::Logger;
    use crate::routing::{Binding, BindingList};
    use crate::LogLevel;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct Capture {
        metas: Arc<Mutex<Vec<WriteMeta>>>,
    }

    impl Sink for Capture {
        fn write(&mut self, _chunk: &str, meta: &WriteMeta) -> Result<()> {
            self.metas.lock().push(meta.clone());
            Ok(())
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }

        fn name(&self) -> &str {
            "capture"
        }
    }

    fn logger() -> (Logger, Capture) {
        let capture = Capture::default();
        let mut bindings = BindingList::new();
        bindings.push(Binding::new(LogLevel::Trace, "capture", Box::new(capture.clone())));
        let instance = Arc::new(LoggerInstance::new("macros", LoggerHooks::default()));
        (Logger::new(instance, bindings), capture)
    }

    #[test]
    fn test_message_macros() {
        let (logger, capture) = logger();
        trace!(logger, "step {}", 1);
        info!(logger, "ready on {}", 8080);
        warn!(logger, "retry {} of {}", 2, 5);

        let metas = capture.metas.lock();
        let messages: Vec<_> = metas.iter().filter_map(|m| m.message.clone()).collect();
        assert_eq!(messages, vec!["step 1", "ready on 8080", "retry 2 of 5"]);
    }

    #[test]
    fn test_fault_macros_record_call_site() {
        let (logger, capture) = logger();
        error!(logger, "lost {} rows", 3);
        let line = line!() - 1;
        debug!(logger, "cache {}", "miss");

        let metas = capture.metas.lock();
        let error = metas[0].record.error.as_ref().unwrap();
        assert_eq!(error.message, "lost 3 rows");
        assert_eq!(error.file_name, "macros.rs");
        assert!(error.line_number.starts_with(&format!("{}:", line)));
        assert_eq!(metas[1].level, LogLevel::Debug);
    }
}
