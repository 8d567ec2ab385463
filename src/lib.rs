//! # Log Router
//!
//! Rule-based routing of application log records to console, rotating
//! file, remote and Elasticsearch targets.
//!
//! ## Features
//!
//! - **Per-severity rules**: wildcard routing with per-logger overrides
//! - **Lazy formatting**: human-readable sinks rebuild records from the
//!   structured values carried with each write, never from the wire line
//! - **Failure isolation**: a failing sink never affects the others or the
//!   caller of a log call
//! - **Error enrichment**: `debug`/`error` capture call site, stack and the
//!   ambient request
//!
//! ```no_run
//! use log_router::prelude::*;
//!
//! let manager = LogManager::new(LoggerConfig::load(".").unwrap());
//! let logger = manager.get_logger("payments").unwrap();
//! logger.info("charge accepted");
//! logger.error("card declined");
//! ```

pub mod config;
pub mod core;
pub mod logger;
pub mod macros;
pub mod provision;
pub mod registry;
pub mod routing;
pub mod sinks;

pub mod prelude {
    pub use crate::config::{LoggerConfig, Rule, TargetKind, TargetsConfig};
    pub use crate::core::{
        FieldValue, Fault, LogContext, LogLevel, LoggerError, LoggerHooks, RequestContext,
        RequestInfo, Result, Sink, WriteMeta,
    };
    pub use crate::logger::Logger;
    pub use crate::registry::{get_logger, init_global, LogManager};
}

pub use config::LoggerConfig;
pub use core::{
    DispatchMetrics, FieldValue, Fault, LogContext, LogLevel, LogRecord, LoggerError, LoggerHooks,
    RequestContext, RequestInfo, Result, Sink, WriteMeta,
};
pub use logger::Logger;
pub use registry::{get_logger, init_global, LogManager, LogManagerBuilder};
