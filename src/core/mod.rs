//! Core record, formatting and sink types

pub mod error;
pub mod fault;
pub mod formatter;
pub mod instance;
pub mod log_context;
pub mod log_level;
pub mod log_record;
pub mod metrics;
pub mod pretty;
pub mod sink;
pub mod timestamp;

pub use error::{LoggerError, Result};
pub use fault::{ErrorPayload, Fault, RequestContext, RequestGuard, RequestInfo, UserInfo};
pub use formatter::{FormatOptions, FormatterState, LazyFormatter, FLUSH_WARNING_MESSAGE};
pub use instance::{
    LogFormatterFn, LoggerHooks, LoggerInstance, RedactFn, SerializerFn, DEFAULT_MESSAGE_KEY,
};
pub use log_context::{FieldValue, LogContext};
pub use log_level::LogLevel;
pub use log_record::{LogRecord, LEVEL_LABEL_KEY, LOGGER_KEY};
pub use metrics::DispatchMetrics;
pub use pretty::{MessageFormat, MessageFormatFn, Prettifier, PrettyOptions};
pub use sink::{Sink, WriteMeta};
pub use timestamp::TimestampFormat;
