//! Sink trait for log output destinations

use super::{error::Result, instance::LoggerInstance, log_level::LogLevel, log_record::LogRecord};
use std::sync::Arc;

/// Out-of-band values handed to a sink alongside the wire line
///
/// Sinks that only need the serialized line ignore it; formatting sinks
/// rebuild a readable record from it without re-parsing the line.
#[derive(Debug, Clone)]
pub struct WriteMeta {
    pub level: LogLevel,
    pub message: Option<String>,
    pub record: Arc<LogRecord>,
    pub logger: Arc<LoggerInstance>,
}

impl WriteMeta {
    pub fn new(record: Arc<LogRecord>, logger: Arc<LoggerInstance>) -> Self {
        Self {
            level: record.level,
            message: record.message.clone(),
            record,
            logger,
        }
    }
}

pub trait Sink: Send {
    /// Write one record. `chunk` is the newline-terminated wire line.
    fn write(&mut self, chunk: &str, meta: &WriteMeta) -> Result<()>;
    fn flush(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}
