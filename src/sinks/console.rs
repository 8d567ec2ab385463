//! Console sink

use crate::core::{LoggerError, Result, Sink, WriteMeta};
use std::io::{self, Write};

/// Writes every chunk to stdout, or to any writer handed in
pub struct ConsoleSink {
    writer: Box<dyn Write + Send>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self::with_writer(io::stdout())
    }

    pub fn with_writer(writer: impl Write + Send + 'static) -> Self {
        Self {
            writer: Box::new(writer),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for ConsoleSink {
    fn write(&mut self, chunk: &str, _meta: &WriteMeta) -> Result<()> {
        self.writer
            .write_all(chunk.as_bytes())
            .map_err(|e| LoggerError::sink_write(self.name(), e.to_string()))
    }

    fn flush(&mut self) -> Result<()> {
        self.writer
            .flush()
            .map_err(|e| LoggerError::sink_write(self.name(), e.to_string()))
    }

    fn name(&self) -> &str {
        "console"
    }
}
