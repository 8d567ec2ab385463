//! Remote collector sink

use super::transport::{parse_endpoint, NetworkTransport};
use crate::core::{Result, Sink, WriteMeta};

/// Ships every chunk, newline-delimited, to a remote collector
pub struct RemoteSink {
    name: String,
    transport: NetworkTransport,
}

impl RemoteSink {
    /// Sink for `url`; fails if no `host:port` can be derived from it
    pub fn new(url: &str) -> Result<Self> {
        let address = parse_endpoint(url)?;
        Ok(Self {
            name: format!("remote({})", address),
            transport: NetworkTransport::new(address),
        })
    }

    pub fn address(&self) -> &str {
        self.transport.address()
    }

    pub fn failed_count(&self) -> u64 {
        self.transport.failed_count()
    }
}

impl Sink for RemoteSink {
    fn write(&mut self, chunk: &str, _meta: &WriteMeta) -> Result<()> {
        let mut line = chunk.to_string();
        if !line.ends_with('\n') {
            line.push('\n');
        }
        self.transport.send(line)
    }

    fn flush(&mut self) -> Result<()> {
        self.transport.flush()
    }

    fn name(&self) -> &str {
        &self.name
    }
}
