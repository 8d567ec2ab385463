//! Sink implementations

pub mod console;
pub mod elastic;
pub mod remote;
pub mod rotating_file;
pub mod transport;

pub use console::ConsoleSink;
pub use elastic::ElasticSink;
pub use remote::RemoteSink;
pub use rotating_file::{FileTemplate, RotatingFileSink, RotationPolicy};
pub use transport::NetworkTransport;

pub use crate::core::Sink;
