//! Background network transport shared by the remote and elastic sinks
//!
//! Lines are queued on a bounded channel and written to a TCP endpoint by a
//! dedicated worker thread, so a slow or unreachable collector never blocks
//! the caller of a log call. The worker connects lazily and reconnects once
//! per failed write.

use crate::core::{LoggerError, Result};
use crossbeam_channel::{bounded, Sender, TrySendError};
use std::io::Write;
use std::net::TcpStream;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default capacity of the transport queue
pub const DEFAULT_QUEUE_SIZE: usize = 1024;

/// How long `flush` and shutdown wait for the worker
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

const IO_TIMEOUT: Duration = Duration::from_secs(5);

enum Message {
    Line(String),
    Flush(Sender<()>),
}

/// Extract `host:port` from a url such as `http://collector:9000/logs`
pub fn parse_endpoint(url: &str) -> Result<String> {
    let invalid = |reason: &str| LoggerError::config("target url", format!("'{}' {}", url, reason));

    let (scheme, rest) = match url.split_once("://") {
        Some((scheme, rest)) => (Some(scheme.to_ascii_lowercase()), rest),
        None => (None, url),
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let authority = authority.rsplit('@').next().unwrap_or_default();
    if authority.is_empty() {
        return Err(invalid("has no host"));
    }

    let has_port = authority
        .rsplit_once(':')
        .is_some_and(|(_, port)| !port.is_empty() && port.chars().all(|c| c.is_ascii_digit()));
    if has_port {
        return Ok(authority.to_string());
    }
    let default_port = match scheme.as_deref() {
        Some("http") | Some("ws") => 80,
        Some("https") | Some("wss") => 443,
        _ => return Err(invalid("has no port")),
    };
    Ok(format!("{}:{}", authority, default_port))
}

struct Connection {
    address: String,
    stream: Option<TcpStream>,
}

impl Connection {
    fn connect(&mut self) -> std::io::Result<&mut TcpStream> {
        if self.stream.is_none() {
            let stream = TcpStream::connect(&self.address)?;
            stream.set_write_timeout(Some(IO_TIMEOUT))?;
            stream.set_read_timeout(Some(IO_TIMEOUT))?;
            stream.set_nodelay(true)?;
            self.stream = Some(stream);
        }
        match self.stream {
            Some(ref mut stream) => Ok(stream),
            None => Err(std::io::Error::from(std::io::ErrorKind::NotConnected)),
        }
    }

    /// Write `line`, reconnecting once if the first attempt fails
    fn send(&mut self, line: &str) -> std::io::Result<()> {
        let first = self.connect().and_then(|stream| stream.write_all(line.as_bytes()));
        if first.is_ok() {
            return Ok(());
        }
        self.stream = None;
        self.connect()?.write_all(line.as_bytes())
    }

    fn flush(&mut self) {
        if let Some(ref mut stream) = self.stream {
            if stream.flush().is_err() {
                self.stream = None;
            }
        }
    }
}

/// Queue-fed TCP writer running on its own thread
pub struct NetworkTransport {
    address: String,
    sender: Option<Sender<Message>>,
    handle: Option<thread::JoinHandle<()>>,
    failed: Arc<AtomicU64>,
}

impl NetworkTransport {
    pub fn new(address: impl Into<String>) -> Self {
        Self::with_queue_size(address, DEFAULT_QUEUE_SIZE)
    }

    pub fn with_queue_size(address: impl Into<String>, queue_size: usize) -> Self {
        let address = address.into();
        let (sender, receiver) = bounded::<Message>(queue_size);
        let failed = Arc::new(AtomicU64::new(0));
        let failed_clone = Arc::clone(&failed);
        let mut connection = Connection {
            address: address.clone(),
            stream: None,
        };

        let handle = thread::spawn(move || {
            while let Ok(message) = receiver.recv() {
                match message {
                    Message::Line(line) => {
                        if let Err(e) = connection.send(&line) {
                            let previous = failed_clone.fetch_add(1, Ordering::Relaxed);
                            if previous == 0 {
                                eprintln!(
                                    "[LOGGER ERROR] Failed to send log line to {}: {}",
                                    connection.address, e
                                );
                            }
                        }
                    }
                    Message::Flush(ack) => {
                        connection.flush();
                        let _ = ack.send(());
                    }
                }
            }
            connection.flush();
        });

        Self {
            address,
            sender: Some(sender),
            handle: Some(handle),
            failed,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Lines the worker could not deliver
    pub fn failed_count(&self) -> u64 {
        self.failed.load(Ordering::Relaxed)
    }

    /// Queue one line without blocking
    pub fn send(&self, line: String) -> Result<()> {
        let Some(ref sender) = self.sender else {
            return Err(LoggerError::ChannelSendError);
        };
        match sender.try_send(Message::Line(line)) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(LoggerError::sink_write(
                self.address.as_str(),
                "transport queue full, line dropped",
            )),
            Err(TrySendError::Disconnected(_)) => Err(LoggerError::ChannelSendError),
        }
    }

    /// Wait until every queued line has been handed to the socket
    pub fn flush(&self) -> Result<()> {
        let Some(ref sender) = self.sender else {
            return Ok(());
        };
        let (ack, done) = bounded(1);
        sender
            .send_timeout(Message::Flush(ack), DEFAULT_SHUTDOWN_TIMEOUT)
            .map_err(|_| LoggerError::ChannelSendError)?;
        done.recv_timeout(DEFAULT_SHUTDOWN_TIMEOUT).map_err(|_| {
            LoggerError::sink_write(self.address.as_str(), "transport flush timed out")
        })
    }

    /// Close the queue and wait up to `timeout` for the worker to drain it
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        drop(self.sender.take());

        let Some(handle) = self.handle.take() else {
            return true;
        };
        let start = Instant::now();
        loop {
            if handle.is_finished() {
                if let Err(e) = handle.join() {
                    eprintln!("[LOGGER ERROR] Transport worker panicked during shutdown: {:?}", e);
                    return false;
                }
                return true;
            }
            if start.elapsed() >= timeout {
                eprintln!(
                    "[LOGGER WARNING] Transport worker for {} did not finish within {:?}. \
                     Some logs may be lost.",
                    self.address, timeout
                );
                return false;
            }
            thread::sleep(Duration::from_millis(10));
        }
    }
}

impl Drop for NetworkTransport {
    fn drop(&mut self) {
        self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;

    #[test]
    fn test_parse_endpoint() {
        assert_eq!(parse_endpoint("http://collector:9000/logs").unwrap(), "collector:9000");
        assert_eq!(parse_endpoint("https://logs.example.com").unwrap(), "logs.example.com:443");
        assert_eq!(parse_endpoint("http://user:pw@host/x").unwrap(), "host:80");
        assert_eq!(parse_endpoint("127.0.0.1:5170").unwrap(), "127.0.0.1:5170");
        assert!(parse_endpoint("collector").is_err());
        assert!(parse_endpoint("http://").is_err());
    }

    #[test]
    fn test_lines_reach_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        let mut transport = NetworkTransport::new(address);

        transport.send("{\"n\":1}\n".to_string()).unwrap();
        transport.send("{\"n\":2}\n".to_string()).unwrap();
        transport.flush().unwrap();

        let (socket, _) = listener.accept().unwrap();
        let mut reader = BufReader::new(socket);
        let mut first = String::new();
        reader.read_line(&mut first).unwrap();
        let mut second = String::new();
        reader.read_line(&mut second).unwrap();
        assert_eq!(first, "{\"n\":1}\n");
        assert_eq!(second, "{\"n\":2}\n");

        assert!(transport.shutdown(DEFAULT_SHUTDOWN_TIMEOUT));
        assert_eq!(transport.failed_count(), 0);
    }

    #[test]
    fn test_unreachable_endpoint_counts_failures() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = listener.local_addr().unwrap().to_string();
        drop(listener);

        let transport = NetworkTransport::new(address);
        transport.send("lost\n".to_string()).unwrap();
        transport.flush().unwrap();
        assert_eq!(transport.failed_count(), 1);
    }

    #[test]
    fn test_send_after_shutdown_fails() {
        let mut transport = NetworkTransport::new("127.0.0.1:9");
        assert!(transport.shutdown(DEFAULT_SHUTDOWN_TIMEOUT));
        assert!(matches!(
            transport.send("late\n".to_string()),
            Err(LoggerError::ChannelSendError)
        ));
    }
}
