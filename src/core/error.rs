//! Error types for the log router

pub type Result<T> = std::result::Result<T, LoggerError>;

#[derive(Debug, thiserror::Error)]
pub enum LoggerError {
    /// No rule resolved for a logger name
    #[error("Configuration error: no rules for logger '{logger}'")]
    NoRules { logger: String },

    /// A rule references an output mode absent from the target configuration
    #[error("Configuration error: unknown output mode '{mode}'")]
    UnknownOutputMode { mode: String },

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Log directory path rejected by the provisioner
    #[error("Invalid log path, path contains invalid characters: {path}")]
    InvalidPath { path: String },

    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Write failure on a single sink
    #[error("Sink '{sink}' write failed: {message}")]
    SinkWrite { sink: String, message: String },

    /// File sink error with path
    #[error("File sink error for '{path}': {message}")]
    FileSinkError { path: String, message: String },

    /// File rotation error
    #[error("File rotation failed for '{path}': {message}")]
    FileRotationError { path: String, message: String },

    /// Channel send error
    #[error("Failed to hand log line to transport worker")]
    ChannelSendError,

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl LoggerError {
    /// Create a missing-rules configuration error
    pub fn no_rules(logger: impl Into<String>) -> Self {
        LoggerError::NoRules {
            logger: logger.into(),
        }
    }

    /// Create an unknown output mode configuration error
    pub fn unknown_output_mode(mode: impl Into<String>) -> Self {
        LoggerError::UnknownOutputMode { mode: mode.into() }
    }

    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        LoggerError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn invalid_path(path: impl Into<String>) -> Self {
        LoggerError::InvalidPath { path: path.into() }
    }

    /// Create a sink write error
    pub fn sink_write(sink: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::SinkWrite {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Create a file sink error
    pub fn file_sink(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileSinkError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a file rotation error
    pub fn file_rotation(path: impl Into<String>, message: impl Into<String>) -> Self {
        LoggerError::FileRotationError {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a generic error
    pub fn other<S: Into<String>>(msg: S) -> Self {
        LoggerError::Other(msg.into())
    }

    /// Whether this error must abort logger construction
    pub fn is_config_error(&self) -> bool {
        matches!(
            self,
            LoggerError::NoRules { .. }
                | LoggerError::UnknownOutputMode { .. }
                | LoggerError::InvalidConfiguration { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = LoggerError::no_rules("payments");
        assert!(matches!(err, LoggerError::NoRules { .. }));
        assert!(err.is_config_error());

        let err = LoggerError::unknown_output_mode("syslog");
        assert!(matches!(err, LoggerError::UnknownOutputMode { .. }));
        assert!(err.is_config_error());

        let err = LoggerError::sink_write("console", "broken pipe");
        assert!(!err.is_config_error());
    }

    #[test]
    fn test_error_display() {
        let err = LoggerError::no_rules("payments");
        assert_eq!(
            err.to_string(),
            "Configuration error: no rules for logger 'payments'"
        );

        let err = LoggerError::unknown_output_mode("syslog");
        assert_eq!(
            err.to_string(),
            "Configuration error: unknown output mode 'syslog'"
        );

        let err = LoggerError::file_rotation("/var/log/app.log", "Disk full");
        assert_eq!(
            err.to_string(),
            "File rotation failed for '/var/log/app.log': Disk full"
        );
    }

    #[test]
    fn test_io_operation_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = LoggerError::io_operation("writing log file", "cannot write to file", io_err);

        assert!(matches!(err, LoggerError::IoOperation { .. }));
        assert!(err.to_string().contains("writing log file"));
        assert!(err.to_string().contains("cannot write to file"));
    }
}
