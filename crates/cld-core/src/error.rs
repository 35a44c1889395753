//! Error types module
//!
//! Every fallible operation in the client reports a `CloudinaryError`. Local
//! failures (configuration, arguments) are returned synchronously before any
//! network call; transport and service failures are delivered through the
//! completion path of an upload operation.

use std::io;

/// Log level for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    /// Debug level - for expected errors like invalid arguments
    Debug,
    /// Warning level - for recoverable issues like timeouts
    Warn,
    /// Error level - for unexpected failures
    Error,
}

/// Metadata describing how an error should be reported to callers and logs.
pub trait ErrorMetadata {
    /// Machine-readable error code (e.g., "CONFIGURATION_ERROR")
    fn error_code(&self) -> &'static str;

    /// Whether retrying the same call may succeed
    fn is_recoverable(&self) -> bool;

    /// Log level for this error
    fn log_level(&self) -> LogLevel;
}

#[derive(Debug, thiserror::Error)]
pub enum CloudinaryError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Service error ({status}): {message}")]
    Service { status: u16, message: String },

    #[error("Operation cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid response body: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, CloudinaryError>;

impl CloudinaryError {
    pub fn config(msg: impl Into<String>) -> Self {
        CloudinaryError::Configuration(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        CloudinaryError::InvalidArgument(msg.into())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, CloudinaryError::Cancelled)
    }
}

impl ErrorMetadata for CloudinaryError {
    fn error_code(&self) -> &'static str {
        match self {
            CloudinaryError::Configuration(_) => "CONFIGURATION_ERROR",
            CloudinaryError::InvalidArgument(_) => "INVALID_ARGUMENT",
            CloudinaryError::Transport(_) => "TRANSPORT_ERROR",
            CloudinaryError::Service { .. } => "SERVICE_ERROR",
            CloudinaryError::Cancelled => "CANCELLED",
            CloudinaryError::Io(_) => "IO_ERROR",
            CloudinaryError::Json(_) => "INVALID_RESPONSE",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            CloudinaryError::Transport(_) => true,
            CloudinaryError::Service { status, .. } => *status >= 500 || *status == 420 || *status == 429,
            _ => false,
        }
    }

    fn log_level(&self) -> LogLevel {
        match self {
            CloudinaryError::InvalidArgument(_) | CloudinaryError::Cancelled => LogLevel::Debug,
            CloudinaryError::Transport(_) | CloudinaryError::Service { .. } => LogLevel::Warn,
            CloudinaryError::Configuration(_) | CloudinaryError::Io(_) | CloudinaryError::Json(_) => {
                LogLevel::Error
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_status_and_message() {
        let err = CloudinaryError::Service {
            status: 404,
            message: "Resource not found - sample".to_string(),
        };
        assert_eq!(err.to_string(), "Service error (404): Resource not found - sample");
        assert_eq!(err.error_code(), "SERVICE_ERROR");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn test_recoverable_errors() {
        assert!(CloudinaryError::Transport("timed out".into()).is_recoverable());
        assert!(CloudinaryError::Service {
            status: 503,
            message: "unavailable".into()
        }
        .is_recoverable());
        assert!(!CloudinaryError::config("missing cloud name").is_recoverable());
        assert!(!CloudinaryError::Cancelled.is_recoverable());
    }

    #[test]
    fn test_io_conversion() {
        let err: CloudinaryError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.error_code(), "IO_ERROR");
        assert_eq!(err.log_level(), LogLevel::Error);
    }
}
