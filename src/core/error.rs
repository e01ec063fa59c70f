//! Error types for the shipper
//!
//! None of these ever reach the caller of `submit`; they flow between the
//! publisher, transports and sinks and end up in the warning reporter.

use std::time::Duration;

pub type Result<T> = std::result::Result<T, ShipperError>;

#[derive(Debug, thiserror::Error)]
pub enum ShipperError {
    /// IO error with context
    #[error("IO error while {operation}: {source}")]
    IoOperation {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// HTTP client error (connect, TLS, timeout, protocol)
    #[error("HTTP error: {0}")]
    HttpError(#[from] ureq::Error),

    /// The endpoint answered with a non-success status
    #[error("Endpoint rejected batch of {events} events with status {status}")]
    Rejected { status: u16, events: usize },

    /// Transmission exceeded its deadline
    #[error("Transmission timed out after {0:?}")]
    Timeout(Duration),

    /// Invalid configuration value with details
    #[error("Invalid configuration for {key}: {message}")]
    InvalidConfiguration { key: String, message: String },

    /// Shipper already stopped
    #[error("Shipper already stopped")]
    Stopped,

    /// A transport or sink panicked
    #[error("{component} panicked: {message}")]
    Panicked { component: String, message: String },

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl ShipperError {
    pub fn io_operation(operation: impl Into<String>, source: std::io::Error) -> Self {
        ShipperError::IoOperation {
            operation: operation.into(),
            source,
        }
    }

    pub fn rejected(status: u16, events: usize) -> Self {
        ShipperError::Rejected { status, events }
    }

    pub fn config(key: impl Into<String>, message: impl Into<String>) -> Self {
        ShipperError::InvalidConfiguration {
            key: key.into(),
            message: message.into(),
        }
    }

    pub fn panicked(component: impl Into<String>, message: impl Into<String>) -> Self {
        ShipperError::Panicked {
            component: component.into(),
            message: message.into(),
        }
    }

    pub fn other<S: Into<String>>(msg: S) -> Self {
        ShipperError::Other(msg.into())
    }

    /// Extract a readable message from a `catch_unwind` payload
    pub(crate) fn from_panic(
        component: impl Into<String>,
        payload: Box<dyn std::any::Any + Send>,
    ) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "Unknown panic".to_string()
        };
        Self::panicked(component, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ShipperError::rejected(503, 12);
        assert_eq!(
            err.to_string(),
            "Endpoint rejected batch of 12 events with status 503"
        );

        let err = ShipperError::config("LOG_SHIPPER_COMPRESSION", "expected gzip or none");
        assert_eq!(
            err.to_string(),
            "Invalid configuration for LOG_SHIPPER_COMPRESSION: expected gzip or none"
        );
    }

    #[test]
    fn test_io_operation_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "pipe closed");
        let err = ShipperError::io_operation("writing to console", io_err);
        assert!(matches!(err, ShipperError::IoOperation { .. }));
        assert!(err.to_string().contains("writing to console"));
    }

    #[test]
    fn test_from_panic_payload() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("transport exploded");
        let err = ShipperError::from_panic("transport", payload);
        assert_eq!(err.to_string(), "transport panicked: transport exploded");

        let payload: Box<dyn std::any::Any + Send> = Box::new(42u8);
        let err = ShipperError::from_panic("sink", payload);
        assert_eq!(err.to_string(), "sink panicked: Unknown panic");
    }
}
