//! Front-end adapters
//!
//! An adapter turns a record from some logging front-end into a
//! [`Submission`], which the shipper then stamps with time and source
//! identity.

#[cfg(feature = "log-bridge")]
pub mod log_bridge;

#[cfg(feature = "log-bridge")]
pub use log_bridge::LogBridge;

use crate::core::{Attributes, ErrorInfo, LogLevel};

/// Everything an adapter knows about one occurrence
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submission {
    pub level: LogLevel,
    /// `None` is recorded as an empty message
    pub message: Option<String>,
    pub error: Option<ErrorInfo>,
    pub attributes: Attributes,
}

impl Submission {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: Some(message.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_error(mut self, error: ErrorInfo) -> Self {
        self.error = Some(error);
        self
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }
}

/// Translates native records of type `N` for [`Shipper::dispatch`]
///
/// [`Shipper::dispatch`]: crate::core::Shipper::dispatch
///
/// # Example
///
/// ```
/// use rust_log_shipper::adapters::{EventAdapter, Submission};
/// use rust_log_shipper::{Attributes, LogLevel};
///
/// struct Syslog;
///
/// impl EventAdapter<(u8, String)> for Syslog {
///     fn translate(&self, record: &(u8, String)) -> Submission {
///         let level = if record.0 <= 3 { LogLevel::Error } else { LogLevel::Info };
///         Submission::new(level, record.1.clone())
///             .with_attributes(Attributes::new().with_field("severity", record.0 as i64))
///     }
/// }
///
/// let submission = Syslog.translate(&(2, "disk failure".to_string()));
/// assert_eq!(submission.level, LogLevel::Error);
/// ```
pub trait EventAdapter<N: ?Sized> {
    fn translate(&self, native: &N) -> Submission;
}
