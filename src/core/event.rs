//! Event model shared by every adapter
//!
//! An [`Event`] is the single representation of a log occurrence inside the
//! shipper. Adapters never build the wire format themselves: they hand the
//! shipper a level, a formatted message, an optional [`ErrorInfo`] and
//! [`Attributes`], and the shipper stamps the time and the identifiers.

use super::attributes::Attributes;
use super::log_level::LogLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::backtrace::{Backtrace, BacktraceStatus};
use std::error::Error as StdError;

/// Identifiers copied from configuration onto every event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceIdentity {
    pub source_id: Option<String>,
    pub app_id: Option<String>,
    pub service_name: Option<String>,
}

/// Structured failure information attached to error events
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub kind: Option<String>,
    /// Messages of the `source()` chain, outermost first
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub causes: Vec<String>,
    /// One entry per stack frame
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub stack: Vec<String>,
}

impl ErrorInfo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    /// Build from any error, walking its `source()` chain
    pub fn from_error(err: &(dyn StdError + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut current = err.source();
        while let Some(cause) = current {
            causes.push(cause.to_string());
            current = cause.source();
        }
        Self {
            message: err.to_string(),
            kind: None,
            causes,
            stack: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    #[must_use]
    pub fn with_frames<I, S>(mut self, frames: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stack = frames.into_iter().map(Into::into).collect();
        self
    }

    /// Attach the frames of a captured backtrace
    ///
    /// Backtraces that were not captured (`RUST_BACKTRACE` unset) leave the
    /// stack empty.
    #[must_use]
    pub fn with_backtrace(mut self, backtrace: &Backtrace) -> Self {
        if backtrace.status() == BacktraceStatus::Captured {
            self.stack = backtrace
                .to_string()
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect();
        }
        self
    }
}

/// One log occurrence, immutable once handed to the buffer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    #[serde(with = "chrono::serde::ts_milliseconds")]
    timestamp: DateTime<Utc>,
    level: LogLevel,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    error: Option<ErrorInfo>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    source_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    app_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    service_name: Option<String>,
    #[serde(skip_serializing_if = "Attributes::is_empty", default)]
    attributes: Attributes,
}

impl Event {
    /// Create an event stamped with the current time
    pub fn new(level: LogLevel, message: impl Into<String>, identity: &SourceIdentity) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message: message.into(),
            error: None,
            source_id: identity.source_id.clone(),
            app_id: identity.app_id.clone(),
            service_name: identity.service_name.clone(),
            attributes: Attributes::new(),
        }
    }

    #[must_use]
    pub fn with_error(mut self, error: Option<ErrorInfo>) -> Self {
        self.error = error;
        self
    }

    #[must_use]
    pub fn with_attributes(mut self, attributes: Attributes) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn level(&self) -> LogLevel {
        self.level
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    pub fn source_id(&self) -> Option<&str> {
        self.source_id.as_deref()
    }

    pub fn app_id(&self) -> Option<&str> {
        self.app_id.as_deref()
    }

    pub fn service_name(&self) -> Option<&str> {
        self.service_name.as_deref()
    }

    pub fn attributes(&self) -> &Attributes {
        &self.attributes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Inner;

    impl fmt::Display for Inner {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "connection refused")
        }
    }

    impl StdError for Inner {}

    #[derive(Debug)]
    struct Outer(Inner);

    impl fmt::Display for Outer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "failed to load user")
        }
    }

    impl StdError for Outer {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    fn identity() -> SourceIdentity {
        SourceIdentity {
            source_id: Some("host-1".to_string()),
            app_id: None,
            service_name: Some("billing".to_string()),
        }
    }

    #[test]
    fn test_error_info_walks_source_chain() {
        let info = ErrorInfo::from_error(&Outer(Inner));
        assert_eq!(info.message, "failed to load user");
        assert_eq!(info.causes, vec!["connection refused".to_string()]);
    }

    #[test]
    fn test_wire_shape_omits_absent_fields() {
        let event = Event::new(LogLevel::Info, "started", &identity());
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["level"], "INFO");
        assert_eq!(json["message"], "started");
        assert_eq!(json["sourceId"], "host-1");
        assert_eq!(json["serviceName"], "billing");
        assert!(json["timestamp"].is_i64());
        assert!(json.get("appId").is_none());
        assert!(json.get("error").is_none());
        assert!(json.get("attributes").is_none());
    }

    #[test]
    fn test_wire_shape_with_error_and_attributes() {
        let event = Event::new(LogLevel::Error, "boom", &identity())
            .with_error(Some(
                ErrorInfo::new("disk full")
                    .with_kind("IoError")
                    .with_frames(["at write()", "at flush()"]),
            ))
            .with_attributes(Attributes::new().with_field("logger", "storage"));
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["error"]["message"], "disk full");
        assert_eq!(json["error"]["kind"], "IoError");
        assert_eq!(json["error"]["stack"][1], "at flush()");
        assert_eq!(json["attributes"]["logger"], "storage");
    }

    #[test]
    fn test_timestamp_is_epoch_millis() {
        let event = Event::new(LogLevel::Debug, "tick", &SourceIdentity::default());
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["timestamp"].as_i64(), Some(event.timestamp().timestamp_millis()));
    }
}
