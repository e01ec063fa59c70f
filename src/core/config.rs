//! Client configuration and its resolver
//!
//! [`ShipperBuilder`] records explicit overrides only. Resolution fills every
//! field with the first value found in this order:
//!
//! 1. the value set on the builder,
//! 2. the matching `LOG_SHIPPER_*` environment variable,
//! 3. the built-in default.
//!
//! The result is a frozen [`ClientConfig`]; nothing mutates it afterwards.

use super::error::ShipperError;
use super::event::SourceIdentity;
use super::overflow_policy::OverflowPolicy;
use super::transport::EventSink;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub const ENV_ENDPOINT_URL: &str = "LOG_SHIPPER_ENDPOINT_URL";
pub const ENV_SOURCE_ID: &str = "LOG_SHIPPER_SOURCE_ID";
pub const ENV_APP_ID: &str = "LOG_SHIPPER_APP_ID";
pub const ENV_SERVICE_NAME: &str = "LOG_SHIPPER_SERVICE_NAME";
pub const ENV_PUBLISH_INTERVAL_MS: &str = "LOG_SHIPPER_PUBLISH_INTERVAL_MS";
pub const ENV_MIN_BUFFER_SIZE: &str = "LOG_SHIPPER_MIN_BUFFER_SIZE";
pub const ENV_MAX_BUFFER_SIZE: &str = "LOG_SHIPPER_MAX_BUFFER_SIZE";
pub const ENV_SEND_TIMEOUT_MS: &str = "LOG_SHIPPER_SEND_TIMEOUT_MS";
pub const ENV_COMPRESSION: &str = "LOG_SHIPPER_COMPRESSION";
pub const ENV_CONSOLE: &str = "LOG_SHIPPER_CONSOLE";
pub const ENV_CONSOLE_FORMAT: &str = "LOG_SHIPPER_CONSOLE_FORMAT";

pub const DEFAULT_PUBLISH_INTERVAL: Duration = Duration::from_secs(30);
pub const DEFAULT_MIN_BUFFER_SIZE: usize = 100;
pub const DEFAULT_MAX_BUFFER_SIZE: usize = 10_000;
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Default deadline for the final flush when a shipper is dropped
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Shortest accepted publish interval
pub const MIN_PUBLISH_INTERVAL: Duration = Duration::from_millis(10);

/// Longest accepted publish interval; the publisher schedules wake-ups as
/// `Instant + interval`, which must not overflow
pub const MAX_PUBLISH_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Payload compression applied before transmission
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    None,
    #[default]
    Gzip,
}

impl Compression {
    /// Value of the `Content-Encoding` header for this scheme
    pub fn content_encoding(&self) -> &'static str {
        match self {
            Compression::None => "identity",
            Compression::Gzip => "gzip",
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Gzip => write!(f, "gzip"),
        }
    }
}

impl FromStr for Compression {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "none" | "identity" => Ok(Compression::None),
            "gzip" => Ok(Compression::Gzip),
            _ => Err(format!("Invalid compression: '{}' (expected gzip or none)", s)),
        }
    }
}

/// Line format of the console fallback
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsoleFormat {
    /// Example: `[2025-01-08T10:30:45.123Z] [INFO ] billing - Request processed`
    #[default]
    Text,
    /// The event's wire JSON, one object per line
    Json,
}

impl FromStr for ConsoleFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" => Ok(ConsoleFormat::Text),
            "json" => Ok(ConsoleFormat::Json),
            _ => Err(format!("Invalid console format: '{}' (expected text or json)", s)),
        }
    }
}

/// Resolved, immutable client settings
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    endpoint_url: Option<String>,
    identity: SourceIdentity,
    publish_interval: Duration,
    min_buffer_size: usize,
    max_buffer_size: usize,
    send_timeout: Duration,
    compression: Compression,
    console_enabled: bool,
    console_format: ConsoleFormat,
    overflow_policy: OverflowPolicy,
    auto_start: bool,
    shutdown_timeout: Duration,
}

impl ClientConfig {
    /// `None` when remote shipping is disabled
    pub fn endpoint_url(&self) -> Option<&str> {
        self.endpoint_url.as_deref()
    }

    pub fn is_remote_enabled(&self) -> bool {
        self.endpoint_url.is_some()
    }

    pub fn identity(&self) -> &SourceIdentity {
        &self.identity
    }

    pub fn source_id(&self) -> Option<&str> {
        self.identity.source_id.as_deref()
    }

    pub fn app_id(&self) -> Option<&str> {
        self.identity.app_id.as_deref()
    }

    pub fn service_name(&self) -> Option<&str> {
        self.identity.service_name.as_deref()
    }

    pub fn publish_interval(&self) -> Duration {
        self.publish_interval
    }

    pub fn min_buffer_size(&self) -> usize {
        self.min_buffer_size
    }

    pub fn max_buffer_size(&self) -> usize {
        self.max_buffer_size
    }

    /// Per-transmission deadline, always shorter than the publish interval
    pub fn send_timeout(&self) -> Duration {
        self.send_timeout
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn console_enabled(&self) -> bool {
        self.console_enabled
    }

    pub fn console_format(&self) -> ConsoleFormat {
        self.console_format
    }

    pub fn overflow_policy(&self) -> OverflowPolicy {
        self.overflow_policy
    }

    pub fn auto_start(&self) -> bool {
        self.auto_start
    }

    pub fn shutdown_timeout(&self) -> Duration {
        self.shutdown_timeout
    }
}

impl Default for ClientConfig {
    /// Defaults only, environment ignored
    fn default() -> Self {
        ShipperBuilder::new().resolve_with(|_| None)
    }
}

/// Staged builder for [`ClientConfig`] and the shipper engine
///
/// # Example
///
/// ```
/// use rust_log_shipper::{Compression, ShipperBuilder};
/// use std::time::Duration;
///
/// let config = ShipperBuilder::new()
///     .endpoint_url("https://ingest.example/v1")
///     .source_id("web-01")
///     .min_buffer_size(10)
///     .max_buffer_size(100)
///     .publish_interval(Duration::from_secs(5))
///     .compression(Compression::None)
///     .resolve_with(|_| None);
///
/// assert!(config.is_remote_enabled());
/// assert_eq!(config.max_buffer_size(), 100);
/// assert!(!config.console_enabled());
/// ```
#[derive(Clone, Default)]
pub struct ShipperBuilder {
    endpoint_url: Option<String>,
    source_id: Option<String>,
    app_id: Option<String>,
    service_name: Option<String>,
    publish_interval: Option<Duration>,
    min_buffer_size: Option<usize>,
    max_buffer_size: Option<usize>,
    send_timeout: Option<Duration>,
    compression: Option<Compression>,
    console_enabled: Option<bool>,
    console_format: Option<ConsoleFormat>,
    overflow_policy: Option<OverflowPolicy>,
    auto_start: Option<bool>,
    shutdown_timeout: Option<Duration>,
    pub(crate) console_sink: Option<Arc<dyn EventSink>>,
}

impl ShipperBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ingestion endpoint; a blank value disables remote shipping
    #[must_use = "builder methods return a new value"]
    pub fn endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.endpoint_url = Some(url.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn source_id(mut self, source_id: impl Into<String>) -> Self {
        self.source_id = Some(source_id.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn app_id(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn service_name(mut self, service_name: impl Into<String>) -> Self {
        self.service_name = Some(service_name.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn publish_interval(mut self, interval: Duration) -> Self {
        self.publish_interval = Some(interval);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn min_buffer_size(mut self, size: usize) -> Self {
        self.min_buffer_size = Some(size);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn max_buffer_size(mut self, size: usize) -> Self {
        self.max_buffer_size = Some(size);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = Some(timeout);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn compression(mut self, compression: Compression) -> Self {
        self.compression = Some(compression);
        self
    }

    /// Echo events to the console, independently of remote shipping
    ///
    /// Defaults to `true` only when remote shipping is disabled.
    #[must_use = "builder methods return a new value"]
    pub fn console(mut self, enabled: bool) -> Self {
        self.console_enabled = Some(enabled);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn console_format(mut self, format: ConsoleFormat) -> Self {
        self.console_format = Some(format);
        self
    }

    /// Replace the stdout/stderr console with a custom sink
    #[must_use = "builder methods return a new value"]
    pub fn console_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.console_sink = Some(sink);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn overflow_policy(mut self, policy: OverflowPolicy) -> Self {
        self.overflow_policy = Some(policy);
        self
    }

    /// Start the publisher thread as part of `build()` (default `true`)
    #[must_use = "builder methods return a new value"]
    pub fn auto_start(mut self, auto_start: bool) -> Self {
        self.auto_start = Some(auto_start);
        self
    }

    /// Final-flush deadline used when the shipper is dropped
    #[must_use = "builder methods return a new value"]
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = Some(timeout);
        self
    }

    /// Resolve against the process environment
    pub fn resolve(&self) -> ClientConfig {
        self.resolve_with(|key| std::env::var(key).ok())
    }

    /// Resolve against a custom variable lookup
    pub fn resolve_with<F>(&self, lookup: F) -> ClientConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvLookup { lookup };

        let endpoint_url = self
            .endpoint_url
            .clone()
            .or_else(|| env.string(ENV_ENDPOINT_URL))
            .map(|url| url.trim().to_string())
            .filter(|url| !url.is_empty());

        let identity = SourceIdentity {
            source_id: non_blank(self.source_id.clone().or_else(|| env.string(ENV_SOURCE_ID))),
            app_id: non_blank(self.app_id.clone().or_else(|| env.string(ENV_APP_ID))),
            service_name: non_blank(
                self.service_name
                    .clone()
                    .or_else(|| env.string(ENV_SERVICE_NAME)),
            ),
        };

        let publish_interval = self
            .publish_interval
            .or_else(|| env.parsed::<u64>(ENV_PUBLISH_INTERVAL_MS).map(Duration::from_millis))
            .unwrap_or(DEFAULT_PUBLISH_INTERVAL)
            .clamp(MIN_PUBLISH_INTERVAL, MAX_PUBLISH_INTERVAL);

        let max_buffer_size = self
            .max_buffer_size
            .or_else(|| env.parsed(ENV_MAX_BUFFER_SIZE))
            .unwrap_or(DEFAULT_MAX_BUFFER_SIZE)
            .max(1);

        let min_buffer_size = self
            .min_buffer_size
            .or_else(|| env.parsed(ENV_MIN_BUFFER_SIZE))
            .unwrap_or(DEFAULT_MIN_BUFFER_SIZE)
            .min(max_buffer_size);

        // Keep a transmission from overlapping the next flush cycle
        let send_timeout = self
            .send_timeout
            .or_else(|| env.parsed::<u64>(ENV_SEND_TIMEOUT_MS).map(Duration::from_millis))
            .unwrap_or(DEFAULT_SEND_TIMEOUT)
            .min(publish_interval.mul_f64(0.9));

        let compression = self
            .compression
            .or_else(|| env.parsed(ENV_COMPRESSION))
            .unwrap_or_default();

        let console_enabled = self
            .console_enabled
            .or_else(|| env.flag(ENV_CONSOLE))
            .unwrap_or(endpoint_url.is_none());

        let console_format = self
            .console_format
            .or_else(|| env.parsed(ENV_CONSOLE_FORMAT))
            .unwrap_or_default();

        ClientConfig {
            endpoint_url,
            identity,
            publish_interval,
            min_buffer_size,
            max_buffer_size,
            send_timeout,
            compression,
            console_enabled,
            console_format,
            overflow_policy: self
                .overflow_policy
                .unwrap_or_default()
                .normalized(max_buffer_size),
            auto_start: self.auto_start.unwrap_or(true),
            shutdown_timeout: self.shutdown_timeout.unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT),
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

struct EnvLookup<F> {
    lookup: F,
}

impl<F> EnvLookup<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn string(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
    }

    /// Parse a variable, ignoring malformed values
    fn parsed<T>(&self, key: &str) -> Option<T>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        let raw = self.string(key)?;
        match raw.trim().parse::<T>() {
            Ok(value) => Some(value),
            Err(e) => {
                let err = ShipperError::config(key, format!("ignoring {:?}: {}", raw, e));
                eprintln!("[LOG SHIPPER WARNING] {}", err);
                None
            }
        }
    }

    fn flag(&self, key: &str) -> Option<bool> {
        let raw = self.string(key)?;
        match raw.trim().to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => {
                let err = ShipperError::config(key, format!("ignoring {:?}: expected a boolean", raw));
                eprintln!("[LOG SHIPPER WARNING] {}", err);
                None
            }
        }
    }
}
