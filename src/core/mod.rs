//! Core shipping types: events, configuration, buffering and the publisher

pub mod attributes;
pub mod buffer;
pub mod config;
pub mod error;
pub mod event;
pub mod log_level;
pub mod metrics;
pub mod overflow_policy;
pub mod payload;
pub mod publisher;
pub mod shipper;
pub mod transport;
pub mod warning;

pub use attributes::{Attributes, FieldValue};
pub use buffer::{AddOutcome, Batch, BatchBuffer};
pub use config::{
    ClientConfig, Compression, ConsoleFormat, ShipperBuilder, DEFAULT_MAX_BUFFER_SIZE,
    DEFAULT_MIN_BUFFER_SIZE, DEFAULT_PUBLISH_INTERVAL, DEFAULT_SEND_TIMEOUT,
    DEFAULT_SHUTDOWN_TIMEOUT, ENV_APP_ID, ENV_COMPRESSION, ENV_CONSOLE, ENV_CONSOLE_FORMAT,
    ENV_ENDPOINT_URL, ENV_MAX_BUFFER_SIZE, ENV_MIN_BUFFER_SIZE, ENV_PUBLISH_INTERVAL_MS,
    ENV_SEND_TIMEOUT_MS, ENV_SERVICE_NAME, ENV_SOURCE_ID, MAX_PUBLISH_INTERVAL,
    MIN_PUBLISH_INTERVAL,
};
pub use error::{Result, ShipperError};
pub use event::{ErrorInfo, Event, SourceIdentity};
pub use log_level::LogLevel;
pub use metrics::ShipperMetrics;
pub use overflow_policy::OverflowPolicy;
pub use payload::Payload;
pub use publisher::{is_sending, FlushTrigger, PublisherState};
pub use shipper::Shipper;
pub use transport::{EventSink, Transport};
pub use warning::WarningReporter;
