//! # Rust Log Shipper
//!
//! A buffered, batching log event shipper. Logging front-ends hand records to
//! a shared [`Shipper`], which stamps them with time and source identity,
//! buffers them and ships them in batches from a background thread to a
//! remote ingestion endpoint.
//!
//! ## Features
//!
//! - **Non-blocking submit**: callers never wait on network I/O
//! - **Size and time triggers**: batches ship when the buffer fills or events go stale
//! - **Console fallback**: without an endpoint, or when a batch cannot be delivered
//! - **`log` bridge**: forward records from the `log` facade (`log-bridge` feature)
//!
//! ## Example
//!
//! ```no_run
//! use rust_log_shipper::prelude::*;
//! use std::time::Duration;
//!
//! let shipper = Shipper::builder()
//!     .endpoint_url("https://ingest.example/v1")
//!     .source_id("web-01")
//!     .app_id("shop")
//!     .build();
//!
//! shipper.log_with_attributes(
//!     LogLevel::Info,
//!     "checkout complete",
//!     Attributes::new().with_field("order_id", 1042),
//! );
//!
//! shipper.stop(Duration::from_secs(5));
//! ```

pub mod adapters;
pub mod core;
pub mod macros;
pub mod outputs;

pub mod prelude {
    pub use crate::adapters::{EventAdapter, Submission};
    pub use crate::core::{
        Attributes, ClientConfig, Compression, ConsoleFormat, ErrorInfo, Event, EventSink,
        FieldValue, LogLevel, OverflowPolicy, Result, Shipper, ShipperBuilder, ShipperError,
        ShipperMetrics, SourceIdentity, Transport,
    };
    pub use crate::outputs::{ConsoleSink, HttpTransport};
}

pub use adapters::{EventAdapter, Submission};
pub use core::{
    AddOutcome, Attributes, Batch, BatchBuffer, ClientConfig, Compression, ConsoleFormat,
    ErrorInfo, Event, EventSink, FieldValue, FlushTrigger, LogLevel, OverflowPolicy, Payload,
    PublisherState, Result, Shipper, ShipperBuilder, ShipperError, ShipperMetrics, SourceIdentity,
    Transport, WarningReporter, DEFAULT_SHUTDOWN_TIMEOUT,
};
pub use outputs::{ConsoleSink, HttpTransport};
