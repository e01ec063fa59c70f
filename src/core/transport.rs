//! Output seams of the shipper
//!
//! [`Transport`] carries encoded batches to the remote endpoint and is owned
//! by the publisher thread. [`EventSink`] receives single events for local
//! output and is shared by every producer.

use super::{error::Result, event::Event, payload::Payload};
use std::time::Duration;

/// Delivery of an encoded batch to the ingestion endpoint
///
/// # Example
///
/// ```
/// use rust_log_shipper::core::{Payload, Result, Transport};
/// use std::time::Duration;
///
/// struct DiscardTransport;
///
/// impl Transport for DiscardTransport {
///     fn send(&mut self, _payload: &Payload, _timeout: Duration) -> Result<()> {
///         Ok(())
///     }
///
///     fn name(&self) -> &str {
///         "discard"
///     }
/// }
/// ```
pub trait Transport: Send {
    /// Deliver one payload, giving up after `timeout`
    fn send(&mut self, payload: &Payload, timeout: Duration) -> Result<()>;

    fn name(&self) -> &str;
}

/// Local destination for individual events
pub trait EventSink: Send + Sync {
    fn write(&self, event: &Event) -> Result<()>;
    fn flush(&self) -> Result<()>;
    fn name(&self) -> &str;
}
