//! HTTP transport for the ingestion endpoint
//!
//! Posts each encoded batch to the configured URL. The request carries the
//! content encoding of the payload and the publish time in milliseconds; any
//! 2xx answer counts as delivered.

use crate::core::{Payload, Result, ShipperError, Transport};
use chrono::Utc;
use std::time::Duration;
use ureq::Agent;

/// Header carrying the client-side publish time (epoch milliseconds)
pub const PUBLISHED_TIMESTAMP_HEADER: &str = "X-Samsara-publishedTimestamp";

/// Blocking HTTP transport driven by the publisher thread
///
/// # Example
///
/// ```no_run
/// use rust_log_shipper::outputs::HttpTransport;
/// use rust_log_shipper::ShipperBuilder;
///
/// let transport = HttpTransport::new("https://ingest.example/v1");
/// let shipper = ShipperBuilder::new()
///     .endpoint_url("https://ingest.example/v1")
///     .build_with_transport(Box::new(transport));
/// shipper.info("shipped over HTTP");
/// ```
pub struct HttpTransport {
    agent: Agent,
    url: String,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        let agent: Agent = Agent::config_builder()
            // Non-2xx answers are inspected, not raised
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for HttpTransport {
    fn send(&mut self, payload: &Payload, timeout: Duration) -> Result<()> {
        let published_at = Utc::now().timestamp_millis().to_string();

        let response = self
            .agent
            .post(&self.url)
            .header("Accept", "application/json")
            .header("Content-Type", "application/json")
            .header("Content-Encoding", payload.content_encoding())
            .header(PUBLISHED_TIMESTAMP_HEADER, published_at)
            .config()
            .timeout_global(Some(timeout))
            .build()
            .send(payload.body())
            .map_err(|e| match e {
                ureq::Error::Timeout(_) => ShipperError::Timeout(timeout),
                other => ShipperError::from(other),
            })?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(ShipperError::rejected(status.as_u16(), payload.event_count()))
        }
    }

    fn name(&self) -> &str {
        "http"
    }
}
