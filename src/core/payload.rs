//! Wire encoding of batches
//!
//! A batch travels as a JSON array of events, gzip-compressed unless
//! compression is disabled.

use super::buffer::Batch;
use super::config::Compression;
use super::error::{Result, ShipperError};
use flate2::write::GzEncoder;
use std::io::Write;

/// Encoded request body plus what the receiver needs to decode it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    body: Vec<u8>,
    compression: Compression,
    events: usize,
}

impl Payload {
    /// Serialize and optionally compress a batch
    pub fn encode(batch: &Batch, compression: Compression) -> Result<Self> {
        let json = serde_json::to_vec(batch.events())?;
        let body = match compression {
            Compression::None => json,
            Compression::Gzip => gzip(&json)?,
        };
        Ok(Self {
            body,
            compression,
            events: batch.len(),
        })
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn compression(&self) -> Compression {
        self.compression
    }

    pub fn content_encoding(&self) -> &'static str {
        self.compression.content_encoding()
    }

    /// Number of events in the encoded batch
    pub fn event_count(&self) -> usize {
        self.events
    }
}

fn gzip(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::with_capacity(data.len() / 4), flate2::Compression::default());
    encoder
        .write_all(data)
        .map_err(|e| ShipperError::io_operation("compressing batch", e))?;
    encoder
        .finish()
        .map_err(|e| ShipperError::io_operation("finishing gzip stream", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::event::{Event, SourceIdentity};
    use crate::core::log_level::LogLevel;
    use flate2::read::GzDecoder;
    use std::io::Read;

    fn batch(n: usize) -> Batch {
        let identity = SourceIdentity {
            source_id: Some("host-1".to_string()),
            ..SourceIdentity::default()
        };
        (0..n)
            .map(|i| Event::new(LogLevel::Info, format!("event {}", i), &identity))
            .collect::<Vec<_>>()
            .into()
    }

    #[test]
    fn test_identity_payload_is_json_array() {
        let payload = Payload::encode(&batch(3), Compression::None).unwrap();
        assert_eq!(payload.content_encoding(), "identity");
        assert_eq!(payload.event_count(), 3);

        let value: serde_json::Value = serde_json::from_slice(payload.body()).unwrap();
        let array = value.as_array().unwrap();
        assert_eq!(array.len(), 3);
        assert_eq!(array[2]["message"], "event 2");
        assert_eq!(array[0]["sourceId"], "host-1");
    }

    #[test]
    fn test_gzip_payload_decompresses() {
        let payload = Payload::encode(&batch(50), Compression::Gzip).unwrap();
        assert_eq!(payload.content_encoding(), "gzip");

        let mut json = String::new();
        GzDecoder::new(payload.body()).read_to_string(&mut json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 50);
    }
}
