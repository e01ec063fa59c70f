//! Shared fixtures for the integration tests

#![allow(dead_code)]

use flate2::read::GzDecoder;
use parking_lot::Mutex;
use rust_log_shipper::core::{
    Compression, Event, EventSink, Payload, Result, ShipperError, Transport,
};
use std::io::Read;
use std::net::TcpListener;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Decode a request body into its JSON events
pub fn decode_body(body: &[u8], compression: Compression) -> Vec<serde_json::Value> {
    let json = match compression {
        Compression::Gzip => {
            let mut decoded = Vec::new();
            GzDecoder::new(body)
                .read_to_end(&mut decoded)
                .expect("body is not valid gzip");
            decoded
        }
        Compression::None => body.to_vec(),
    };
    serde_json::from_slice(&json).expect("body is not a JSON array")
}

/// Transport that keeps every batch it was given
#[derive(Clone, Default)]
pub struct RecordingTransport {
    batches: Arc<Mutex<Vec<Vec<serde_json::Value>>>>,
    failing: Arc<AtomicBool>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let transport = Self::default();
        transport.set_failing(true);
        transport
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn batches(&self) -> Vec<Vec<serde_json::Value>> {
        self.batches.lock().clone()
    }

    pub fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().iter().map(Vec::len).collect()
    }

    pub fn total_events(&self) -> usize {
        self.batches.lock().iter().map(Vec::len).sum()
    }
}

impl Transport for RecordingTransport {
    fn send(&mut self, payload: &Payload, _timeout: Duration) -> Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ShipperError::rejected(503, payload.event_count()));
        }
        let events = decode_body(payload.body(), payload.compression());
        self.batches.lock().push(events);
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

/// Console stand-in that keeps rendered events in memory
#[derive(Default)]
pub struct MemorySink {
    events: Mutex<Vec<Event>>,
}

impl MemorySink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .map(|e| e.message().to_string())
            .collect()
    }
}

impl EventSink for MemorySink {
    fn write(&self, event: &Event) -> Result<()> {
        self.events.lock().push(event.clone());
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}

/// Poll `condition` until it holds or `timeout` passes
pub fn wait_for(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let start = Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    condition()
}

/// Loopback port that completes the TCP handshake but never answers
///
/// Connections sit in the listen backlog, so a client's request is written
/// and then waits for a response that never comes.
pub struct SilentEndpoint {
    listener: TcpListener,
}

impl SilentEndpoint {
    pub fn bind() -> Self {
        Self {
            listener: TcpListener::bind("127.0.0.1:0").expect("bind loopback"),
        }
    }

    pub fn url(&self) -> String {
        let addr = self.listener.local_addr().expect("local addr");
        format!("http://{}/v1/logs", addr)
    }
}
