//! Shipper metrics for observability
//!
//! Counters for the whole event path: how many events were accepted,
//! buffered, echoed, shipped or lost, and how the publisher spent its
//! flush cycles.

use std::sync::atomic::{AtomicU64, Ordering};

/// Metrics for shipper observability
///
/// # Example
///
/// ```
/// use rust_log_shipper::ShipperMetrics;
///
/// let metrics = ShipperMetrics::new();
/// metrics.record_submitted();
/// metrics.record_batch_sent(25);
///
/// assert_eq!(metrics.submitted(), 1);
/// assert_eq!(metrics.events_sent(), 25);
/// ```
#[derive(Debug)]
pub struct ShipperMetrics {
    submitted: AtomicU64,
    buffered: AtomicU64,
    dropped: AtomicU64,
    console_written: AtomicU64,
    batches_sent: AtomicU64,
    events_sent: AtomicU64,
    batches_failed: AtomicU64,
    events_failed: AtomicU64,
    size_flushes: AtomicU64,
    timer_flushes: AtomicU64,
    warnings: AtomicU64,
}

impl ShipperMetrics {
    pub const fn new() -> Self {
        Self {
            submitted: AtomicU64::new(0),
            buffered: AtomicU64::new(0),
            dropped: AtomicU64::new(0),
            console_written: AtomicU64::new(0),
            batches_sent: AtomicU64::new(0),
            events_sent: AtomicU64::new(0),
            batches_failed: AtomicU64::new(0),
            events_failed: AtomicU64::new(0),
            size_flushes: AtomicU64::new(0),
            timer_flushes: AtomicU64::new(0),
            warnings: AtomicU64::new(0),
        }
    }

    /// Events accepted by `submit`
    #[inline]
    pub fn submitted(&self) -> u64 {
        self.submitted.load(Ordering::Relaxed)
    }

    /// Events appended to the batch buffer
    #[inline]
    pub fn buffered(&self) -> u64 {
        self.buffered.load(Ordering::Relaxed)
    }

    /// Events lost to overflow, a stopped shipper, or a disabled shipper
    /// with no console
    #[inline]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn console_written(&self) -> u64 {
        self.console_written.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn batches_sent(&self) -> u64 {
        self.batches_sent.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn events_sent(&self) -> u64 {
        self.events_sent.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn batches_failed(&self) -> u64 {
        self.batches_failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn events_failed(&self) -> u64 {
        self.events_failed.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn size_triggered_flushes(&self) -> u64 {
        self.size_flushes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn timer_triggered_flushes(&self) -> u64 {
        self.timer_flushes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn warnings_emitted(&self) -> u64 {
        self.warnings.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_submitted(&self) -> u64 {
        self.submitted.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_buffered(&self) -> u64 {
        self.buffered.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dropped(&self) -> u64 {
        self.dropped.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_console_written(&self) -> u64 {
        self.console_written.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_batch_sent(&self, events: usize) {
        self.batches_sent.fetch_add(1, Ordering::Relaxed);
        self.events_sent.fetch_add(events as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_batch_failed(&self, events: usize) {
        self.batches_failed.fetch_add(1, Ordering::Relaxed);
        self.events_failed.fetch_add(events as u64, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_size_flush(&self) -> u64 {
        self.size_flushes.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_timer_flush(&self) -> u64 {
        self.timer_flushes.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_warning(&self) -> u64 {
        self.warnings.fetch_add(1, Ordering::Relaxed)
    }

    /// Share of attempted events that never reached the endpoint (0.0 - 100.0)
    pub fn loss_rate(&self) -> f64 {
        let lost = (self.dropped() + self.events_failed()) as f64;
        let total = self.events_sent() as f64 + lost;
        if total == 0.0 {
            0.0
        } else {
            (lost / total) * 100.0
        }
    }
}

impl Default for ShipperMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for ShipperMetrics {
    /// Create a snapshot of the current counter values
    fn clone(&self) -> Self {
        Self {
            submitted: AtomicU64::new(self.submitted()),
            buffered: AtomicU64::new(self.buffered()),
            dropped: AtomicU64::new(self.dropped()),
            console_written: AtomicU64::new(self.console_written()),
            batches_sent: AtomicU64::new(self.batches_sent()),
            events_sent: AtomicU64::new(self.events_sent()),
            batches_failed: AtomicU64::new(self.batches_failed()),
            events_failed: AtomicU64::new(self.events_failed()),
            size_flushes: AtomicU64::new(self.size_triggered_flushes()),
            timer_flushes: AtomicU64::new(self.timer_triggered_flushes()),
            warnings: AtomicU64::new(self.warnings_emitted()),
        }
    }
}
