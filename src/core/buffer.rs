//! Batch buffer between producers and the publisher
//!
//! Producers append under a short-held lock; the publisher takes the whole
//! pending container in one swap. The lock is never held across I/O.

use super::event::Event;
use super::metrics::ShipperMetrics;
use super::overflow_policy::OverflowPolicy;
use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Ordered snapshot of buffered events, owned by whoever drained it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Batch {
    events: Vec<Event>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }
}

impl From<Vec<Event>> for Batch {
    fn from(events: Vec<Event>) -> Self {
        Self { events }
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a Event;
    type IntoIter = std::slice::Iter<'a, Event>;

    fn into_iter(self) -> Self::IntoIter {
        self.events.iter()
    }
}

#[derive(Default)]
struct Pending {
    events: VecDeque<Event>,
    oldest: Option<Instant>,
    /// Set by the final drain; later adds are refused
    closed: bool,
}

/// What happened to an event handed to [`BatchBuffer::add`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Buffered,
    /// Buffered and the size threshold was reached
    FlushSignaled,
    /// Buffered after evicting the oldest pending event
    EvictedOldest,
    /// Rejected because the ceiling was reached or the buffer was closed
    Rejected,
}

/// Thread-safe accumulator of pending events
///
/// # Example
///
/// ```
/// use rust_log_shipper::core::{BatchBuffer, Event, LogLevel, OverflowPolicy, SourceIdentity};
///
/// let (buffer, flush_signal) = BatchBuffer::new(2, OverflowPolicy::TriggerOnly);
/// let identity = SourceIdentity::default();
///
/// buffer.add(Event::new(LogLevel::Info, "one", &identity));
/// assert!(flush_signal.try_recv().is_err());
///
/// buffer.add(Event::new(LogLevel::Info, "two", &identity));
/// assert!(flush_signal.try_recv().is_ok());
///
/// let batch = buffer.drain();
/// assert_eq!(batch.len(), 2);
/// assert!(buffer.is_empty());
/// ```
pub struct BatchBuffer {
    pending: Mutex<Pending>,
    len: AtomicUsize,
    max_size: usize,
    policy: OverflowPolicy,
    flush_tx: Sender<()>,
    metrics: Arc<ShipperMetrics>,
}

impl BatchBuffer {
    /// Create a buffer and the receiving end of its size-trigger signal
    pub fn new(max_size: usize, policy: OverflowPolicy) -> (Self, Receiver<()>) {
        Self::with_metrics(max_size, policy, Arc::new(ShipperMetrics::new()))
    }

    pub(crate) fn with_metrics(
        max_size: usize,
        policy: OverflowPolicy,
        metrics: Arc<ShipperMetrics>,
    ) -> (Self, Receiver<()>) {
        let max_size = max_size.max(1);
        // A single slot coalesces repeated triggers into one wake-up
        let (flush_tx, flush_rx) = bounded(1);
        let buffer = Self {
            pending: Mutex::new(Pending::default()),
            len: AtomicUsize::new(0),
            max_size,
            policy: policy.normalized(max_size),
            flush_tx,
            metrics,
        };
        (buffer, flush_rx)
    }

    /// Append an event; never blocks on the publisher
    pub fn add(&self, event: Event) -> AddOutcome {
        let (outcome, len) = {
            let mut pending = self.pending.lock();
            if pending.closed {
                drop(pending);
                self.metrics.record_dropped();
                return AddOutcome::Rejected;
            }
            let mut outcome = AddOutcome::Buffered;

            match self.policy {
                OverflowPolicy::TriggerOnly => {}
                OverflowPolicy::DropOldest { ceiling } => {
                    if pending.events.len() >= ceiling {
                        pending.events.pop_front();
                        outcome = AddOutcome::EvictedOldest;
                    }
                }
                OverflowPolicy::DropNewest { ceiling } => {
                    if pending.events.len() >= ceiling {
                        return self.reject();
                    }
                }
            }

            if pending.events.is_empty() || outcome == AddOutcome::EvictedOldest {
                pending.oldest = Some(Instant::now());
            }
            pending.events.push_back(event);
            let len = pending.events.len();
            self.len.store(len, Ordering::Release);
            (outcome, len)
        };

        if outcome == AddOutcome::EvictedOldest {
            self.metrics.record_dropped();
        } else {
            self.metrics.record_buffered();
        }

        if len >= self.max_size {
            // Full slot means a wake-up is already queued
            let _ = self.flush_tx.try_send(());
            if outcome == AddOutcome::Buffered {
                return AddOutcome::FlushSignaled;
            }
        }
        outcome
    }

    fn reject(&self) -> AddOutcome {
        self.metrics.record_dropped();
        let _ = self.flush_tx.try_send(());
        AddOutcome::Rejected
    }

    /// Swap the pending events out as a batch
    pub fn drain(&self) -> Batch {
        let events = {
            let mut pending = self.pending.lock();
            pending.oldest = None;
            self.len.store(0, Ordering::Release);
            std::mem::take(&mut pending.events)
        };
        Batch::from(Vec::from(events))
    }

    /// Take the remaining events and refuse everything added afterwards
    ///
    /// Used for the final flush, so an add racing shutdown is counted as
    /// dropped instead of being stranded in a buffer nobody drains.
    pub fn close(&self) -> Batch {
        let events = {
            let mut pending = self.pending.lock();
            pending.closed = true;
            pending.oldest = None;
            self.len.store(0, Ordering::Release);
            std::mem::take(&mut pending.events)
        };
        Batch::from(Vec::from(events))
    }

    pub fn is_closed(&self) -> bool {
        self.pending.lock().closed
    }

    pub fn len(&self) -> usize {
        self.len.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    /// Whether the size threshold is currently reached
    pub fn is_full(&self) -> bool {
        self.len() >= self.max_size
    }

    /// How long the oldest pending event has been waiting
    ///
    /// After an eviction this restarts from the eviction time, which only
    /// delays the staleness rule for an already overflowing buffer.
    pub fn oldest_age(&self) -> Option<Duration> {
        self.pending.lock().oldest.map(|at| at.elapsed())
    }

    /// Timer-flush readiness
    ///
    /// Ready when at least `min_size` events are pending, or when anything is
    /// pending and the oldest of it has waited a full `interval`.
    pub fn is_ready(&self, min_size: usize, interval: Duration) -> bool {
        let len = self.len();
        if len == 0 {
            return false;
        }
        len >= min_size || self.oldest_age().is_some_and(|age| age >= interval)
    }
}
