//! Background publisher
//!
//! One thread per shipper owns the transport and is the only caller of
//! [`BatchBuffer::drain`] once started. Flush cycles run strictly one after
//! another, so batches from one source reach the endpoint in order.

use super::buffer::{Batch, BatchBuffer};
use super::config::ClientConfig;
use super::error::ShipperError;
use super::metrics::ShipperMetrics;
use super::payload::Payload;
use super::transport::{EventSink, Transport};
use super::warning::WarningReporter;
use crossbeam_channel::{select, Receiver};
use std::cell::Cell;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

thread_local! {
    static SENDING: Cell<bool> = const { Cell::new(false) };
}

/// Whether the current thread is inside a transport send
///
/// HTTP stacks emit `log` records while a batch is in flight. Front-ends
/// drop records made here so they never re-enter the buffer they came from.
pub fn is_sending() -> bool {
    SENDING.with(Cell::get)
}

/// Marks the current thread as sending until dropped
pub(crate) struct SendingGuard {
    previous: bool,
}

impl SendingGuard {
    pub(crate) fn enter() -> Self {
        Self {
            previous: SENDING.with(|sending| sending.replace(true)),
        }
    }
}

impl Drop for SendingGuard {
    fn drop(&mut self) {
        SENDING.with(|sending| sending.set(self.previous));
    }
}

/// Messages from the shipper to its publisher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Control {
    /// Drain whatever is pending, ignoring thresholds
    Flush,
    /// Final flush bounded by `deadline`, then exit
    Shutdown { deadline: Duration },
}

/// Lifecycle of the publisher
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PublisherState {
    /// Constructed, thread not started
    Idle = 0,
    Waiting = 1,
    Flushing = 2,
    ShuttingDown = 3,
    FinalFlush = 4,
    Stopped = 5,
}

impl PublisherState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => PublisherState::Waiting,
            2 => PublisherState::Flushing,
            3 => PublisherState::ShuttingDown,
            4 => PublisherState::FinalFlush,
            5 => PublisherState::Stopped,
            _ => PublisherState::Idle,
        }
    }
}

impl fmt::Display for PublisherState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PublisherState::Idle => "Idle",
            PublisherState::Waiting => "Waiting",
            PublisherState::Flushing => "Flushing",
            PublisherState::ShuttingDown => "ShuttingDown",
            PublisherState::FinalFlush => "FinalFlush",
            PublisherState::Stopped => "Stopped",
        };
        write!(f, "{}", name)
    }
}

/// Shared, lock-free view of the publisher state
#[derive(Debug)]
pub(crate) struct StateCell(AtomicU8);

impl StateCell {
    pub(crate) fn new() -> Self {
        Self(AtomicU8::new(PublisherState::Idle as u8))
    }

    pub(crate) fn get(&self) -> PublisherState {
        PublisherState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, state: PublisherState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// Why a batch was drained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlushTrigger {
    /// Pending count reached `max_buffer_size`
    Size,
    /// Publish interval elapsed
    Timer,
    /// Explicit `Shipper::flush()`
    Requested,
    /// Shutdown
    Final,
}

pub(crate) struct Publisher {
    pub(crate) buffer: Arc<BatchBuffer>,
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) flush_rx: Receiver<()>,
    pub(crate) control_rx: Receiver<Control>,
    pub(crate) config: Arc<ClientConfig>,
    /// Console used for undeliverable batches when events were not echoed
    pub(crate) fallback: Option<Arc<dyn EventSink>>,
    pub(crate) reporter: Arc<WarningReporter>,
    pub(crate) metrics: Arc<ShipperMetrics>,
    pub(crate) state: Arc<StateCell>,
}

impl Publisher {
    /// Flush loop; returns after the final flush
    pub(crate) fn run(mut self) {
        let interval = self.config.publish_interval();
        let min_size = self.config.min_buffer_size();
        let flush_rx = self.flush_rx.clone();
        let control_rx = self.control_rx.clone();
        let mut next_tick = Instant::now() + interval;

        loop {
            self.state.set(PublisherState::Waiting);
            let now = Instant::now();
            let wait = self.next_wake(next_tick, now).saturating_duration_since(now);

            select! {
                recv(flush_rx) -> _ => {
                    // A timer flush may already have taken the events
                    if self.buffer.is_full() {
                        self.flush(FlushTrigger::Size);
                    }
                }
                recv(control_rx) -> msg => match msg {
                    Ok(Control::Flush) => self.flush(FlushTrigger::Requested),
                    Ok(Control::Shutdown { deadline }) => {
                        self.finish(deadline);
                        return;
                    }
                    Err(_) => {
                        let deadline = self.config.shutdown_timeout();
                        self.finish(deadline);
                        return;
                    }
                },
                default(wait) => {
                    if self.buffer.is_ready(min_size, interval) {
                        self.flush(FlushTrigger::Timer);
                    }
                    let now = Instant::now();
                    if now >= next_tick {
                        next_tick = now + interval;
                    }
                }
            }
        }
    }

    /// Earlier of the next tick and the moment the oldest pending event
    /// turns stale
    fn next_wake(&self, next_tick: Instant, now: Instant) -> Instant {
        let interval = self.config.publish_interval();
        match self.buffer.oldest_age() {
            Some(age) if age < interval => next_tick.min(now + (interval - age)),
            Some(_) => now,
            None => next_tick,
        }
    }

    pub(crate) fn flush(&mut self, trigger: FlushTrigger) {
        self.state.set(PublisherState::Flushing);
        let batch = self.buffer.drain();
        if batch.is_empty() {
            return;
        }

        match trigger {
            FlushTrigger::Size => {
                self.metrics.record_size_flush();
            }
            FlushTrigger::Timer => {
                self.metrics.record_timer_flush();
            }
            FlushTrigger::Requested | FlushTrigger::Final => {}
        }

        let timeout = self.config.send_timeout();
        self.transmit(batch, timeout);
    }

    /// Final drain and transmit, bounded by `deadline`
    pub(crate) fn finish(&mut self, deadline: Duration) {
        self.state.set(PublisherState::ShuttingDown);
        // Leave headroom so the caller's join does not race the send
        let timeout = self.config.send_timeout().min(deadline.mul_f64(0.9));

        self.state.set(PublisherState::FinalFlush);
        let batch = self.buffer.close();
        if !batch.is_empty() {
            self.transmit(batch, timeout);
        }
        self.state.set(PublisherState::Stopped);
    }

    fn transmit(&mut self, batch: Batch, timeout: Duration) -> bool {
        let payload = match Payload::encode(&batch, self.config.compression()) {
            Ok(payload) => payload,
            Err(e) => {
                self.discard(batch, e);
                return false;
            }
        };

        let name = self.transport.name().to_string();
        let transport = &mut self.transport;
        let result = {
            let _sending = SendingGuard::enter();
            catch_unwind(AssertUnwindSafe(|| transport.send(&payload, timeout)))
                .unwrap_or_else(|panic| Err(ShipperError::from_panic(name, panic)))
        };

        match result {
            Ok(()) => {
                self.metrics.record_batch_sent(batch.len());
                true
            }
            Err(e) => {
                self.discard(batch, e);
                false
            }
        }
    }

    /// Drop an undeliverable batch, printing it when nobody else did
    fn discard(&self, batch: Batch, error: ShipperError) {
        self.metrics.record_batch_failed(batch.len());
        self.reporter.transmission_failed(&error, batch.len());

        let Some(sink) = &self.fallback else {
            return;
        };
        for event in &batch {
            match sink.write(event) {
                Ok(()) => {
                    self.metrics.record_console_written();
                }
                Err(e) => {
                    self.reporter.console_failed(&e);
                    return;
                }
            }
        }
        if let Err(e) = sink.flush() {
            self.reporter.console_failed(&e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ShipperBuilder;
    use crate::core::event::{Event, SourceIdentity};
    use crate::core::log_level::LogLevel;
    use crate::core::overflow_policy::OverflowPolicy;
    use crossbeam_channel::unbounded;
    use parking_lot::Mutex;

    #[derive(Clone, Default)]
    struct Recorder {
        sent: Arc<Mutex<Vec<usize>>>,
        fail: bool,
    }

    impl Transport for Recorder {
        fn send(&mut self, payload: &Payload, _timeout: Duration) -> crate::core::Result<()> {
            if self.fail {
                return Err(ShipperError::rejected(503, payload.event_count()));
            }
            self.sent.lock().push(payload.event_count());
            Ok(())
        }

        fn name(&self) -> &str {
            "recorder"
        }
    }

    /// Reports whether the send ran with the sending flag raised
    #[derive(Clone, Default)]
    struct FlagRecorder {
        seen: Arc<Mutex<Vec<bool>>>,
    }

    impl Transport for FlagRecorder {
        fn send(&mut self, _payload: &Payload, _timeout: Duration) -> crate::core::Result<()> {
            self.seen.lock().push(is_sending());
            Ok(())
        }

        fn name(&self) -> &str {
            "flag"
        }
    }

    struct Panicking;

    impl Transport for Panicking {
        fn send(&mut self, _payload: &Payload, _timeout: Duration) -> crate::core::Result<()> {
            panic!("socket vanished");
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    fn publisher(transport: Box<dyn Transport>) -> (Publisher, Arc<ShipperMetrics>) {
        let config = Arc::new(
            ShipperBuilder::new()
                .endpoint_url("http://127.0.0.1:1")
                .max_buffer_size(10)
                .min_buffer_size(5)
                .resolve_with(|_| None),
        );
        let metrics = Arc::new(ShipperMetrics::new());
        let (buffer, flush_rx) =
            BatchBuffer::with_metrics(10, OverflowPolicy::TriggerOnly, Arc::clone(&metrics));
        let (_control_tx, control_rx) = unbounded();
        let publisher = Publisher {
            buffer: Arc::new(buffer),
            transport,
            flush_rx,
            control_rx,
            config,
            fallback: None,
            reporter: Arc::new(WarningReporter::new(Arc::clone(&metrics))),
            metrics: Arc::clone(&metrics),
            state: Arc::new(StateCell::new()),
        };
        (publisher, metrics)
    }

    fn fill(publisher: &Publisher, n: usize) {
        for i in 0..n {
            publisher.buffer.add(Event::new(
                LogLevel::Info,
                format!("event {}", i),
                &SourceIdentity::default(),
            ));
        }
    }

    #[test]
    fn test_flush_sends_pending_batch() {
        let recorder = Recorder::default();
        let (mut publisher, metrics) = publisher(Box::new(recorder.clone()));
        fill(&publisher, 7);

        publisher.flush(FlushTrigger::Timer);

        assert_eq!(*recorder.sent.lock(), vec![7]);
        assert_eq!(metrics.batches_sent(), 1);
        assert_eq!(metrics.timer_triggered_flushes(), 1);
        assert!(publisher.buffer.is_empty());
    }

    #[test]
    fn test_empty_flush_sends_nothing() {
        let recorder = Recorder::default();
        let (mut publisher, metrics) = publisher(Box::new(recorder.clone()));

        publisher.flush(FlushTrigger::Size);

        assert!(recorder.sent.lock().is_empty());
        assert_eq!(metrics.size_triggered_flushes(), 0);
    }

    #[test]
    fn test_failed_batch_is_discarded() {
        let recorder = Recorder {
            fail: true,
            ..Recorder::default()
        };
        let (mut publisher, metrics) = publisher(Box::new(recorder));
        fill(&publisher, 3);

        publisher.flush(FlushTrigger::Requested);

        assert_eq!(metrics.batches_failed(), 1);
        assert_eq!(metrics.events_failed(), 3);
        assert_eq!(metrics.warnings_emitted(), 1);
        assert!(publisher.buffer.is_empty());
    }

    #[test]
    fn test_transport_panic_is_contained() {
        let (mut publisher, metrics) = publisher(Box::new(Panicking));
        fill(&publisher, 2);

        publisher.flush(FlushTrigger::Requested);

        assert_eq!(metrics.batches_failed(), 1);
        assert_eq!(publisher.state.get(), PublisherState::Flushing);
    }

    #[test]
    fn test_finish_reaches_stopped() {
        let recorder = Recorder::default();
        let (mut publisher, _metrics) = publisher(Box::new(recorder.clone()));
        fill(&publisher, 1);

        publisher.finish(Duration::from_secs(1));

        assert_eq!(*recorder.sent.lock(), vec![1]);
        assert_eq!(publisher.state.get(), PublisherState::Stopped);
    }

    #[test]
    fn test_sending_flag_covers_only_the_send() {
        let transport = FlagRecorder::default();
        let (mut publisher, _metrics) = publisher(Box::new(transport.clone()));
        fill(&publisher, 1);

        assert!(!is_sending());
        publisher.flush(FlushTrigger::Requested);
        assert!(!is_sending());
        assert_eq!(*transport.seen.lock(), vec![true]);
    }

    #[test]
    fn test_sending_flag_is_restored_after_panic() {
        let (mut publisher, _metrics) = publisher(Box::new(Panicking));
        fill(&publisher, 1);

        publisher.flush(FlushTrigger::Requested);
        assert!(!is_sending());
    }

    #[test]
    fn test_finish_closes_the_buffer() {
        let recorder = Recorder::default();
        let (mut publisher, metrics) = publisher(Box::new(recorder.clone()));
        fill(&publisher, 2);

        publisher.finish(Duration::from_secs(1));
        fill(&publisher, 1);

        assert_eq!(*recorder.sent.lock(), vec![2]);
        assert!(publisher.buffer.is_empty());
        assert_eq!(metrics.dropped(), 1);
    }

    #[test]
    fn test_state_round_trips_through_cell() {
        let cell = StateCell::new();
        assert_eq!(cell.get(), PublisherState::Idle);
        cell.set(PublisherState::FinalFlush);
        assert_eq!(cell.get(), PublisherState::FinalFlush);
        assert_eq!(cell.get().to_string(), "FinalFlush");
    }
}
