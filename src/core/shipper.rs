//! Shipper engine: the single entry point adapters talk to

use super::{
    attributes::Attributes,
    buffer::BatchBuffer,
    config::{ClientConfig, ShipperBuilder},
    error::ShipperError,
    event::{ErrorInfo, Event},
    log_level::LogLevel,
    metrics::ShipperMetrics,
    publisher::{Control, FlushTrigger, Publisher, PublisherState, StateCell},
    transport::{EventSink, Transport},
    warning::WarningReporter,
};
use crate::adapters::EventAdapter;
use crate::outputs::{ConsoleSink, HttpTransport};
use crossbeam_channel::{unbounded, Sender};
use parking_lot::Mutex;
use std::error::Error as StdError;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

const PUBLISHER_THREAD_NAME: &str = "log-shipper-publisher";

#[derive(Default)]
struct Lifecycle {
    /// Present until the thread is started, or consumed by `stop()`
    publisher: Option<Publisher>,
    handle: Option<thread::JoinHandle<()>>,
}

/// Buffers events and ships them in batches from a background thread
///
/// `submit` and its helpers never block on network I/O and never panic.
/// Without an endpoint the shipper keeps accepting events and routes them
/// to the console only.
///
/// # Example
///
/// ```no_run
/// use rust_log_shipper::prelude::*;
/// use std::time::Duration;
///
/// let shipper = Shipper::builder()
///     .endpoint_url("https://ingest.example/v1")
///     .service_name("checkout")
///     .publish_interval(Duration::from_secs(5))
///     .build();
///
/// shipper.info("order accepted");
/// shipper.stop(Duration::from_secs(2));
/// ```
pub struct Shipper {
    config: Arc<ClientConfig>,
    buffer: Arc<BatchBuffer>,
    /// Echo target, `Some` when console output is enabled
    console: Option<Arc<dyn EventSink>>,
    reporter: Arc<WarningReporter>,
    metrics: Arc<ShipperMetrics>,
    state: Arc<StateCell>,
    control_tx: Sender<Control>,
    lifecycle: Mutex<Lifecycle>,
    stopped: AtomicBool,
}

impl Shipper {
    #[must_use]
    pub fn builder() -> ShipperBuilder {
        ShipperBuilder::new()
    }

    /// Engine for a resolved configuration, shipping over HTTP
    pub fn new(config: ClientConfig) -> Self {
        Self::assemble(config, None, None)
    }

    fn assemble(
        config: ClientConfig,
        transport: Option<Box<dyn Transport>>,
        console_sink: Option<Arc<dyn EventSink>>,
    ) -> Self {
        let config = Arc::new(config);
        let metrics = Arc::new(ShipperMetrics::new());
        let reporter = Arc::new(WarningReporter::new(Arc::clone(&metrics)));
        let state = Arc::new(StateCell::new());
        let (control_tx, control_rx) = unbounded();

        let (buffer, flush_rx) = BatchBuffer::with_metrics(
            config.max_buffer_size(),
            config.overflow_policy(),
            Arc::clone(&metrics),
        );
        let buffer = Arc::new(buffer);

        let sink: Arc<dyn EventSink> = console_sink
            .unwrap_or_else(|| Arc::new(ConsoleSink::new().with_format(config.console_format())));
        let (console, fallback) = if config.console_enabled() {
            (Some(sink), None)
        } else {
            (None, Some(sink))
        };

        let publisher = match config.endpoint_url() {
            Some(url) => {
                let transport =
                    transport.unwrap_or_else(|| Box::new(HttpTransport::new(url.to_string())));
                Some(Publisher {
                    buffer: Arc::clone(&buffer),
                    transport,
                    flush_rx,
                    control_rx,
                    config: Arc::clone(&config),
                    fallback,
                    reporter: Arc::clone(&reporter),
                    metrics: Arc::clone(&metrics),
                    state: Arc::clone(&state),
                })
            }
            None => {
                reporter.arm_disabled();
                None
            }
        };

        let shipper = Self {
            config,
            buffer,
            console,
            reporter,
            metrics,
            state,
            control_tx,
            lifecycle: Mutex::new(Lifecycle {
                publisher,
                handle: None,
            }),
            stopped: AtomicBool::new(false),
        };

        if shipper.config.auto_start() {
            shipper.start();
        }
        shipper
    }

    /// Start the publisher thread
    ///
    /// Idempotent: returns `true` only for the call that started it.
    pub fn start(&self) -> bool {
        if self.stopped.load(Ordering::Acquire) {
            return false;
        }

        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.handle.is_some() {
            return false;
        }
        let Some(publisher) = lifecycle.publisher.take() else {
            return false;
        };

        self.state.set(PublisherState::Waiting);
        match thread::Builder::new()
            .name(PUBLISHER_THREAD_NAME.to_string())
            .spawn(move || publisher.run())
        {
            Ok(handle) => {
                lifecycle.handle = Some(handle);
                true
            }
            Err(e) => {
                self.state.set(PublisherState::Stopped);
                eprintln!("[LOG SHIPPER ERROR] Failed to spawn publisher thread: {}", e);
                false
            }
        }
    }

    /// Accept one log occurrence
    ///
    /// A missing message is recorded as an empty string.
    pub fn submit(
        &self,
        level: LogLevel,
        message: Option<&str>,
        error: Option<ErrorInfo>,
        attributes: Attributes,
    ) {
        self.metrics.record_submitted();
        let event = Event::new(level, message.unwrap_or_default(), self.config.identity())
            .with_error(error)
            .with_attributes(attributes);
        self.accept(event);
    }

    fn accept(&self, event: Event) {
        let remote = self.config.is_remote_enabled();
        if !remote {
            self.reporter.warn_disabled_once();
        }

        if let Some(console) = &self.console {
            self.echo(console.as_ref(), &event);
        }

        if remote {
            if self.stopped.load(Ordering::Acquire) {
                self.metrics.record_dropped();
            } else {
                self.buffer.add(event);
            }
        } else if self.console.is_none() {
            self.metrics.record_dropped();
        }
    }

    fn echo(&self, console: &dyn EventSink, event: &Event) {
        let result = catch_unwind(AssertUnwindSafe(|| console.write(event)))
            .unwrap_or_else(|panic| Err(ShipperError::from_panic(console.name(), panic)));
        match result {
            Ok(()) => {
                self.metrics.record_console_written();
            }
            Err(e) => self.reporter.console_failed(&e),
        }
    }

    /// Translate a native record through an adapter and submit it
    pub fn dispatch<N, A>(&self, adapter: &A, record: &N)
    where
        N: ?Sized,
        A: EventAdapter<N> + ?Sized,
    {
        let submission = adapter.translate(record);
        self.submit(
            submission.level,
            submission.message.as_deref(),
            submission.error,
            submission.attributes,
        );
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        self.metrics.record_submitted();
        let event = Event::new(level, message, self.config.identity());
        self.accept(event);
    }

    pub fn log_with_attributes(
        &self,
        level: LogLevel,
        message: impl Into<String>,
        attributes: Attributes,
    ) {
        self.metrics.record_submitted();
        let event = Event::new(level, message, self.config.identity()).with_attributes(attributes);
        self.accept(event);
    }

    #[inline]
    pub fn trace(&self, message: impl Into<String>) {
        self.log(LogLevel::Trace, message);
    }

    #[inline]
    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    #[inline]
    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    #[inline]
    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    #[inline]
    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    /// Error event carrying the error's message and `source()` chain
    pub fn error_with(&self, message: impl Into<String>, error: &(dyn StdError + 'static)) {
        self.metrics.record_submitted();
        let event = Event::new(LogLevel::Error, message, self.config.identity())
            .with_error(Some(ErrorInfo::from_error(error)));
        self.accept(event);
    }

    /// Ask the publisher to ship whatever is pending, ignoring thresholds
    ///
    /// Before `start()` the flush runs on the calling thread.
    pub fn flush(&self) -> bool {
        if self.stopped.load(Ordering::Acquire) {
            return false;
        }

        let mut lifecycle = self.lifecycle.lock();
        if lifecycle.handle.is_some() {
            return self.control_tx.send(Control::Flush).is_ok();
        }
        match lifecycle.publisher.as_mut() {
            Some(publisher) => {
                publisher.flush(FlushTrigger::Requested);
                self.state.set(PublisherState::Idle);
                true
            }
            None => false,
        }
    }

    /// Final flush, then release the publisher
    ///
    /// Waits at most `timeout` for the publisher to finish. Returns `false`
    /// if it did not finish in time or panicked. Later calls return `true`
    /// without doing anything.
    pub fn stop(&self, timeout: Duration) -> bool {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return true;
        }

        let (publisher, handle) = {
            let mut lifecycle = self.lifecycle.lock();
            (lifecycle.publisher.take(), lifecycle.handle.take())
        };

        if let Some(handle) = handle {
            if self
                .control_tx
                .send(Control::Shutdown { deadline: timeout })
                .is_err()
            {
                eprintln!("[LOG SHIPPER ERROR] Publisher thread exited before shutdown");
            }

            let start = Instant::now();
            loop {
                if handle.is_finished() {
                    if let Err(e) = handle.join() {
                        eprintln!(
                            "[LOG SHIPPER ERROR] Publisher thread panicked during shutdown: {:?}",
                            e
                        );
                        return false;
                    }
                    break;
                }

                if start.elapsed() >= timeout {
                    eprintln!(
                        "[LOG SHIPPER WARNING] Publisher thread did not finish within {:?}. \
                         Pending events may be lost.",
                        timeout
                    );
                    return false;
                }

                // Small sleep to avoid busy-waiting
                thread::sleep(Duration::from_millis(10));
            }
        } else if let Some(mut publisher) = publisher {
            // Never started: ship the remainder from here
            publisher.finish(timeout);
        } else {
            self.state.set(PublisherState::Stopped);
        }

        if let Some(console) = &self.console {
            if let Err(e) = console.flush() {
                self.reporter.console_failed(&e);
            }
        }
        true
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn metrics(&self) -> &ShipperMetrics {
        &self.metrics
    }

    /// Events waiting for the next flush
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_remote_enabled(&self) -> bool {
        self.config.is_remote_enabled()
    }

    pub fn is_running(&self) -> bool {
        self.lifecycle
            .lock()
            .handle
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    pub fn publisher_state(&self) -> PublisherState {
        self.state.get()
    }
}

impl Drop for Shipper {
    fn drop(&mut self) {
        self.stop(self.config.shutdown_timeout());

        let lost = self.metrics.dropped() + self.metrics.events_failed();
        if lost > 0 {
            eprintln!(
                "[LOG SHIPPER WARNING] Shipper shutting down with {} undelivered events (loss rate: {:.2}%)",
                lost,
                self.metrics.loss_rate()
            );
        }
    }
}

impl ShipperBuilder {
    /// Resolve the configuration and construct the engine
    ///
    /// The publisher thread is started unless `auto_start(false)` was set.
    pub fn build(self) -> Shipper {
        let config = self.resolve();
        Shipper::assemble(config, None, self.console_sink)
    }

    /// Like [`ShipperBuilder::build`], delivering batches through `transport`
    pub fn build_with_transport(self, transport: Box<dyn Transport>) -> Shipper {
        let config = self.resolve();
        Shipper::assemble(config, Some(transport), self.console_sink)
    }
}
