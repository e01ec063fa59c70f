//! Binding for the `log` crate facade
//!
//! Installs a [`log::Log`] implementation that forwards every enabled record
//! to a [`Shipper`]. The record target, module path and source location are
//! carried as attributes.
//!
//! Records emitted while a batch is being sent (the HTTP client logs its own
//! connection handling) are ignored, otherwise every send would ship the
//! records describing the previous one.

use super::{EventAdapter, Submission};
use crate::core::{is_sending, Attributes, LogLevel, Result, Shipper, ShipperError};
use log::{Level, LevelFilter, Log, Metadata, Record};
use std::sync::Arc;

pub const LOGGER_ATTRIBUTE: &str = "logger";
pub const MODULE_ATTRIBUTE: &str = "module";
pub const FILE_ATTRIBUTE: &str = "file";
pub const LINE_ATTRIBUTE: &str = "line";

/// `log` front-end for a shared [`Shipper`]
///
/// # Example
///
/// ```no_run
/// use rust_log_shipper::adapters::LogBridge;
/// use rust_log_shipper::Shipper;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// let shipper = Arc::new(Shipper::builder().service_name("api").build());
/// let shipper = LogBridge::new(shipper)
///     .with_max_level(log::LevelFilter::Info)
///     .init()
///     .expect("logger already installed");
///
/// log::info!(target: "api::http", "listening on {}", 8080);
///
/// // The global logger is never dropped, so flush on the way out
/// shipper.stop(Duration::from_secs(2));
/// ```
pub struct LogBridge {
    shipper: Arc<Shipper>,
    max_level: LevelFilter,
}

impl LogBridge {
    pub fn new(shipper: Arc<Shipper>) -> Self {
        Self {
            shipper,
            max_level: LevelFilter::Trace,
        }
    }

    #[must_use]
    pub fn with_max_level(mut self, max_level: LevelFilter) -> Self {
        self.max_level = max_level;
        self
    }

    pub fn shipper(&self) -> &Arc<Shipper> {
        &self.shipper
    }

    /// Install as the global `log` logger
    ///
    /// Fails if another logger was installed first. The installed logger
    /// lives for the rest of the process and `Shipper`'s `Drop` never runs
    /// for it, so the returned handle is how the host calls
    /// [`Shipper::stop`] before exiting.
    pub fn init(self) -> Result<Arc<Shipper>> {
        let max_level = self.max_level;
        let shipper = Arc::clone(&self.shipper);
        log::set_boxed_logger(Box::new(self))
            .map_err(|e| ShipperError::other(format!("Failed to install log bridge: {}", e)))?;
        log::set_max_level(max_level);
        Ok(shipper)
    }
}

/// Map a `log` level onto the shipper's levels
pub fn map_level(level: Level) -> LogLevel {
    match level {
        Level::Error => LogLevel::Error,
        Level::Warn => LogLevel::Warn,
        Level::Info => LogLevel::Info,
        Level::Debug => LogLevel::Debug,
        Level::Trace => LogLevel::Trace,
    }
}

impl<'a> EventAdapter<Record<'a>> for LogBridge {
    fn translate(&self, record: &Record<'a>) -> Submission {
        let message = match record.args().as_str() {
            Some(literal) => literal.to_string(),
            None => record.args().to_string(),
        };

        let mut attributes = Attributes::new().with_field(LOGGER_ATTRIBUTE, record.target());
        if let Some(module) = record.module_path() {
            attributes.insert(MODULE_ATTRIBUTE, module);
        }
        if let Some(file) = record.file() {
            attributes.insert(FILE_ATTRIBUTE, file);
        }
        if let Some(line) = record.line() {
            attributes.insert(LINE_ATTRIBUTE, line);
        }

        Submission {
            level: map_level(record.level()),
            message: Some(message),
            error: None,
            attributes,
        }
    }
}

impl Log for LogBridge {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level && !is_sending()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.shipper.dispatch(self, record);
        }
    }

    fn flush(&self) {
        self.shipper.flush();
    }
}
