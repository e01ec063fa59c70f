//! Operator-facing warnings
//!
//! Diagnostics go straight to stderr. They never pass through the shipper
//! itself, so a broken endpoint cannot feed warnings back into the buffer.

use super::error::ShipperError;
use super::metrics::ShipperMetrics;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

const BANNER_RULE: &str = "****************************************************************";

/// Emits the one-time disablement banner and per-failure warnings
///
/// The disablement flag is armed once, when the shipper learns it has no
/// endpoint, and consumed by the first caller of
/// [`WarningReporter::warn_disabled_once`].
#[derive(Debug)]
pub struct WarningReporter {
    disabled_pending: AtomicBool,
    metrics: Arc<ShipperMetrics>,
}

impl WarningReporter {
    pub fn new(metrics: Arc<ShipperMetrics>) -> Self {
        Self {
            disabled_pending: AtomicBool::new(false),
            metrics,
        }
    }

    /// Arm the disablement banner
    pub fn arm_disabled(&self) {
        self.disabled_pending.store(true, Ordering::Release);
    }

    pub fn is_armed(&self) -> bool {
        self.disabled_pending.load(Ordering::Acquire)
    }

    /// Print the disablement banner if nobody has yet
    ///
    /// Returns `true` for exactly one caller per arming.
    pub fn warn_disabled_once(&self) -> bool {
        // Cheap read first; the swap only races while the flag is still set
        if !self.disabled_pending.load(Ordering::Relaxed) {
            return false;
        }
        if !self.disabled_pending.swap(false, Ordering::AcqRel) {
            return false;
        }

        self.metrics.record_warning();
        eprintln!("{}", BANNER_RULE);
        eprintln!("[LOG SHIPPER WARNING] No ingestion endpoint configured");
        eprintln!("[LOG SHIPPER WARNING] Events are not shipped; console output only");
        eprintln!("{}", BANNER_RULE);
        true
    }

    /// Report a batch that could not be delivered
    pub fn transmission_failed(&self, error: &ShipperError, events: usize) {
        self.metrics.record_warning();
        eprintln!(
            "[LOG SHIPPER WARNING] Dropping batch of {} events: {}",
            events, error
        );
    }

    /// Report a console sink failure
    pub fn console_failed(&self, error: &ShipperError) {
        self.metrics.record_warning();
        eprintln!("[LOG SHIPPER ERROR] Console output failed: {}", error);
    }
}
