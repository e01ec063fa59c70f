//! Console fallback sink

use crate::core::{ConsoleFormat, Event, EventSink, LogLevel, Result, ShipperError};
#[cfg(feature = "console")]
use colored::Colorize;
use std::io::Write;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

/// Writes events to stdout, and `Error` events to stderr
pub struct ConsoleSink {
    use_colors: bool,
    format: ConsoleFormat,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            use_colors: cfg!(feature = "console"),
            format: ConsoleFormat::default(),
        }
    }

    pub fn with_colors(use_colors: bool) -> Self {
        Self {
            use_colors,
            format: ConsoleFormat::default(),
        }
    }

    /// Set the line format for this sink
    ///
    /// # Example
    ///
    /// ```
    /// use rust_log_shipper::outputs::ConsoleSink;
    /// use rust_log_shipper::ConsoleFormat;
    ///
    /// let sink = ConsoleSink::new().with_format(ConsoleFormat::Json);
    /// ```
    #[must_use]
    pub fn with_format(mut self, format: ConsoleFormat) -> Self {
        self.format = format;
        if format == ConsoleFormat::Json {
            self.use_colors = false;
        }
        self
    }

    /// Whether level labels are colored; always `false` for JSON lines
    pub fn uses_colors(&self) -> bool {
        self.use_colors
    }

    /// Render one event as a single line
    pub fn render(&self, event: &Event) -> Result<String> {
        match self.format {
            ConsoleFormat::Text => Ok(self.format_text(event)),
            ConsoleFormat::Json => Ok(serde_json::to_string(event)?),
        }
    }

    fn format_text(&self, event: &Event) -> String {
        let level_str = self.level_label(event.level());
        let source = event
            .service_name()
            .or(event.app_id())
            .or(event.source_id())
            .unwrap_or("-");

        let mut line = format!(
            "[{}] [{}] {} - {}",
            event.timestamp().format(TIMESTAMP_FORMAT),
            level_str,
            source,
            escape(event.message())
        );

        if !event.attributes().is_empty() {
            line.push(' ');
            line.push_str(&event.attributes().format_fields());
        }

        if let Some(error) = event.error() {
            line.push_str(" | ");
            if let Some(kind) = &error.kind {
                line.push_str(kind);
                line.push_str(": ");
            }
            line.push_str(&escape(&error.message));
            for cause in &error.causes {
                line.push_str(" | caused by: ");
                line.push_str(&escape(cause));
            }
            for frame in &error.stack {
                line.push_str("\\n\\tat ");
                line.push_str(&escape(frame));
            }
        }

        line
    }

    #[cfg(feature = "console")]
    fn level_label(&self, level: LogLevel) -> String {
        let label = format!("{:5}", level.to_str());
        if self.use_colors {
            label.color(level.color_code()).to_string()
        } else {
            label
        }
    }

    #[cfg(not(feature = "console"))]
    fn level_label(&self, level: LogLevel) -> String {
        format!("{:5}", level.to_str())
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for ConsoleSink {
    fn write(&self, event: &Event) -> Result<()> {
        let line = self.render(event)?;
        let written = match event.level() {
            LogLevel::Error => writeln!(std::io::stderr().lock(), "{}", line),
            _ => writeln!(std::io::stdout().lock(), "{}", line),
        };
        written.map_err(|e| ShipperError::io_operation("writing to console", e))
    }

    fn flush(&self) -> Result<()> {
        // Both streams receive events
        std::io::stdout().flush()?;
        std::io::stderr().flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}

/// Keep one event on one line
fn escape(message: &str) -> String {
    message
        .replace('\n', "\\n")
        .replace('\r', "\\r")
        .replace('\t', "\\t")
}
