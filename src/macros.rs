//! Formatting macros for submitting events.
//!
//! These macros format their arguments like `format!` and hand the result to
//! a [`Shipper`](crate::Shipper).
//!
//! # Examples
//!
//! ```
//! use rust_log_shipper::prelude::*;
//! use rust_log_shipper::{info, submit_with};
//!
//! let shipper = Shipper::builder().endpoint_url("").build();
//!
//! info!(shipper, "Server started");
//!
//! let port = 8080;
//! info!(shipper, "Server listening on port {}", port);
//!
//! submit_with!(shipper, LogLevel::Warn, { "attempt" => 3, "max" => 5 }, "Retrying upload");
//! ```

/// Submit a formatted message at the given level.
///
/// # Examples
///
/// ```
/// # use rust_log_shipper::prelude::*;
/// # let shipper = Shipper::builder().endpoint_url("").build();
/// use rust_log_shipper::submit;
/// submit!(shipper, LogLevel::Info, "Simple message");
/// submit!(shipper, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! submit {
    ($shipper:expr, $level:expr, $($arg:tt)+) => {
        $shipper.log($level, format!($($arg)+))
    };
}

/// Submit a formatted message with attributes.
///
/// Attributes are given as `key => value` pairs in braces; values accept
/// anything convertible into a [`FieldValue`](crate::FieldValue).
#[macro_export]
macro_rules! submit_with {
    ($shipper:expr, $level:expr, { $($key:expr => $value:expr),* $(,)? }, $($arg:tt)+) => {{
        #[allow(unused_mut)]
        let mut attributes = $crate::Attributes::new();
        $( attributes.insert($key, $value); )*
        $shipper.log_with_attributes($level, format!($($arg)+), attributes)
    }};
}

#[macro_export]
macro_rules! trace {
    ($shipper:expr, $($arg:tt)+) => {
        $crate::submit!($shipper, $crate::LogLevel::Trace, $($arg)+)
    };
}

#[macro_export]
macro_rules! debug {
    ($shipper:expr, $($arg:tt)+) => {
        $crate::submit!($shipper, $crate::LogLevel::Debug, $($arg)+)
    };
}

/// Submit an info-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_shipper::prelude::*;
/// # let shipper = Shipper::builder().endpoint_url("").build();
/// use rust_log_shipper::info;
/// info!(shipper, "Processing {} items", 100);
/// ```
#[macro_export]
macro_rules! info {
    ($shipper:expr, $($arg:tt)+) => {
        $crate::submit!($shipper, $crate::LogLevel::Info, $($arg)+)
    };
}

#[macro_export]
macro_rules! warn {
    ($shipper:expr, $($arg:tt)+) => {
        $crate::submit!($shipper, $crate::LogLevel::Warn, $($arg)+)
    };
}

/// Submit an error-level message.
///
/// # Examples
///
/// ```
/// # use rust_log_shipper::prelude::*;
/// # let shipper = Shipper::builder().endpoint_url("").build();
/// use rust_log_shipper::error;
/// error!(shipper, "Error code: {}, message: {}", 500, "Internal error");
/// ```
#[macro_export]
macro_rules! error {
    ($shipper:expr, $($arg:tt)+) => {
        $crate::submit!($shipper, $crate::LogLevel::Error, $($arg)+)
    };
}
