//! Built-in delivery targets

pub mod console;
pub mod http;

pub use console::ConsoleSink;
pub use http::{HttpTransport, PUBLISHED_TIMESTAMP_HEADER};
