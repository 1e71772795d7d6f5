//! Structured logging and publish spans.
//!
//! All output is local (stderr or a file); nothing is shipped over the network.

mod logging;
mod spans;

pub use logging::{init_logging, LogConfig, LogError, LogFormat};
pub use spans::{PublishSpan, SpanExt};
