//! Sink trait for log output destinations

use super::{error::Result, log_record::LogRecord};

/// A destination for encoded records.
///
/// Severity filtering lives in the [`Route`](super::tee::Route) that owns the
/// sink, and the router serializes calls to one sink behind its own lock, so
/// implementations only need to be `Send`.
pub trait Sink: Send {
    fn write(&mut self, record: &LogRecord) -> Result<()>;
    /// Flush anything buffered down to the transport.
    fn sync(&mut self) -> Result<()>;
    fn name(&self) -> &str;
}
