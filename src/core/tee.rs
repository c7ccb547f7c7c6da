//! Fan-out of one record to many independently filtered sinks

use super::{
    error::{LoggerError, Result},
    log_level::LogLevel,
    log_record::LogRecord,
    metrics::TeeMetrics,
    sink::Sink,
};
use crossbeam_channel::Sender;
use parking_lot::Mutex;
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Which sink operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkOperation {
    Write,
    Sync,
}

/// A sink failure, as reported through [`Diagnostics`].
#[derive(Debug, Clone)]
pub struct SinkFailure {
    pub sink: String,
    pub operation: SinkOperation,
    /// Level of the record being written; `None` for syncs.
    pub level: Option<LogLevel>,
    pub error: String,
}

impl fmt::Display for SinkFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let op = match self.operation {
            SinkOperation::Write => "write",
            SinkOperation::Sync => "sync",
        };
        write!(f, "sink '{}' {} failed: {}", self.sink, op, self.error)
    }
}

/// Where sink failures are reported.
///
/// Failures never reach the logging call site. By default they are printed
/// to stderr; a channel can be attached for programmatic monitoring.
///
/// # Example
///
/// ```
/// use teelog::Diagnostics;
///
/// let (tx, rx) = crossbeam_channel::unbounded();
/// let diagnostics = Diagnostics::silent().with_channel(tx);
/// # drop((diagnostics, rx));
/// ```
#[derive(Debug, Clone)]
pub struct Diagnostics {
    stderr: bool,
    channel: Option<Sender<SinkFailure>>,
}

impl Diagnostics {
    /// Report to stderr only
    pub fn stderr() -> Self {
        Self {
            stderr: true,
            channel: None,
        }
    }

    /// Report nowhere unless a channel is attached
    pub fn silent() -> Self {
        Self {
            stderr: false,
            channel: None,
        }
    }

    #[must_use]
    pub fn with_channel(mut self, sender: Sender<SinkFailure>) -> Self {
        self.channel = Some(sender);
        self
    }

    pub fn report(&self, failure: SinkFailure) {
        if self.stderr {
            eprintln!("[teelog] {}", failure);
        }
        if let Some(ref channel) = self.channel {
            // A dropped receiver only means nobody is listening anymore.
            let _ = channel.send(failure);
        }
    }
}

impl Default for Diagnostics {
    fn default() -> Self {
        Self::stderr()
    }
}

/// One sink together with its own minimum severity.
pub struct Route {
    threshold: LogLevel,
    name: String,
    sink: Mutex<Box<dyn Sink>>,
}

impl Route {
    pub fn new<S: Sink + 'static>(threshold: LogLevel, sink: S) -> Self {
        Self::boxed(threshold, Box::new(sink))
    }

    pub fn boxed(threshold: LogLevel, sink: Box<dyn Sink>) -> Self {
        Self {
            threshold,
            name: sink.name().to_string(),
            sink: Mutex::new(sink),
        }
    }

    /// `true` iff `level` is at or above this route's threshold.
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level >= self.threshold
    }

    pub fn threshold(&self) -> LogLevel {
        self.threshold
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Debug for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Route")
            .field("name", &self.name)
            .field("threshold", &self.threshold)
            .finish()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Ordered collection of routes; the heart of the fan-out.
///
/// Each route is tried in insertion order. A failing or panicking sink is
/// reported and counted, and the remaining routes still get the record.
pub struct Tee {
    routes: Vec<Route>,
    diagnostics: Diagnostics,
    metrics: TeeMetrics,
}

impl Tee {
    pub fn new(routes: Vec<Route>) -> Self {
        Self {
            routes,
            diagnostics: Diagnostics::default(),
            metrics: TeeMetrics::new(),
        }
    }

    #[must_use]
    pub fn with_diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    /// `true` if at least one route would accept `level`.
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.routes.iter().any(|route| route.enabled(level))
    }

    pub fn dispatch(&self, record: &LogRecord) {
        self.metrics.record_dispatched();

        for route in self.routes.iter().filter(|r| r.enabled(record.level)) {
            let outcome = catch_unwind(AssertUnwindSafe(|| route.sink.lock().write(record)));
            let error = match outcome {
                Ok(Ok(())) => {
                    self.metrics.record_write();
                    continue;
                }
                Ok(Err(e)) => e.to_string(),
                Err(payload) => panic_message(payload.as_ref()),
            };

            self.metrics.record_write_failure();
            self.diagnostics.report(SinkFailure {
                sink: route.name.clone(),
                operation: SinkOperation::Write,
                level: Some(record.level),
                error,
            });
        }
    }

    /// Flush every sink. All sinks are attempted; the first failure is
    /// returned.
    pub fn sync(&self) -> Result<()> {
        let mut first_error = None;

        for route in &self.routes {
            let outcome = catch_unwind(AssertUnwindSafe(|| route.sink.lock().sync()));
            let error = match outcome {
                Ok(Ok(())) => continue,
                Ok(Err(e)) => e,
                Err(payload) => LoggerError::SinkPanicked {
                    name: route.name.clone(),
                    message: panic_message(payload.as_ref()),
                },
            };

            self.metrics.record_sync_failure();
            self.diagnostics.report(SinkFailure {
                sink: route.name.clone(),
                operation: SinkOperation::Sync,
                level: None,
                error: error.to_string(),
            });
            first_error.get_or_insert(error);
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn metrics(&self) -> &TeeMetrics {
        &self.metrics
    }
}

impl fmt::Debug for Tee {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tee").field("routes", &self.routes).finish()
    }
}

impl Drop for Tee {
    fn drop(&mut self) {
        // Best effort; failures were already reported.
        let _ = self.sync();
    }
}
