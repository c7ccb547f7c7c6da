//! Leveled logging facade

use super::{
    error::Result,
    fields::Fields,
    level_gate::LevelGate,
    log_level::LogLevel,
    log_record::{Caller, LogRecord},
    metrics::TeeMetrics,
    sink::Sink,
    tee::{Diagnostics, Route, Tee},
};
use crate::sinks::ConsoleSink;
use std::fmt;
use std::panic::Location;
use std::sync::Arc;

/// Exit status used by `fatal`.
pub const FATAL_EXIT_CODE: i32 = 1;

/// The public logging entry point.
///
/// A `Logger` is cheap to clone: the router and the gate are shared, while
/// the name and the fixed fields belong to each instance. [`Logger::with`]
/// and [`Logger::named`] derive children without touching the parent.
///
/// # Example
///
/// ```
/// use teelog::prelude::*;
///
/// let logger = Logger::builder()
///     .sink(LogLevel::Debug, ConsoleSink::new().with_colors(false))
///     .build();
///
/// let requests = logger.named("http").with(Fields::new().with("service", "api"));
/// requests.infow("listening", Fields::new().with("port", 8080));
/// requests.infof(format_args!("{} workers ready", 4));
/// ```
#[derive(Clone)]
pub struct Logger {
    tee: Arc<Tee>,
    gate: Arc<LevelGate>,
    name: Option<String>,
    fields: Fields,
    development: bool,
    add_caller: bool,
    caller_skip: usize,
}

macro_rules! leveled_methods {
    ($level:expr, $plain:ident, $formatted:ident, $keyed:ident) => {
        #[track_caller]
        #[inline]
        pub fn $plain(&self, message: impl Into<String>) {
            self.log($level, message);
        }

        #[track_caller]
        #[inline]
        pub fn $formatted(&self, args: fmt::Arguments<'_>) {
            self.logf($level, args);
        }

        #[track_caller]
        #[inline]
        pub fn $keyed(&self, message: impl Into<String>, fields: Fields) {
            self.log_fields($level, message, fields);
        }
    };
}

impl Logger {
    pub fn builder() -> LoggerBuilder {
        LoggerBuilder::new()
    }

    /// Console sink admitting everything, development mode, private gate.
    pub fn development_default() -> Self {
        Self::builder()
            .development(true)
            .sink(LogLevel::Debug, ConsoleSink::new())
            .build()
    }

    /// `true` if a record at `level` passes the gate and at least one sink.
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        self.gate.enabled(level) && self.tee.enabled(level)
    }

    #[track_caller]
    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if !self.enabled(level) {
            return;
        }
        self.write(level, message.into(), Fields::new());
    }

    #[track_caller]
    pub fn logf(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        if !self.enabled(level) {
            return;
        }
        self.write(level, args.to_string(), Fields::new());
    }

    #[track_caller]
    pub fn log_fields(&self, level: LogLevel, message: impl Into<String>, fields: Fields) {
        if !self.enabled(level) {
            return;
        }
        self.write(level, message.into(), fields);
    }

    #[track_caller]
    fn write(&self, level: LogLevel, message: String, fields: Fields) {
        let mut record = LogRecord::new(level, message);
        record.logger = self.name.clone();
        if self.add_caller {
            record.caller = Some(Caller::from(Location::caller()));
        }
        record.fields = if self.fields.is_empty() {
            fields
        } else {
            let mut merged = self.fields.clone();
            merged.extend_from(&fields);
            merged
        };

        self.tee.dispatch(&record);
    }

    leveled_methods!(LogLevel::Debug, debug, debugf, debugw);
    leveled_methods!(LogLevel::Info, info, infof, infow);
    leveled_methods!(LogLevel::Warn, warn, warnf, warnw);
    leveled_methods!(LogLevel::Error, error, errorf, errorw);

    /// Error in production; panics after logging in development mode.
    #[track_caller]
    pub fn dpanic(&self, message: impl Into<String>) {
        self.dpanicw(message, Fields::new());
    }

    #[track_caller]
    pub fn dpanicf(&self, args: fmt::Arguments<'_>) {
        if self.development || self.enabled(LogLevel::DPanic) {
            self.dpanicw(args.to_string(), Fields::new());
        }
    }

    #[track_caller]
    pub fn dpanicw(&self, message: impl Into<String>, fields: Fields) {
        if !self.development {
            self.log_fields(LogLevel::DPanic, message, fields);
            return;
        }
        self.terminate_with_panic(LogLevel::DPanic, message.into(), fields)
    }

    /// Log, flush every sink, then unwind carrying the message.
    #[track_caller]
    pub fn panic(&self, message: impl Into<String>) -> ! {
        self.terminate_with_panic(LogLevel::Panic, message.into(), Fields::new())
    }

    #[track_caller]
    pub fn panicf(&self, args: fmt::Arguments<'_>) -> ! {
        self.terminate_with_panic(LogLevel::Panic, args.to_string(), Fields::new())
    }

    #[track_caller]
    pub fn panicw(&self, message: impl Into<String>, fields: Fields) -> ! {
        self.terminate_with_panic(LogLevel::Panic, message.into(), fields)
    }

    /// Log, flush every sink, then exit the process with [`FATAL_EXIT_CODE`].
    #[track_caller]
    pub fn fatal(&self, message: impl Into<String>) -> ! {
        self.terminate_with_exit(message.into(), Fields::new())
    }

    #[track_caller]
    pub fn fatalf(&self, args: fmt::Arguments<'_>) -> ! {
        self.terminate_with_exit(args.to_string(), Fields::new())
    }

    #[track_caller]
    pub fn fatalw(&self, message: impl Into<String>, fields: Fields) -> ! {
        self.terminate_with_exit(message.into(), fields)
    }

    #[track_caller]
    fn terminate_with_panic(&self, level: LogLevel, message: String, fields: Fields) -> ! {
        if self.enabled(level) {
            self.write(level, message.clone(), fields);
        }
        self.sync_before_exit();
        panic!("{}", message)
    }

    #[track_caller]
    fn terminate_with_exit(&self, message: String, fields: Fields) -> ! {
        if self.enabled(LogLevel::Fatal) {
            self.write(LogLevel::Fatal, message, fields);
        }
        self.sync_before_exit();
        std::process::exit(FATAL_EXIT_CODE)
    }

    fn sync_before_exit(&self) {
        if let Err(e) = self.tee.sync() {
            eprintln!("[teelog] sync before exit failed: {}", e);
        }
    }

    /// Child logger whose records carry `fields` after this logger's own.
    #[must_use]
    pub fn with(&self, fields: Fields) -> Logger {
        let mut child = self.clone();
        child.fields.extend_from(&fields);
        child
    }

    /// Child logger named `<parent>.<name>`, or `name` if the parent is unnamed.
    #[must_use]
    pub fn named(&self, name: &str) -> Logger {
        let mut child = self.clone();
        child.name = match self.name {
            Some(ref parent) if !name.is_empty() => Some(format!("{}.{}", parent, name)),
            Some(ref parent) => Some(parent.clone()),
            None if name.is_empty() => None,
            None => Some(name.to_string()),
        };
        child
    }

    /// Flush every sink; the first failure is returned after all were tried.
    pub fn sync(&self) -> Result<()> {
        self.tee.sync()
    }

    pub fn level(&self) -> LogLevel {
        self.gate.level()
    }

    /// Moves the shared gate, so every logger using it is affected.
    pub fn set_level(&self, level: LogLevel) {
        self.gate.set_level(level);
    }

    pub fn gate(&self) -> &Arc<LevelGate> {
        &self.gate
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    pub fn is_development(&self) -> bool {
        self.development
    }

    /// Configured skip depth; informational only, see
    /// [`LoggerBuilder::caller_skip`].
    pub fn caller_skip(&self) -> usize {
        self.caller_skip
    }

    pub fn metrics(&self) -> &TeeMetrics {
        self.tee.metrics()
    }

    pub fn sink_count(&self) -> usize {
        self.tee.len()
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.gate.level())
            .field("development", &self.development)
            .field("routes", &self.tee.routes())
            .finish()
    }
}

/// Builder for constructing a [`Logger`] with a fluent API
///
/// # Example
/// ```
/// use teelog::prelude::*;
/// use std::sync::Arc;
///
/// let gate = Arc::new(LevelGate::new(LogLevel::Info));
/// let logger = Logger::builder()
///     .gate(Arc::clone(&gate))
///     .sink(LogLevel::Debug, ConsoleSink::new())
///     .development(true)
///     .name("worker")
///     .build();
///
/// assert_eq!(logger.level(), LogLevel::Info);
/// ```
pub struct LoggerBuilder {
    gate: Option<Arc<LevelGate>>,
    routes: Vec<Route>,
    development: bool,
    add_caller: bool,
    caller_skip: usize,
    name: Option<String>,
    fields: Fields,
    diagnostics: Diagnostics,
}

impl LoggerBuilder {
    /// Create a new builder with default values
    pub fn new() -> Self {
        Self {
            gate: None,
            routes: Vec::new(),
            development: false,
            add_caller: true,
            caller_skip: 0,
            name: None,
            fields: Fields::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    /// Share an existing gate. Without one, the logger gets a private gate
    /// starting at Debug.
    #[must_use = "builder methods return a new value"]
    pub fn gate(mut self, gate: Arc<LevelGate>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Add a sink admitting records at `threshold` and above
    #[must_use = "builder methods return a new value"]
    pub fn sink<S: Sink + 'static>(mut self, threshold: LogLevel, sink: S) -> Self {
        self.routes.push(Route::new(threshold, sink));
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn boxed_sink(mut self, threshold: LogLevel, sink: Box<dyn Sink>) -> Self {
        self.routes.push(Route::boxed(threshold, sink));
        self
    }

    /// In development mode `dpanic` panics after logging
    #[must_use = "builder methods return a new value"]
    pub fn development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn add_caller(mut self, add_caller: bool) -> Self {
        self.add_caller = add_caller;
        self
    }

    /// Stored and reported by [`Logger::caller_skip`], but it does not move
    /// the recorded call site.
    ///
    /// Call sites are resolved through `#[track_caller]`: every logging
    /// method reports the location of its caller. A helper that wraps the
    /// logger must itself be annotated `#[track_caller]` for records to point
    /// at the helper's caller; without it, records point inside the helper,
    /// whatever this value is.
    #[must_use = "builder methods return a new value"]
    pub fn caller_skip(mut self, skip: usize) -> Self {
        self.caller_skip = skip;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn fields(mut self, fields: Fields) -> Self {
        self.fields.extend_from(&fields);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn diagnostics(mut self, diagnostics: Diagnostics) -> Self {
        self.diagnostics = diagnostics;
        self
    }

    pub fn build(self) -> Logger {
        let tee = Tee::new(self.routes).with_diagnostics(self.diagnostics);
        Logger {
            tee: Arc::new(tee),
            gate: self
                .gate
                .unwrap_or_else(|| Arc::new(LevelGate::new(LogLevel::Debug))),
            name: self.name,
            fields: self.fields,
            development: self.development,
            add_caller: self.add_caller,
            caller_skip: self.caller_skip,
        }
    }
}

impl Default for LoggerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
