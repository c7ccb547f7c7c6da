//! Logging macros for ergonomic log message formatting.
//!
//! These macros expand to the `*f` methods of [`Logger`](crate::Logger), so
//! the message is only formatted when the record passes the gate, and the
//! call site recorded is the macro invocation.
//!
//! # Examples
//!
//! ```
//! use teelog::prelude::*;
//! use teelog::{fields, info, warn};
//!
//! let logger = Logger::builder()
//!     .sink(LogLevel::Debug, ConsoleSink::new().with_colors(false))
//!     .build();
//!
//! info!(logger, "Server started");
//!
//! let port = 8080;
//! info!(logger, "Server listening on port {}", port);
//!
//! logger.warnw("slow request", fields! { "path" => "/users", "ms" => 870 });
//! warn!(logger, "Retry {} of {}", 1, 3);
//! ```

/// Log a formatted message at an explicit level.
///
/// # Examples
///
/// ```
/// # use teelog::prelude::*;
/// # let logger = Logger::builder().build();
/// use teelog::log;
/// log!(logger, LogLevel::Info, "Simple message");
/// log!(logger, LogLevel::Error, "Error code: {}", 500);
/// ```
#[macro_export]
macro_rules! log {
    ($logger:expr, $level:expr, $($arg:tt)+) => {
        $logger.logf($level, ::std::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! debug {
    ($logger:expr, $($arg:tt)+) => {
        $logger.debugf(::std::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! info {
    ($logger:expr, $($arg:tt)+) => {
        $logger.infof(::std::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! warn {
    ($logger:expr, $($arg:tt)+) => {
        $logger.warnf(::std::format_args!($($arg)+))
    };
}

#[macro_export]
macro_rules! error {
    ($logger:expr, $($arg:tt)+) => {
        $logger.errorf(::std::format_args!($($arg)+))
    };
}

/// Error in production, panic in development mode.
#[macro_export]
macro_rules! dpanic {
    ($logger:expr, $($arg:tt)+) => {
        $logger.dpanicf(::std::format_args!($($arg)+))
    };
}

/// Log at Panic level, flush, then panic with the message.
#[macro_export]
macro_rules! panic_log {
    ($logger:expr, $($arg:tt)+) => {
        $logger.panicf(::std::format_args!($($arg)+))
    };
}

/// Log at Fatal level, flush, then exit the process with status 1.
#[macro_export]
macro_rules! fatal {
    ($logger:expr, $($arg:tt)+) => {
        $logger.fatalf(::std::format_args!($($arg)+))
    };
}

/// Build [`Fields`](crate::Fields) from `key => value` pairs, in order.
///
/// ```
/// use teelog::fields;
///
/// let fields = fields! { "user" => "ana", "attempt" => 2 };
/// assert_eq!(fields.format_fields(), "user=ana attempt=2");
/// ```
#[macro_export]
macro_rules! fields {
    () => {
        $crate::Fields::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {
        $crate::Fields::new()$(.with($key, $value))+
    };
}
