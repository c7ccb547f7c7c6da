//! # teelog
//!
//! A leveled, structured logging facade that fans every call out to several
//! independently filtered sinks.
//!
//! ## Features
//!
//! - **One gate, many sinks**: a shared atomic minimum level in front of a
//!   router whose sinks each keep their own threshold
//! - **Sinks**: colored console, size-rotated JSONL files with optional
//!   gzip, and a remote list queue (Redis)
//! - **Isolation**: a failing or panicking sink never affects its siblings
//!   or the caller
//! - **Panic and Fatal levels**: flush, then unwind or exit
//! - **Config driven**: build a logger from a serde-decoded key/value tree
//!
//! ## Example
//!
//! ```
//! use teelog::prelude::*;
//!
//! let logger = Logger::builder()
//!     .sink(LogLevel::Info, ConsoleSink::new())
//!     .build();
//!
//! logger.infow("user signed in", Fields::new().with("user_id", 42));
//! logger.sync().ok();
//! ```

pub mod core;
pub mod global;
pub mod integrations;
pub mod macros;
pub mod sinks;

pub mod prelude {
    pub use crate::core::{
        Diagnostics, FieldValue, Fields, LevelGate, LogConfig, LogLevel, LogRecord, Logger,
        LoggerBuilder, LoggerError, Result, Sink, SinkFailure, TimestampFormat,
    };
    pub use crate::sinks::{ConsoleSink, QueueSink, QueueWriter, RotatingFileSink, RotationPolicy};
}

pub use crate::core::{
    Caller, ConfigMode, ConsoleEncoder, Diagnostics, Encoder, FieldValue, Fields, JsonEncoder,
    LevelGate, LogConfig, LogLevel, LogRecord, Logger, LoggerBuilder, LoggerError, Result, Route,
    Sink, SinkFailure, SinkOperation, Tee, TeeMetrics, TimestampFormat, FATAL_EXIT_CODE,
};
pub use sinks::{ConsoleSink, QueueClient, QueueSink, QueueWriter, RotatingFileSink, RotationPolicy};

#[cfg(feature = "redis")]
pub use sinks::RedisQueueClient;
