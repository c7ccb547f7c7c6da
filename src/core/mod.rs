//! Core logger types and traits

pub mod config;
pub mod encoder;
pub mod error;
pub mod fields;
pub mod level_gate;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod metrics;
pub mod sink;
pub mod tee;
pub mod timestamp;

pub use config::{ConfigMode, ConsoleConfig, FileConfig, LogConfig, QueueConfig};
pub use encoder::{ConsoleEncoder, Encoder, JsonEncoder};
pub use error::{LoggerError, Result};
pub use fields::{FieldValue, Fields};
pub use level_gate::LevelGate;
pub use log_level::LogLevel;
pub use log_record::{Caller, LogRecord};
pub use logger::{Logger, LoggerBuilder, FATAL_EXIT_CODE};
pub use metrics::TeeMetrics;
pub use sink::Sink;
pub use tee::{Diagnostics, Route, SinkFailure, SinkOperation, Tee};
pub use timestamp::TimestampFormat;
