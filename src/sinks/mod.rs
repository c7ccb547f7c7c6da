//! Sink implementations

pub mod console;
pub mod queue;
pub mod rotating_file;

#[cfg(feature = "redis")]
pub mod redis_client;

pub use console::ConsoleSink;
pub use queue::{QueueClient, QueueSink, QueueWriter};
pub use rotating_file::{RotatingFileSink, RotationPolicy};

#[cfg(feature = "redis")]
pub use redis_client::RedisQueueClient;

pub use crate::core::Sink;
