//! Resolved logging configuration
//!
//! The configuration arrives as a generic key/value tree (usually parsed from
//! a file by the application) and is decoded with serde. Every field has a
//! default, unknown keys are ignored, and both camelCase and the historical
//! key spellings are accepted.

use super::{
    error::{LoggerError, Result},
    level_gate::LevelGate,
    log_level::LogLevel,
    logger::{Logger, LoggerBuilder},
};
use crate::sinks::{ConsoleSink, RotatingFileSink, RotationPolicy};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const BYTES_PER_MEGABYTE: u64 = 1024 * 1024;

/// Preset selecting development or production behavior.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigMode {
    #[default]
    #[serde(rename = "dev", alias = "development")]
    Dev,
    #[serde(rename = "prod", alias = "production")]
    Prod,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConsoleConfig {
    #[serde(alias = "On")]
    pub on: bool,
    #[serde(alias = "Priority")]
    pub priority: i64,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            on: true,
            priority: -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FileConfig {
    #[serde(alias = "On")]
    pub on: bool,
    #[serde(alias = "Path")]
    pub path: String,
    /// Size limit of the active file, in megabytes
    #[serde(alias = "SplitSize", alias = "split_size")]
    pub split_size: i64,
    #[serde(alias = "MaxBackups", alias = "max_backups")]
    pub max_backups: i64,
    #[serde(alias = "LocalTime", alias = "local_time")]
    pub local_time: bool,
    #[serde(alias = "Compress")]
    pub compress: bool,
    #[serde(alias = "Priority")]
    pub priority: i64,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            on: false,
            path: "/tmp/teelog/logs/app.log".to_string(),
            split_size: 1024,
            max_backups: 5,
            local_time: true,
            compress: true,
            priority: -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueueConfig {
    #[serde(alias = "On")]
    pub on: bool,
    #[serde(alias = "addr", alias = "Addr")]
    pub address: String,
    #[serde(alias = "password", alias = "Password")]
    pub credential: String,
    #[serde(alias = "DB")]
    pub db: i64,
    #[serde(alias = "KeyName", alias = "key_name")]
    pub key_name: String,
    #[serde(alias = "Priority")]
    pub priority: i64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            on: false,
            address: "127.0.0.1:6379".to_string(),
            credential: String::new(),
            db: 0,
            key_name: "logs".to_string(),
            priority: -1,
        }
    }
}

/// Complete logger configuration
///
/// # Example
///
/// ```
/// use teelog::core::{LevelGate, LogConfig};
/// use std::sync::Arc;
///
/// let config = LogConfig::from_value(&serde_json::json!({
///     "mode": "prod",
///     "console": { "on": true, "priority": 0 },
///     "callerSkip": 2
/// }))
/// .unwrap();
///
/// let logger = config.build(Arc::new(LevelGate::default())).unwrap();
/// assert!(!logger.is_development());
/// assert_eq!(logger.caller_skip(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LogConfig {
    #[serde(alias = "Mode")]
    pub mode: ConfigMode,
    #[serde(alias = "Console")]
    pub console: ConsoleConfig,
    #[serde(alias = "File")]
    pub file: FileConfig,
    #[serde(alias = "redis", alias = "Redis")]
    pub queue: QueueConfig,
    #[serde(alias = "CallerSkip", alias = "caller_skip")]
    pub caller_skip: i64,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            mode: ConfigMode::default(),
            console: ConsoleConfig::default(),
            file: FileConfig::default(),
            queue: QueueConfig::default(),
            caller_skip: 1,
        }
    }
}

/// `splitSize` in bytes; fails if it is not positive or overflows.
fn split_size_bytes(megabytes: i64) -> Result<u64> {
    u64::try_from(megabytes)
        .ok()
        .filter(|&mb| mb > 0)
        .and_then(|mb| mb.checked_mul(BYTES_PER_MEGABYTE))
        .ok_or_else(|| {
            LoggerError::config(
                "file",
                format!(
                    "splitSize must be between 1 and {} megabytes, got {}",
                    u64::MAX / BYTES_PER_MEGABYTE,
                    megabytes
                ),
            )
        })
}

fn priority(component: &str, value: i64) -> Result<LogLevel> {
    LogLevel::try_from(value)
        .map_err(|e| LoggerError::config(component, format!("priority: {}", e)))
}

fn non_negative(component: &str, key: &str, value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| {
        LoggerError::config(component, format!("{} must not be negative, got {}", key, value))
    })
}

impl LogConfig {
    /// Decode from a generic key/value tree
    pub fn from_value(value: &serde_json::Value) -> Result<Self> {
        Self::deserialize(value).map_err(|e| LoggerError::ConfigDecode(e.to_string()))
    }

    /// Decode from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| LoggerError::ConfigDecode(e.to_string()))
    }

    pub fn is_development(&self) -> bool {
        self.mode == ConfigMode::Dev
    }

    /// Check every enabled sink's settings without creating anything.
    pub fn validate(&self) -> Result<()> {
        non_negative("logger", "callerSkip", self.caller_skip)?;

        if self.console.on {
            priority("console", self.console.priority)?;
        }

        if self.file.on {
            priority("file", self.file.priority)?;
            if self.file.path.trim().is_empty() {
                return Err(LoggerError::config("file", "path must not be empty"));
            }
            split_size_bytes(self.file.split_size)?;
            non_negative("file", "maxBackups", self.file.max_backups)?;
        }

        if self.queue.on {
            priority("queue", self.queue.priority)?;
            if self.queue.key_name.is_empty() {
                return Err(LoggerError::config("queue", "keyName must not be empty"));
            }
            non_negative("queue", "db", self.queue.db)?;
        }

        Ok(())
    }

    /// Build a logger sharing `gate`. Enabled sinks are added in the order
    /// console, file, queue; disabled ones are never constructed.
    ///
    /// # Errors
    ///
    /// Returns the first validation or sink construction failure; nothing
    /// built before it is kept.
    pub fn build(&self, gate: Arc<LevelGate>) -> Result<Logger> {
        self.validate()?;

        let mut builder = Logger::builder()
            .gate(gate)
            .development(self.is_development())
            .caller_skip(non_negative("logger", "callerSkip", self.caller_skip)? as usize);

        if self.console.on {
            builder = builder.sink(priority("console", self.console.priority)?, ConsoleSink::new());
        }

        if self.file.on {
            let policy = RotationPolicy::new()
                .with_max_size(split_size_bytes(self.file.split_size)?)
                .with_max_backups(non_negative("file", "maxBackups", self.file.max_backups)? as usize)
                .with_compression(self.file.compress)
                .with_local_time(self.file.local_time);
            let sink = RotatingFileSink::with_policy(&self.file.path, policy)?;
            builder = builder.sink(priority("file", self.file.priority)?, sink);
        }

        if self.queue.on {
            builder = self.add_queue_sink(builder)?;
        }

        Ok(builder.build())
    }

    #[cfg(feature = "redis")]
    fn add_queue_sink(&self, builder: LoggerBuilder) -> Result<LoggerBuilder> {
        use crate::sinks::{QueueSink, RedisQueueClient};

        let client =
            RedisQueueClient::new(&self.queue.address, &self.queue.credential, self.queue.db)?;
        Ok(builder.sink(
            priority("queue", self.queue.priority)?,
            QueueSink::new(client, self.queue.key_name.clone()),
        ))
    }

    #[cfg(not(feature = "redis"))]
    fn add_queue_sink(&self, _builder: LoggerBuilder) -> Result<LoggerBuilder> {
        Err(LoggerError::config(
            "queue",
            "queue sink requires the `redis` feature",
        ))
    }
}
