//! Record encoders
//!
//! - [`ConsoleEncoder`]: human-readable, optionally colorized single line
//! - [`JsonEncoder`]: one JSON object per record, decodable back into a
//!   [`LogRecord`]

use super::error::{LoggerError, Result};
use super::log_record::LogRecord;
use super::timestamp::TimestampFormat;
use colored::Colorize;

/// Turns a record into bytes for sinks that write serialized output.
///
/// Implementations append to `buf` and leave it untouched on error, so a
/// failed record is dropped for that sink only.
pub trait Encoder: Send + Sync {
    fn encode(&self, record: &LogRecord, buf: &mut Vec<u8>) -> Result<()>;

    /// Short name used in error reports.
    fn format_name(&self) -> &'static str;
}

/// Human-oriented layout:
/// `[2025-01-08T10:30:45.123Z] [INFO ] db.pool src/pool.rs:88 - connected k=v`
#[derive(Debug, Clone)]
pub struct ConsoleEncoder {
    use_colors: bool,
    timestamp_format: TimestampFormat,
}

impl ConsoleEncoder {
    pub fn new() -> Self {
        Self {
            use_colors: true,
            timestamp_format: TimestampFormat::default(),
        }
    }

    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.timestamp_format = format;
        self
    }

    /// Sanitize log message to prevent log injection attacks
    ///
    /// Replaces newlines, carriage returns, and tabs with escape sequences
    /// so a message can never forge a second console line.
    fn sanitize_message(message: &str) -> String {
        message
            .replace('\n', "\\n")
            .replace('\r', "\\r")
            .replace('\t', "\\t")
    }

    pub fn format_line(&self, record: &LogRecord) -> String {
        let level_str = if self.use_colors {
            format!("{:5}", record.level.to_str())
                .color(record.level.color_code())
                .to_string()
        } else {
            format!("{:5}", record.level.to_str())
        };

        let mut line = format!(
            "[{}] [{}]",
            self.timestamp_format.format(&record.timestamp),
            level_str
        );

        if let Some(ref name) = record.logger {
            line.push(' ');
            line.push_str(name);
        }
        if let Some(ref caller) = record.caller {
            line.push(' ');
            line.push_str(&caller.to_string());
        }

        line.push_str(" - ");
        line.push_str(&Self::sanitize_message(&record.message));

        if !record.fields.is_empty() {
            line.push(' ');
            line.push_str(&Self::sanitize_message(&record.fields.format_fields()));
        }

        line
    }
}

impl Default for ConsoleEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for ConsoleEncoder {
    fn encode(&self, record: &LogRecord, buf: &mut Vec<u8>) -> Result<()> {
        buf.extend_from_slice(self.format_line(record).as_bytes());
        buf.push(b'\n');
        Ok(())
    }

    fn format_name(&self) -> &'static str {
        "console"
    }
}

/// Machine-oriented layout, one flat JSON object per record.
#[derive(Debug, Clone)]
pub struct JsonEncoder {
    line_delimited: bool,
}

impl JsonEncoder {
    /// JSONL output: every object is followed by `\n`.
    pub fn new() -> Self {
        Self {
            line_delimited: true,
        }
    }

    /// Bare objects, for transports where one message is one record.
    pub fn unterminated() -> Self {
        Self {
            line_delimited: false,
        }
    }

    /// Decode one encoded record (trailing newline allowed).
    pub fn decode(bytes: &[u8]) -> Result<LogRecord> {
        Ok(serde_json::from_slice(bytes.trim_ascii_end())?)
    }
}

impl Default for JsonEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Encoder for JsonEncoder {
    fn encode(&self, record: &LogRecord, buf: &mut Vec<u8>) -> Result<()> {
        let start = buf.len();
        if let Err(e) = serde_json::to_writer(&mut *buf, record) {
            buf.truncate(start);
            return Err(LoggerError::encoding(self.format_name(), e.to_string()));
        }
        if self.line_delimited {
            buf.push(b'\n');
        }
        Ok(())
    }

    fn format_name(&self) -> &'static str {
        "json"
    }
}
