//! Console sink implementation

use crate::core::{ConsoleEncoder, Encoder, LogRecord, Result, Sink, TimestampFormat};
use std::io::{self, Write};

/// Human-readable output on stdout.
///
/// The writer can be swapped with [`ConsoleSink::with_writer`], which is how
/// tests capture console output.
pub struct ConsoleSink {
    encoder: ConsoleEncoder,
    out: Box<dyn Write + Send>,
    buf: Vec<u8>,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            encoder: ConsoleEncoder::new(),
            out: Box::new(io::stdout()),
            buf: Vec::with_capacity(256),
        }
    }

    /// Write somewhere other than stdout
    #[must_use]
    pub fn with_writer<W: Write + Send + 'static>(mut self, writer: W) -> Self {
        self.out = Box::new(writer);
        self
    }

    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.encoder = self.encoder.with_colors(use_colors);
        self
    }

    /// Set the timestamp format for this sink
    ///
    /// # Examples
    ///
    /// ```
    /// use teelog::sinks::ConsoleSink;
    /// use teelog::core::TimestampFormat;
    ///
    /// let sink = ConsoleSink::new()
    ///     .with_timestamp_format(TimestampFormat::Iso8601Micros);
    /// ```
    #[must_use]
    pub fn with_timestamp_format(mut self, format: TimestampFormat) -> Self {
        self.encoder = self.encoder.with_timestamp_format(format);
        self
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for ConsoleSink {
    fn write(&mut self, record: &LogRecord) -> Result<()> {
        self.buf.clear();
        self.encoder.encode(record, &mut self.buf)?;
        self.out.write_all(&self.buf)?;
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        self.out.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "console"
    }
}
