//! Remote queue sink
//!
//! Every record becomes one JSON message pushed onto the tail of a named
//! list. There is no batching, buffering or retry: a failed push is returned
//! to the router, which reports it and moves on to the next sink.

use crate::core::{Encoder, JsonEncoder, LogRecord, Result, Sink};
use std::io;

/// A connected (or lazily connecting) client of a list-based queue service.
pub trait QueueClient: Send {
    /// Append `payload` to the list at `key`; returns the new list length.
    fn rpush(&mut self, key: &str, payload: &[u8]) -> Result<i64>;
}

impl<C: QueueClient + ?Sized> QueueClient for Box<C> {
    fn rpush(&mut self, key: &str, payload: &[u8]) -> Result<i64> {
        (**self).rpush(key, payload)
    }
}

/// Byte-stream adapter over a [`QueueClient`]: each write is one message.
///
/// The writer owns the destination key; connection handling belongs to the
/// client.
///
/// # Example
///
/// ```
/// use teelog::sinks::{QueueClient, QueueWriter};
///
/// #[derive(Default)]
/// struct InMemory(Vec<Vec<u8>>);
///
/// impl QueueClient for InMemory {
///     fn rpush(&mut self, _key: &str, payload: &[u8]) -> teelog::Result<i64> {
///         self.0.push(payload.to_vec());
///         Ok(self.0.len() as i64)
///     }
/// }
///
/// let mut writer = QueueWriter::new(InMemory::default(), "logs");
/// assert_eq!(writer.push(b"{}").unwrap(), 2);
/// ```
pub struct QueueWriter<C> {
    client: C,
    key: String,
}

impl<C: QueueClient> QueueWriter<C> {
    pub fn new(client: C, key: impl Into<String>) -> Self {
        Self {
            client,
            key: key.into(),
        }
    }

    /// Push `payload` as one message; returns the number of bytes accepted.
    pub fn push(&mut self, payload: &[u8]) -> Result<usize> {
        self.client.rpush(&self.key, payload)?;
        Ok(payload.len())
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn client_mut(&mut self) -> &mut C {
        &mut self.client
    }
}

impl<C: QueueClient> io::Write for QueueWriter<C> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.push(buf).map_err(io::Error::other)
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Sink pushing one JSON object per record through a [`QueueWriter`].
pub struct QueueSink<C> {
    writer: QueueWriter<C>,
    encoder: JsonEncoder,
    buf: Vec<u8>,
}

impl<C: QueueClient> QueueSink<C> {
    pub fn new(client: C, key: impl Into<String>) -> Self {
        Self::from_writer(QueueWriter::new(client, key))
    }

    pub fn from_writer(writer: QueueWriter<C>) -> Self {
        Self {
            writer,
            encoder: JsonEncoder::unterminated(),
            buf: Vec::with_capacity(256),
        }
    }

    pub fn writer(&self) -> &QueueWriter<C> {
        &self.writer
    }
}

impl<C: QueueClient> Sink for QueueSink<C> {
    fn write(&mut self, record: &LogRecord) -> Result<()> {
        self.buf.clear();
        self.encoder.encode(record, &mut self.buf)?;
        self.writer.push(&self.buf)?;
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "queue"
    }
}
