//! Redis-backed queue client

use super::queue::QueueClient;
use crate::core::{LoggerError, Result};
use redis::{ConnectionAddr, ConnectionInfo, RedisConnectionInfo};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_REDIS_PORT: u16 = 6379;

/// Default timeout for establishing a connection
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(2);

/// [`QueueClient`] pushing onto Redis lists with `RPUSH`.
///
/// The connection is opened on the first push. A push that fails drops the
/// connection, so the next push reconnects; the failed push is not retried.
///
/// # Example
///
/// ```no_run
/// use teelog::sinks::{QueueSink, RedisQueueClient};
///
/// let client = RedisQueueClient::new("127.0.0.1:6379", "", 0).unwrap();
/// let sink = QueueSink::new(client, "logs");
/// ```
pub struct RedisQueueClient {
    client: redis::Client,
    connection: Option<redis::Connection>,
    address: String,
    connect_timeout: Duration,
}

impl RedisQueueClient {
    /// `address` is `host[:port]`; an empty `credential` means no AUTH.
    ///
    /// # Errors
    ///
    /// Returns a configuration error for a malformed address. No network
    /// traffic happens here.
    pub fn new(address: &str, credential: &str, db: i64) -> Result<Self> {
        let (host, port) = parse_address(address)?;
        let info = ConnectionInfo {
            addr: ConnectionAddr::Tcp(host, port),
            redis: RedisConnectionInfo {
                db,
                password: (!credential.is_empty()).then(|| credential.to_string()),
                ..Default::default()
            },
        };
        let client = redis::Client::open(info)
            .map_err(|e| LoggerError::config("queue", format!("invalid redis target: {}", e)))?;

        Ok(Self {
            client,
            connection: None,
            address: address.to_string(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        })
    }

    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn is_connected(&self) -> bool {
        self.connection.is_some()
    }
}

fn parse_address(address: &str) -> Result<(String, u16)> {
    let address = address.trim();
    if address.is_empty() {
        return Err(LoggerError::config("queue", "address must not be empty"));
    }

    match address.rsplit_once(':') {
        Some((host, port)) if !host.is_empty() => {
            let port = port.parse::<u16>().map_err(|_| {
                LoggerError::config("queue", format!("invalid port in address '{}'", address))
            })?;
            Ok((host.to_string(), port))
        }
        Some(_) => Err(LoggerError::config(
            "queue",
            format!("missing host in address '{}'", address),
        )),
        None => Ok((address.to_string(), DEFAULT_REDIS_PORT)),
    }
}

impl QueueClient for RedisQueueClient {
    fn rpush(&mut self, key: &str, payload: &[u8]) -> Result<i64> {
        let connection = match self.connection {
            Some(ref mut connection) => connection,
            None => {
                let connection = self
                    .client
                    .get_connection_with_timeout(self.connect_timeout)
                    .map_err(|e| LoggerError::queue_push(key, e))?;
                self.connection.insert(connection)
            }
        };

        match redis::cmd("RPUSH")
            .arg(key)
            .arg(payload)
            .query::<i64>(connection)
        {
            Ok(len) => Ok(len),
            Err(e) => {
                self.connection = None;
                Err(LoggerError::queue_push(key, e))
            }
        }
    }
}

impl fmt::Debug for RedisQueueClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisQueueClient")
            .field("address", &self.address)
            .field("connected", &self.connection.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_address() {
        assert_eq!(
            parse_address("10.0.0.5:6380").unwrap(),
            ("10.0.0.5".to_string(), 6380)
        );
        assert_eq!(
            parse_address("cache.internal").unwrap(),
            ("cache.internal".to_string(), DEFAULT_REDIS_PORT)
        );
        assert!(parse_address("host:notaport").is_err());
        assert!(parse_address(":6379").is_err());
        assert!(parse_address("").is_err());
    }

    #[test]
    fn test_new_does_not_connect() {
        let client = RedisQueueClient::new("127.0.0.1:1", "secret", 3).unwrap();
        assert!(!client.is_connected());
        assert_eq!(client.address(), "127.0.0.1:1");
    }

    #[test]
    fn test_unreachable_server_fails_and_stays_disconnected() {
        let mut client = RedisQueueClient::new("127.0.0.1:1", "", 0)
            .unwrap()
            .with_connect_timeout(Duration::from_millis(200));

        let err = client.rpush("logs", b"{}").unwrap_err();
        assert!(matches!(err, LoggerError::QueuePush { .. }));
        assert!(!client.is_connected());
    }
}
