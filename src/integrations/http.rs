//! Request logging and panic recovery for HTTP handlers

use crate::core::{Fields, LogLevel, Logger};
use chrono::{SecondsFormat, Utc};
use std::any::Any;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;

/// What a finished request looked like, as seen by the middleware.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RequestLog {
    pub method: String,
    pub path: String,
    pub query: String,
    pub status: u16,
    pub client_ip: String,
    pub user_agent: String,
    pub latency: Duration,
    /// Errors the handler attached; each one is logged at Error instead of
    /// the Info summary line.
    pub errors: Vec<String>,
}

impl RequestLog {
    pub fn new(method: impl Into<String>, path: impl Into<String>, status: u16) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            status,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    #[must_use]
    pub fn with_client_ip(mut self, ip: impl Into<String>) -> Self {
        self.client_ip = ip.into();
        self
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    #[must_use]
    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.errors.push(error.into());
        self
    }
}

fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Log a completed request.
///
/// Without handler errors this is one Info record whose message is the path,
/// with `status`, `method`, `path`, `query`, `ip`, `user-agent`, `latency`
/// and `time` fields. With errors, each error is logged at Error instead.
///
/// ```
/// use teelog::integrations::{log_request, RequestLog};
/// use teelog::Logger;
/// use std::time::Duration;
///
/// let logger = Logger::builder().build();
/// let request = RequestLog::new("GET", "/users", 200)
///     .with_query("page=2")
///     .with_latency(Duration::from_millis(12));
/// log_request(&logger, &request);
/// ```
#[track_caller]
pub fn log_request(logger: &Logger, request: &RequestLog) {
    if !request.errors.is_empty() {
        for error in &request.errors {
            logger.error(error.as_str());
        }
        return;
    }

    if !logger.enabled(LogLevel::Info) {
        return;
    }

    let fields = Fields::new()
        .with("status", request.status)
        .with("method", &request.method)
        .with("path", &request.path)
        .with("query", &request.query)
        .with("ip", &request.client_ip)
        .with("user-agent", &request.user_agent)
        .with("latency", request.latency)
        .with("time", now_rfc3339());
    logger.infow(request.path.as_str(), fields);
}

/// The controlled failure a recovered panic turns into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovered {
    pub status: u16,
    pub message: String,
}

impl fmt::Display for Recovered {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.status, self.message)
    }
}

fn panic_text(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

/// Run `handler`, turning a panic into an Error record and a 500.
///
/// `request` describes the request in whatever form the caller has (for
/// example its request line and headers); it is logged verbatim.
///
/// ```
/// use teelog::integrations::recover;
/// use teelog::Logger;
///
/// let logger = Logger::builder().build();
/// let outcome = recover(&logger, "GET /boom", || -> u16 { panic!("handler bug") });
/// assert_eq!(outcome.unwrap_err().status, 500);
/// ```
#[track_caller]
pub fn recover<T, F>(logger: &Logger, request: &str, handler: F) -> Result<T, Recovered>
where
    F: FnOnce() -> T,
{
    match catch_unwind(AssertUnwindSafe(handler)) {
        Ok(value) => Ok(value),
        Err(payload) => {
            let message = panic_text(payload.as_ref());
            logger.errorw(
                "[Recovery from panic]",
                Fields::new()
                    .with("time", now_rfc3339())
                    .with("error", message.as_str())
                    .with("request", request),
            );
            Err(Recovered {
                status: 500,
                message,
            })
        }
    }
}
