//! Data-access logging hook

use crate::core::{Fields, LogLevel, Logger};
use std::time::Duration;

/// One line from a database layer's logger.
#[derive(Debug, Clone, PartialEq)]
pub enum DbLogEvent {
    /// An executed statement
    Query {
        source: String,
        duration: Duration,
        sql: String,
        values: Vec<String>,
        rows_affected: i64,
    },
    /// Anything else the layer wants to say (errors, notices)
    Message { source: String, values: Vec<String> },
}

/// Log a database event at Debug under the message `gorm`.
///
/// ```
/// use teelog::integrations::{log_db, DbLogEvent};
/// use teelog::Logger;
/// use std::time::Duration;
///
/// let logger = Logger::builder().build();
/// log_db(&logger, &DbLogEvent::Query {
///     source: "repo/users.rs:40".into(),
///     duration: Duration::from_micros(830),
///     sql: "SELECT * FROM users WHERE id = ?".into(),
///     values: vec!["7".into()],
///     rows_affected: 1,
/// });
/// ```
#[track_caller]
pub fn log_db(logger: &Logger, event: &DbLogEvent) {
    if !logger.enabled(LogLevel::Debug) {
        return;
    }

    let fields = match event {
        DbLogEvent::Query {
            source,
            duration,
            sql,
            values,
            rows_affected,
        } => Fields::new()
            .with("type", "sql")
            .with("source", source)
            .with("duration", *duration)
            .with("sql", sql)
            .with("values", values.join(", "))
            .with("rows_affected", *rows_affected),
        DbLogEvent::Message { source, values } => Fields::new()
            .with("type", "log")
            .with("source", source)
            .with("values", values.join(" ")),
    };
    logger.debugw("gorm", fields);
}
