//! Hooks for web-request and data-access layers
//!
//! These take a [`Logger`](crate::Logger) and plain data, so any HTTP
//! framework or database layer can call them from its own middleware.

pub mod db;
pub mod http;

pub use db::{log_db, DbLogEvent};
pub use http::{log_request, recover, Recovered, RequestLog};
