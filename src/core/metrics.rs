//! Router metrics for observability
//!
//! Counters for monitoring fan-out health: how many records went through the
//! router, how many sink writes happened, and how many of them failed.

use std::sync::atomic::{AtomicU64, Ordering};

/// Counters kept by a [`Tee`](super::tee::Tee).
///
/// # Example
///
/// ```
/// use teelog::TeeMetrics;
///
/// let metrics = TeeMetrics::new();
/// metrics.record_dispatched();
/// metrics.record_write();
/// metrics.record_write_failure();
///
/// assert_eq!(metrics.dispatched(), 1);
/// assert_eq!(metrics.failure_rate(), 50.0);
/// ```
#[derive(Debug)]
pub struct TeeMetrics {
    /// Records that passed the gate and reached the router
    dispatched: AtomicU64,

    /// Successful sink writes
    writes: AtomicU64,

    /// Sink writes that returned an error or panicked
    write_failures: AtomicU64,

    /// Sink syncs that returned an error or panicked
    sync_failures: AtomicU64,
}

impl TeeMetrics {
    /// Create a new metrics instance with all counters at zero
    pub const fn new() -> Self {
        Self {
            dispatched: AtomicU64::new(0),
            writes: AtomicU64::new(0),
            write_failures: AtomicU64::new(0),
            sync_failures: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn dispatched(&self) -> u64 {
        self.dispatched.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn writes(&self) -> u64 {
        self.writes.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn write_failures(&self) -> u64 {
        self.write_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn sync_failures(&self) -> u64 {
        self.sync_failures.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn record_dispatched(&self) -> u64 {
        self.dispatched.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_write(&self) -> u64 {
        self.writes.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_write_failure(&self) -> u64 {
        self.write_failures.fetch_add(1, Ordering::Relaxed)
    }

    #[inline]
    pub fn record_sync_failure(&self) -> u64 {
        self.sync_failures.fetch_add(1, Ordering::Relaxed)
    }

    /// Failed writes as a percentage (0.0 - 100.0) of attempted writes
    ///
    /// Returns 0.0 if no writes have been attempted.
    pub fn failure_rate(&self) -> f64 {
        let failed = self.write_failures() as f64;
        let total = self.writes() as f64 + failed;
        if total == 0.0 {
            0.0
        } else {
            (failed / total) * 100.0
        }
    }
}

impl Default for TeeMetrics {
    fn default() -> Self {
        Self::new()
    }
}
