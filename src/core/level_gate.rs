//! Shared, atomically updated minimum severity

use super::log_level::LogLevel;
use std::fmt;
use std::sync::atomic::{AtomicI8, Ordering};

/// Minimum severity below which logging calls are no-ops.
///
/// Every logger derived from the same root shares one gate through an `Arc`,
/// so `set_level` takes effect for all of them at once. Reads and writes are
/// single atomic operations; a reader observes either the old or the new
/// level, never anything in between.
///
/// # Example
///
/// ```
/// use teelog::{LevelGate, LogLevel};
///
/// let gate = LevelGate::new(LogLevel::Info);
/// assert!(!gate.enabled(LogLevel::Debug));
///
/// gate.set_level(LogLevel::Debug);
/// assert!(gate.enabled(LogLevel::Debug));
/// ```
pub struct LevelGate {
    level: AtomicI8,
}

impl LevelGate {
    pub const fn new(level: LogLevel) -> Self {
        Self {
            level: AtomicI8::new(level as i8),
        }
    }

    #[inline]
    pub fn set_level(&self, level: LogLevel) {
        self.level.store(level.as_i8(), Ordering::Release);
    }

    #[inline]
    pub fn level(&self) -> LogLevel {
        // Only valid discriminants are ever stored.
        LogLevel::clamped(i64::from(self.level.load(Ordering::Acquire)))
    }

    /// `true` iff `level` is at or above the gate.
    #[inline]
    pub fn enabled(&self, level: LogLevel) -> bool {
        level.as_i8() >= self.level.load(Ordering::Acquire)
    }
}

impl Default for LevelGate {
    fn default() -> Self {
        Self::new(LogLevel::Debug)
    }
}

impl fmt::Debug for LevelGate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LevelGate")
            .field("level", &self.level())
            .finish()
    }
}
