//! Process-wide default logger
//!
//! Prefer passing a [`Logger`] to the code that needs it. This module is the
//! narrow accessor for call sites that cannot be given one: a single gate
//! shared by every logger built through [`configure`], and a default logger
//! that starts as a development console logger and can be replaced wholesale.
//!
//! The gate is created on first use. Its initial level is Debug unless the
//! `DEBUG_LEVEL` environment variable holds an integer between -1 (Debug) and
//! 5 (Fatal).

use crate::core::{Fields, LevelGate, LogConfig, LogLevel, Logger, Result};
use crate::sinks::ConsoleSink;
use parking_lot::RwLock;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Environment variable holding the initial gate level as an integer.
pub const LEVEL_ENV_VAR: &str = "DEBUG_LEVEL";

static GATE: OnceLock<Arc<LevelGate>> = OnceLock::new();
static LOGGER: OnceLock<RwLock<Arc<Logger>>> = OnceLock::new();

/// The process-wide gate.
pub fn gate() -> &'static Arc<LevelGate> {
    GATE.get_or_init(|| {
        let raw = std::env::var(LEVEL_ENV_VAR).ok();
        Arc::new(LevelGate::new(level_from_env(raw.as_deref())))
    })
}

fn level_from_env(raw: Option<&str>) -> LogLevel {
    let Some(value) = raw.and_then(|r| r.trim().parse::<i64>().ok()) else {
        return LogLevel::Debug;
    };

    match LogLevel::try_from(value) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("[teelog] ignoring {}: {}", LEVEL_ENV_VAR, e);
            LogLevel::Debug
        }
    }
}

pub fn set_level(level: LogLevel) {
    gate().set_level(level);
}

pub fn current_level() -> LogLevel {
    gate().level()
}

fn slot() -> &'static RwLock<Arc<Logger>> {
    LOGGER.get_or_init(|| {
        let logger = Logger::builder()
            .gate(Arc::clone(gate()))
            .development(true)
            .caller_skip(1)
            .sink(LogLevel::Debug, ConsoleSink::new())
            .build();
        RwLock::new(Arc::new(logger))
    })
}

/// The current default logger.
///
/// Callers holding the returned handle keep using it even if it is replaced
/// in the meantime.
pub fn logger() -> Arc<Logger> {
    Arc::clone(&slot().read())
}

/// Install `logger` as the default, then flush the one it replaces.
///
/// `set_level` only reaches the new logger if it was built on [`gate`].
pub fn set_logger(logger: Logger) {
    let previous = std::mem::replace(&mut *slot().write(), Arc::new(logger));
    if let Err(e) = previous.sync() {
        eprintln!("[teelog] flushing the replaced logger failed: {}", e);
    }
}

/// Build a logger from `config` on the process gate and install it.
///
/// # Errors
///
/// Decoding, validation and sink construction errors are returned and the
/// current default logger stays in place.
pub fn configure(config: &serde_json::Value) -> Result<()> {
    let logger = LogConfig::from_value(config)?.build(Arc::clone(gate()))?;
    set_logger(logger);
    Ok(())
}

/// Child of the default logger carrying `fields`.
pub fn with(fields: Fields) -> Logger {
    logger().with(fields)
}

/// Child of the default logger with `name` appended.
pub fn named(name: &str) -> Logger {
    logger().named(name)
}

pub fn sync() -> Result<()> {
    logger().sync()
}

macro_rules! global_leveled {
    ($plain:ident, $formatted:ident, $keyed:ident) => {
        #[track_caller]
        pub fn $plain(message: impl Into<String>) {
            logger().$plain(message);
        }

        #[track_caller]
        pub fn $formatted(args: fmt::Arguments<'_>) {
            logger().$formatted(args);
        }

        #[track_caller]
        pub fn $keyed(message: impl Into<String>, fields: Fields) {
            logger().$keyed(message, fields);
        }
    };
}

global_leveled!(debug, debugf, debugw);
global_leveled!(info, infof, infow);
global_leveled!(warn, warnf, warnw);
global_leveled!(error, errorf, errorw);
global_leveled!(dpanic, dpanicf, dpanicw);

#[track_caller]
pub fn panic(message: impl Into<String>) -> ! {
    logger().panic(message)
}

#[track_caller]
pub fn panicf(args: fmt::Arguments<'_>) -> ! {
    logger().panicf(args)
}

#[track_caller]
pub fn panicw(message: impl Into<String>, fields: Fields) -> ! {
    logger().panicw(message, fields)
}

#[track_caller]
pub fn fatal(message: impl Into<String>) -> ! {
    logger().fatal(message)
}

#[track_caller]
pub fn fatalf(args: fmt::Arguments<'_>) -> ! {
    logger().fatalf(args)
}

#[track_caller]
pub fn fatalw(message: impl Into<String>, fields: Fields) -> ! {
    logger().fatalw(message, fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{LogRecord, Sink};
    use parking_lot::Mutex;

    // The default logger and gate are process-wide; tests touching them
    // take this lock.
    static SERIAL: Mutex<()> = Mutex::new(());

    struct Collect(Arc<Mutex<Vec<LogRecord>>>, Arc<Mutex<usize>>);

    impl Sink for Collect {
        fn write(&mut self, record: &LogRecord) -> Result<()> {
            self.0.lock().push(record.clone());
            Ok(())
        }

        fn sync(&mut self) -> Result<()> {
            *self.1.lock() += 1;
            Ok(())
        }

        fn name(&self) -> &str {
            "collect"
        }
    }

    fn install() -> (Arc<Mutex<Vec<LogRecord>>>, Arc<Mutex<usize>>) {
        let records = Arc::new(Mutex::new(Vec::new()));
        let syncs = Arc::new(Mutex::new(0));
        set_logger(
            Logger::builder()
                .gate(Arc::clone(gate()))
                .sink(
                    LogLevel::Debug,
                    Collect(Arc::clone(&records), Arc::clone(&syncs)),
                )
                .build(),
        );
        (records, syncs)
    }

    #[test]
    fn test_level_from_env() {
        assert_eq!(level_from_env(None), LogLevel::Debug);
        assert_eq!(level_from_env(Some("2")), LogLevel::Error);
        assert_eq!(level_from_env(Some(" 0 ")), LogLevel::Info);
        assert_eq!(level_from_env(Some("-1")), LogLevel::Debug);
        assert_eq!(level_from_env(Some("42")), LogLevel::Debug);
        assert_eq!(level_from_env(Some("loud")), LogLevel::Debug);
    }

    #[test]
    fn test_free_functions_use_installed_logger() {
        let _serial = SERIAL.lock();
        let (records, _) = install();
        set_level(LogLevel::Debug);

        info("hello");
        warnw("careful", Fields::new().with("k", "v"));
        named("svc").errorf(format_args!("code {}", 7));

        let records = records.lock();
        assert_eq!(records.len(), 3);
        assert_eq!(records[1].fields.get("k"), Some(&"v".into()));
        assert_eq!(records[2].logger.as_deref(), Some("svc"));
        assert_eq!(records[2].message, "code 7");
    }

    #[test]
    fn test_replacement_syncs_previous() {
        let _serial = SERIAL.lock();
        let (_, first_syncs) = install();
        let held = logger();

        let (second_records, _) = install();
        assert_eq!(*first_syncs.lock(), 1);

        // A handle taken before the swap still points at the old logger.
        held.info("late");
        assert!(second_records.lock().is_empty());
    }

    #[test]
    fn test_gate_is_shared() {
        let _serial = SERIAL.lock();
        let (records, _) = install();

        set_level(LogLevel::Warn);
        assert_eq!(current_level(), LogLevel::Warn);
        info("filtered");
        warn("kept");
        set_level(LogLevel::Debug);

        let records = records.lock();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].message, "kept");
    }

    #[test]
    fn test_failed_configure_keeps_current_logger() {
        let _serial = SERIAL.lock();
        let (records, _) = install();

        let err = configure(&serde_json::json!({ "console": { "priority": 17 } }));
        assert!(err.is_err());

        info("still here");
        assert_eq!(records.lock().len(), 1);
    }
}
