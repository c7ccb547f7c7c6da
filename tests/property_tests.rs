//! Property-based tests for teelog
//!
//! These tests verify invariants that must hold for any input:
//! - A record passes the gate iff its level is at or above the gate level
//! - Each sink sees a record iff the level is at or above its own threshold
//! - Level changes are observed by the very next call
//! - Encoded records decode to the same level, message, time and fields
//! - Integer and string level forms agree
//! - Console output never spans more than one line

use parking_lot::Mutex;
use proptest::prelude::*;
use std::sync::Arc;
use teelog::prelude::*;
use teelog::{ConsoleEncoder, Encoder, JsonEncoder, LevelGate};

struct Collect(Arc<Mutex<Vec<LogRecord>>>);

impl Sink for Collect {
    fn write(&mut self, record: &LogRecord) -> Result<()> {
        self.0.lock().push(record.clone());
        Ok(())
    }

    fn sync(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str {
        "collect"
    }
}

// ============================================================================
// Strategies
// ============================================================================

/// Levels a call can be made at without terminating the test.
fn any_callable_level() -> impl Strategy<Value = LogLevel> {
    prop_oneof![
        Just(LogLevel::Debug),
        Just(LogLevel::Info),
        Just(LogLevel::Warn),
        Just(LogLevel::Error),
        Just(LogLevel::DPanic),
    ]
}

fn any_level() -> impl Strategy<Value = LogLevel> {
    proptest::sample::select(LogLevel::ALL.to_vec())
}

fn any_field_value() -> impl Strategy<Value = FieldValue> {
    prop_oneof![
        "[a-zA-Z0-9 _.-]{0,20}".prop_map(FieldValue::String),
        any::<i64>().prop_map(FieldValue::Int),
        any::<bool>().prop_map(FieldValue::Bool),
        Just(FieldValue::Null),
    ]
}

/// Field keys, including every name the record itself uses on the wire.
fn any_field_key() -> impl Strategy<Value = String> {
    prop_oneof![
        "f_[a-z]{1,8}",
        Just("level".to_string()),
        Just("timestamp".to_string()),
        Just("logger".to_string()),
        Just("caller".to_string()),
        Just("message".to_string()),
    ]
}

fn any_fields() -> impl Strategy<Value = Vec<(String, FieldValue)>> {
    prop::collection::vec((any_field_key(), any_field_value()), 0..6)
}

// ============================================================================
// Filtering
// ============================================================================

proptest! {
    #[test]
    fn prop_gate_admits_iff_at_or_above(level in any_callable_level(), gate_level in any_level()) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let logger = Logger::builder()
            .gate(Arc::new(LevelGate::new(gate_level)))
            .sink(LogLevel::Debug, Collect(Arc::clone(&seen)))
            .build();

        logger.log(level, "sample");

        prop_assert_eq!(seen.lock().len() == 1, level >= gate_level);
    }

    #[test]
    fn prop_sink_thresholds_are_independent(
        level in any_callable_level(),
        first in any_level(),
        second in any_level(),
    ) {
        let a = Arc::new(Mutex::new(Vec::new()));
        let b = Arc::new(Mutex::new(Vec::new()));
        let logger = Logger::builder()
            .sink(first, Collect(Arc::clone(&a)))
            .sink(second, Collect(Arc::clone(&b)))
            .build();

        logger.log(level, "sample");

        prop_assert_eq!(a.lock().len() == 1, level >= first);
        prop_assert_eq!(b.lock().len() == 1, level >= second);
    }

    #[test]
    fn prop_set_level_observed_immediately(levels in prop::collection::vec(any_level(), 1..10)) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let logger = Logger::builder()
            .sink(LogLevel::Debug, Collect(Arc::clone(&seen)))
            .build();

        let mut expected = 0;
        for gate_level in levels {
            logger.set_level(gate_level);
            prop_assert_eq!(logger.level(), gate_level);
            logger.warn("sample");
            if LogLevel::Warn >= gate_level {
                expected += 1;
            }
            prop_assert_eq!(seen.lock().len(), expected);
        }
    }
}

// ============================================================================
// Encoding
// ============================================================================

proptest! {
    #[test]
    fn prop_json_encoding_preserves_record(
        level in any_level(),
        message in "\\PC{0,40}",
        fields in any_fields(),
        logger_name in proptest::option::of("[a-z]{1,6}"),
        millis in 0i64..4_000_000_000_000,
    ) {
        let timestamp = chrono::DateTime::from_timestamp_millis(millis).unwrap();
        let mut record = LogRecord::new(level, message.clone())
            .with_timestamp(timestamp)
            .with_fields(fields.iter().cloned().collect());
        record.logger = logger_name.clone();

        let mut buf = Vec::new();
        JsonEncoder::new().encode(&record, &mut buf).unwrap();
        prop_assert_eq!(buf.last(), Some(&b'\n'));

        let decoded = JsonEncoder::decode(&buf).unwrap();
        prop_assert_eq!(decoded.level, level);
        prop_assert_eq!(decoded.message, message);
        prop_assert_eq!(decoded.timestamp.timestamp_millis(), millis);
        prop_assert_eq!(decoded.logger, logger_name);
        prop_assert_eq!(decoded.caller, None);
        let decoded_fields: Vec<(String, FieldValue)> = decoded
            .fields
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        prop_assert_eq!(decoded_fields, fields);
    }

    #[test]
    fn prop_console_line_is_single_line(message in "\\PC*|[\\n\\r\\t a-z]{0,40}") {
        let record = LogRecord::new(LogLevel::Info, message)
            .with_fields(Fields::new().with("k", "a\nb"));
        let mut buf = Vec::new();
        ConsoleEncoder::new().with_colors(false).encode(&record, &mut buf).unwrap();

        let text = String::from_utf8(buf).unwrap();
        prop_assert_eq!(text.matches('\n').count(), 1);
        prop_assert!(text.ends_with('\n'));
    }
}

// ============================================================================
// Level conversions
// ============================================================================

proptest! {
    #[test]
    fn prop_level_string_round_trip(level in any_level()) {
        let parsed: LogLevel = level.to_string().parse().unwrap();
        prop_assert_eq!(parsed, level);
        let lower: LogLevel = level.to_str().to_lowercase().parse().unwrap();
        prop_assert_eq!(lower, level);
    }

    #[test]
    fn prop_level_integer_range(value in -100i64..100) {
        let in_range = (-1..=5).contains(&value);
        match LogLevel::try_from(value) {
            Ok(level) => {
                prop_assert!(in_range);
                prop_assert_eq!(level.as_i8() as i64, value);
            }
            Err(_) => prop_assert!(!in_range),
        }

        let clamped = LogLevel::clamped(value);
        prop_assert!(clamped >= LogLevel::MIN && clamped <= LogLevel::MAX);
    }
}
