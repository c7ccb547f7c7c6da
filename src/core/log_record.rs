//! Log record structure

use super::fields::{FieldValue, Fields};
use super::log_level::LogLevel;
use super::timestamp::TimestampFormat;
use chrono::{DateTime, Utc};
use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::panic::Location;

/// Source location a record is attributed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub file: String,
    pub line: u32,
}

impl Caller {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Parse the `file:line` form produced by `Display`.
    pub fn parse(s: &str) -> Option<Self> {
        let (file, line) = s.rsplit_once(':')?;
        Some(Self::new(file, line.parse().ok()?))
    }
}

impl From<&Location<'_>> for Caller {
    fn from(location: &Location<'_>) -> Self {
        Self::new(location.file(), location.line())
    }
}

impl fmt::Display for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// One log event, built fresh per call and never mutated after dispatch.
///
/// The JSON form is a flat object: the reserved keys `level`, `timestamp`,
/// `logger`, `caller` and `message` come first, followed by every field in
/// insertion order. Fields may reuse reserved names; anything after
/// `message` decodes as a field.
///
/// The encoded `timestamp` has millisecond precision, so a decoded record
/// carries the original instant truncated to the millisecond.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub level: LogLevel,
    pub timestamp: DateTime<Utc>,
    pub logger: Option<String>,
    pub caller: Option<Caller>,
    pub message: String,
    pub fields: Fields,
}

impl LogRecord {
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Utc::now(),
            logger: None,
            caller: None,
            message: message.into(),
            fields: Fields::new(),
        }
    }

    #[must_use]
    pub fn with_fields(mut self, fields: Fields) -> Self {
        self.fields = fields;
        self
    }

    #[must_use]
    pub fn with_caller(mut self, caller: Caller) -> Self {
        self.caller = Some(caller);
        self
    }

    #[must_use]
    pub fn with_logger(mut self, name: impl Into<String>) -> Self {
        self.logger = Some(name.into());
        self
    }

    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

const LEVEL_KEY: &str = "level";
const TIMESTAMP_KEY: &str = "timestamp";
const LOGGER_KEY: &str = "logger";
const CALLER_KEY: &str = "caller";
const MESSAGE_KEY: &str = "message";

impl Serialize for LogRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry(LEVEL_KEY, &self.level)?;
        map.serialize_entry(
            TIMESTAMP_KEY,
            &TimestampFormat::Iso8601.format(&self.timestamp),
        )?;
        if let Some(ref name) = self.logger {
            map.serialize_entry(LOGGER_KEY, name)?;
        }
        if let Some(ref caller) = self.caller {
            map.serialize_entry(CALLER_KEY, &caller.to_string())?;
        }
        map.serialize_entry(MESSAGE_KEY, &self.message)?;
        for (key, value) in self.fields.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for LogRecord {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(RecordVisitor)
    }
}

struct RecordVisitor;

impl<'de> Visitor<'de> for RecordVisitor {
    type Value = LogRecord;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a structured log record object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<LogRecord, A::Error> {
        let mut level = None;
        let mut timestamp = None;
        let mut logger = None;
        let mut caller = None;
        let mut message = None;
        let mut fields = Fields::new();

        // The encoder writes `message` last among the reserved keys, so every
        // key after it is a user field, whatever its name.
        while let Some(key) = map.next_key::<String>()? {
            if message.is_some() {
                let value = map.next_value::<FieldValue>()?;
                fields.push(key, value);
                continue;
            }
            match key.as_str() {
                LEVEL_KEY if level.is_none() => level = Some(map.next_value::<LogLevel>()?),
                TIMESTAMP_KEY if timestamp.is_none() => {
                    let raw = map.next_value::<String>()?;
                    let parsed = DateTime::parse_from_rfc3339(&raw).map_err(|e| {
                        de::Error::custom(format!("invalid timestamp '{}': {}", raw, e))
                    })?;
                    timestamp = Some(parsed.with_timezone(&Utc));
                }
                LOGGER_KEY if logger.is_none() => logger = Some(map.next_value::<String>()?),
                CALLER_KEY if caller.is_none() => {
                    let raw = map.next_value::<String>()?;
                    caller = Some(Caller::parse(&raw).ok_or_else(|| {
                        de::Error::custom(format!("invalid caller '{}'", raw))
                    })?);
                }
                MESSAGE_KEY if message.is_none() => message = Some(map.next_value::<String>()?),
                _ => {
                    let value = map.next_value::<FieldValue>()?;
                    fields.push(key, value);
                }
            }
        }

        Ok(LogRecord {
            level: level.ok_or_else(|| de::Error::missing_field(LEVEL_KEY))?,
            timestamp: timestamp.ok_or_else(|| de::Error::missing_field(TIMESTAMP_KEY))?,
            logger,
            caller,
            message: message.ok_or_else(|| de::Error::missing_field(MESSAGE_KEY))?,
            fields,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_record() -> LogRecord {
        let ts = Utc
            .with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + chrono::Duration::milliseconds(123);
        LogRecord::new(LogLevel::Warn, "disk almost full")
            .with_timestamp(ts)
            .with_logger("storage.disk")
            .with_caller(Caller::new("src/disk.rs", 42))
            .with_fields(Fields::new().with("free_mb", 12).with("mount", "/var"))
    }

    #[test]
    fn test_json_layout() {
        let json = serde_json::to_string(&fixed_record()).unwrap();
        assert_eq!(
            json,
            r#"{"level":"WARN","timestamp":"2025-01-08T10:30:45.123Z","logger":"storage.disk","caller":"src/disk.rs:42","message":"disk almost full","free_mb":12,"mount":"/var"}"#
        );
    }

    #[test]
    fn test_optional_keys_omitted() {
        let record = LogRecord::new(LogLevel::Info, "plain");
        let value: serde_json::Value = serde_json::to_value(&record).unwrap();
        assert!(value.get("logger").is_none());
        assert!(value.get("caller").is_none());
        assert_eq!(value["message"], "plain");
    }

    #[test]
    fn test_decode_preserves_field_order() {
        let record = fixed_record();
        let json = serde_json::to_string(&record).unwrap();
        let decoded: LogRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, record);
    }

    #[test]
    fn test_user_field_shadowing_reserved_key() {
        let record = LogRecord::new(LogLevel::Info, "real")
            .with_fields(Fields::new().with("message", "shadow"));
        let json = serde_json::to_string(&record).unwrap();
        let decoded: LogRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded.message, "real");
        assert_eq!(decoded.fields.get("message"), Some(&FieldValue::from("shadow")));
    }

    #[test]
    fn test_fields_named_like_optional_keys() {
        let record = LogRecord::new(LogLevel::Info, "m").with_fields(
            Fields::new()
                .with("logger", "svc-a")
                .with("caller", "alice")
                .with("level", 3)
                .with("timestamp", "yesterday"),
        );
        let json = serde_json::to_string(&record).unwrap();
        let decoded: LogRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded.logger, None);
        assert_eq!(decoded.caller, None);
        assert_eq!(decoded.level, LogLevel::Info);
        assert_eq!(decoded.fields, record.fields);
    }

    #[test]
    fn test_timestamp_truncated_to_millis() {
        let ts = Utc
            .with_ymd_and_hms(2025, 1, 8, 10, 30, 45)
            .single()
            .expect("valid datetime")
            + chrono::Duration::microseconds(123_456);
        let record = LogRecord::new(LogLevel::Info, "precise").with_timestamp(ts);
        let json = serde_json::to_string(&record).unwrap();
        let decoded: LogRecord = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded.timestamp.timestamp_millis(), ts.timestamp_millis());
        assert_eq!(decoded.timestamp.timestamp_subsec_micros(), 123_000);
    }

    #[test]
    fn test_missing_level_is_rejected() {
        let err = serde_json::from_str::<LogRecord>(
            r#"{"timestamp":"2025-01-08T10:30:45.123Z","message":"x"}"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("level"));
    }

    #[test]
    fn test_caller_parse() {
        assert_eq!(Caller::parse("a/b.rs:7"), Some(Caller::new("a/b.rs", 7)));
        assert_eq!(Caller::parse("no-line"), None);
    }
}
