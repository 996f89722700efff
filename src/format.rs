//! Wire formats: a schema fragment plus a converter for inbound values.
//!
//! A field typed with a [`Format`] takes its schema from the format, and the
//! endpoint registers the format under the schema's `format` discriminator so
//! binding can decode matching values.

use jiff::Timestamp;
use jiff::civil::{Date, DateTime};
use jiff::tz::TimeZone;
use serde_json::Value;

use crate::schema::Schema;
use crate::values::FieldValue;

/// A value could not be read in the target representation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("expected {expected}, got {value}")]
pub struct Invalid {
    pub expected: &'static str,
    pub value: String,
}

impl Invalid {
    pub fn new(expected: &'static str, value: impl Into<String>) -> Self {
        Self {
            expected,
            value: value.into(),
        }
    }

    fn of(expected: &'static str, value: &Value) -> Self {
        match value {
            Value::String(s) => Self::new(expected, s.clone()),
            other => Self::new(expected, other.to_string()),
        }
    }
}

/// A named wire representation.
pub trait Format: Send + Sync + 'static {
    /// Schema fragment documenting the representation. Its `format` names the
    /// discriminator the format is registered under.
    fn schema(&self) -> Schema;

    /// Convert an inbound value. `Ok(None)` leaves the field unassigned.
    fn decode(&self, value: &Value) -> Result<Option<FieldValue>, Invalid>;
}

/// RFC 3339 timestamps (`"format": "date-time"`).
///
/// Accepts full timestamps, plain dates (taken as midnight UTC) and epoch
/// milliseconds. An empty string is treated as no value.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeFormat;

impl Format for DateTimeFormat {
    fn schema(&self) -> Schema {
        Schema::of("string").with_format("date-time")
    }

    fn decode(&self, value: &Value) -> Result<Option<FieldValue>, Invalid> {
        let timestamp = match value {
            Value::String(s) if s.is_empty() => return Ok(None),
            Value::String(s) => parse_timestamp(s).ok_or_else(|| Invalid::of("date-time", value))?,
            Value::Number(n) => n
                .as_i64()
                .and_then(|ms| Timestamp::from_millisecond(ms).ok())
                .ok_or_else(|| Invalid::of("date-time", value))?,
            _ => return Err(Invalid::of("date-time", value)),
        };
        Ok(Some(FieldValue::Timestamp(timestamp)))
    }
}

/// Values without an offset are read as UTC. The date-only fallback applies
/// only when there is no time part, since `Date` parsing drops one.
fn parse_timestamp(s: &str) -> Option<Timestamp> {
    if let Ok(ts) = s.parse::<Timestamp>() {
        return Some(ts);
    }
    if let Ok(civil) = s.parse::<DateTime>() {
        return civil.to_zoned(TimeZone::UTC).ok().map(|z| z.timestamp());
    }
    if s.contains(['T', 't', ' ', ':']) {
        return None;
    }
    let date = s.parse::<Date>().ok()?;
    date.to_zoned(TimeZone::UTC).ok().map(|z| z.timestamp())
}

/// Calendar dates (`"format": "date"`), e.g. `2024-01-15`.
#[derive(Debug, Clone, Copy, Default)]
pub struct DateFormat;

impl Format for DateFormat {
    fn schema(&self) -> Schema {
        Schema::of("string").with_format("date")
    }

    fn decode(&self, value: &Value) -> Result<Option<FieldValue>, Invalid> {
        match value {
            Value::String(s) if s.is_empty() => Ok(None),
            Value::String(s) => s
                .parse::<Date>()
                .map(|d| Some(FieldValue::Date(d)))
                .map_err(|_| Invalid::of("date", value)),
            _ => Err(Invalid::of("date", value)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn date_time_schema() {
        let schema = DateTimeFormat.schema();
        assert_eq!(schema.kind.as_deref(), Some("string"));
        assert_eq!(schema.format.as_deref(), Some("date-time"));
    }

    #[test]
    fn date_time_parses_rfc3339() {
        let decoded = DateTimeFormat.decode(&json!("2024-01-15T10:00:00Z")).unwrap();
        let expected: Timestamp = "2024-01-15T10:00:00Z".parse().unwrap();
        assert!(matches!(decoded, Some(FieldValue::Timestamp(ts)) if ts == expected));
    }

    #[test]
    fn date_time_accepts_plain_date_and_millis() {
        let from_date = DateTimeFormat.decode(&json!("2024-01-15")).unwrap();
        let midnight: Timestamp = "2024-01-15T00:00:00Z".parse().unwrap();
        assert!(matches!(from_date, Some(FieldValue::Timestamp(ts)) if ts == midnight));

        let from_ms = DateTimeFormat.decode(&json!(0)).unwrap();
        assert!(matches!(from_ms, Some(FieldValue::Timestamp(ts)) if ts == Timestamp::UNIX_EPOCH));
    }

    #[test]
    fn date_time_without_offset_keeps_time() {
        let expected: Timestamp = "2024-01-15T10:00:00Z".parse().unwrap();
        for input in ["2024-01-15T10:00:00", "2024-01-15 10:00:00"] {
            let decoded = DateTimeFormat.decode(&json!(input)).unwrap();
            assert!(
                matches!(decoded, Some(FieldValue::Timestamp(ts)) if ts == expected),
                "{input} decoded to {decoded:?}"
            );
        }
    }

    #[test]
    fn date_time_with_bad_time_part_is_rejected() {
        assert!(DateTimeFormat.decode(&json!("2024-01-15T25:00:00")).is_err());
        assert!(DateTimeFormat.decode(&json!("2024-01-15Tnoon")).is_err());
    }

    #[test]
    fn date_time_rejects_garbage() {
        let err = DateTimeFormat.decode(&json!("not-a-date")).unwrap_err();
        assert_eq!(err.expected, "date-time");
        assert_eq!(err.value, "not-a-date");
        assert!(DateTimeFormat.decode(&json!(true)).is_err());
    }

    #[test]
    fn empty_string_is_no_value() {
        assert!(DateTimeFormat.decode(&json!("")).unwrap().is_none());
        assert!(DateFormat.decode(&json!("")).unwrap().is_none());
    }

    #[test]
    fn date_format() {
        let decoded = DateFormat.decode(&json!("2024-02-29")).unwrap();
        assert!(matches!(decoded, Some(FieldValue::Date(d)) if d == jiff::civil::date(2024, 2, 29)));
        assert!(DateFormat.decode(&json!("2023-02-29")).is_err());
    }
}
