use chrono::DateTime;
use chrono::Local;
use serde::Deserialize;
use serde::Serialize;
use serde_json::Value as JsonValue;

use crate::errors::status_message;
use crate::value::Value;

/// One device reading — the result of a `get`/`getMany`/subscription
/// dispatch. `ok`/`is_error` are derived from `error_code` rather than
/// stored redundantly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reading {
    pub drf: String,
    pub value: Option<Value>,
    pub facility: u8,
    pub error_code: i8,
    pub message: Option<String>,
    pub timestamp: DateTime<Local>,
    pub meta: Option<JsonValue>,
}

impl Reading {
    pub fn ok(drf: impl Into<String>, value: Value, timestamp: DateTime<Local>) -> Self {
        Reading {
            drf: drf.into(),
            value: Some(value),
            facility: 0,
            error_code: 0,
            message: None,
            timestamp,
            meta: None,
        }
    }

    pub fn error(
        drf: impl Into<String>,
        facility: u8,
        error_code: i8,
        message: impl Into<String>,
        timestamp: DateTime<Local>,
    ) -> Self {
        Reading {
            drf: drf.into(),
            value: None,
            facility,
            error_code,
            message: Some(message.into()),
            timestamp,
            meta: None,
        }
    }

    pub fn value_type(&self) -> Option<&'static str> {
        self.value.as_ref().map(Value::value_type)
    }

    pub fn is_ok(&self) -> bool {
        self.error_code == 0
    }

    pub fn is_error(&self) -> bool {
        self.error_code < 0
    }

    pub fn is_warning(&self) -> bool {
        self.error_code > 0
    }

    /// A human-readable status line, preferring the explicit `message` and
    /// falling back to a generic facility/error-number description.
    pub fn status_text(&self) -> Option<String> {
        self.message
            .clone()
            .or_else(|| status_message(self.facility, self.error_code))
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn now() -> DateTime<Local> {
        DateTime::parse_from_rfc3339("2026-01-01T00:00:00Z")
            .unwrap()
            .with_timezone(&Local)
    }

    #[test]
    fn ok_reading_has_no_error() {
        let r = Reading::ok("M:OUTTMP", Value::Scalar(72.3), now());
        assert!(r.is_ok());
        assert!(!r.is_error());
        assert!(!r.is_warning());
    }

    #[test]
    fn negative_code_is_error() {
        let r = Reading::error("M:OUTTMP", 16, -13, "property not found", now());
        assert!(r.is_error());
        assert_eq!(r.status_text().as_deref(), Some("property not found"));
    }

    #[test]
    fn positive_code_is_warning() {
        let mut r = Reading::ok("M:OUTTMP", Value::Scalar(1.0), now());
        r.error_code = 2;
        r.message = None;
        assert!(r.is_warning());
        assert!(r.status_text().is_some());
    }
}
