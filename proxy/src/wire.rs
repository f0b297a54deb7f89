//! Conversions between the wire (`pb::*`) and core (`devnet_core::*`)
//! representations of values and readings.

use devnet_core::Reading;
use devnet_core::Value;

use crate::pb;

pub fn value_to_proto(value: &Value) -> pb::Value {
    pb::Value { value: Some(value_to_proto_oneof(value)) }
}

fn value_to_proto_oneof(value: &Value) -> pb::value::Value {
    match value {
        Value::Scalar(v) => pb::value::Value::Scalar(*v),
        Value::ScalarArray(v) => pb::value::Value::ScalarArray(pb::ScalarArray { values: v.clone() }),
        Value::Text(v) => pb::value::Value::Text(v.clone()),
        Value::Digital(v) => pb::value::Value::Digital(*v),
    }
}

pub fn proto_to_value(value: &pb::Value) -> Option<Value> {
    match value.value.as_ref()? {
        pb::value::Value::Scalar(v) => Some(Value::Scalar(*v)),
        pb::value::Value::ScalarArray(v) => Some(Value::ScalarArray(v.values.clone())),
        pb::value::Value::Text(v) => Some(Value::Text(v.clone())),
        pb::value::Value::Digital(v) => Some(Value::Digital(*v)),
    }
}

pub fn reading_to_proto(reading: &Reading) -> pb::Reading {
    pb::Reading {
        drf: reading.drf.clone(),
        facility: reading.facility as u32,
        error_code: reading.error_code as i32,
        message: reading.message.clone().unwrap_or_default(),
        timestamp: reading.timestamp.to_rfc3339(),
        value: reading.value.as_ref().map(|v| match v {
            Value::Scalar(s) => pb::reading::Value::Scalar(*s),
            Value::ScalarArray(s) => pb::reading::Value::ScalarArray(pb::ScalarArray { values: s.clone() }),
            Value::Text(s) => pb::reading::Value::Text(s.clone()),
            Value::Digital(s) => pb::reading::Value::Digital(*s),
        }),
    }
}

pub fn proto_reading_to_core(reading: &pb::Reading) -> Reading {
    let timestamp = chrono::DateTime::parse_from_rfc3339(&reading.timestamp)
        .map(|dt| dt.with_timezone(&chrono::Local))
        .unwrap_or_else(|_| chrono::Local::now());
    let value = reading.value.as_ref().map(|v| match v {
        pb::reading::Value::Scalar(s) => Value::Scalar(*s),
        pb::reading::Value::ScalarArray(s) => Value::ScalarArray(s.values.clone()),
        pb::reading::Value::Text(s) => Value::Text(s.clone()),
        pb::reading::Value::Digital(s) => Value::Digital(*s),
    });
    Reading {
        drf: reading.drf.clone(),
        value,
        facility: reading.facility as u8,
        error_code: reading.error_code as i8,
        message: if reading.message.is_empty() { None } else { Some(reading.message.clone()) },
        timestamp,
        meta: None,
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn value_round_trips_through_the_wire_form_for_every_variant() {
        for value in [
            Value::Scalar(72.3),
            Value::ScalarArray(vec![1.0, 2.0, 3.0]),
            Value::Text("OK".to_string()),
            Value::Digital(0xFF),
        ] {
            let wire = value_to_proto(&value);
            assert_eq!(proto_to_value(&wire), Some(value));
        }
    }

    #[test]
    fn reading_round_trips_through_the_wire_form() {
        let reading = Reading::ok("M:OUTTMP", Value::Scalar(72.3), chrono::Local::now());
        let wire = reading_to_proto(&reading);
        let back = proto_reading_to_core(&wire);
        assert_eq!(back.drf, reading.drf);
        assert_eq!(back.value, reading.value);
        assert_eq!(back.error_code, reading.error_code);
    }

    #[test]
    fn error_reading_has_no_value_and_carries_its_message() {
        let reading = Reading::error("M:OUTTMP", 16, -13, "property not found", chrono::Local::now());
        let wire = reading_to_proto(&reading);
        assert!(wire.value.is_none());
        assert_eq!(wire.message, "property not found");

        let back = proto_reading_to_core(&wire);
        assert!(back.value.is_none());
        assert_eq!(back.message.as_deref(), Some("property not found"));
        assert!(back.is_error());
    }
}
