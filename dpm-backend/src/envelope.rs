use serde::Deserialize;
use serde::Serialize;

use devnet_core::Value;

/// One outbound wire message. `correlation_id` lets the read loop route a
/// response or streamed reading back to the caller or subscription that
/// requested it.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Request {
    Get { correlation_id: u64, drf: String },
    GetMany { correlation_id: u64, drfs: Vec<String> },
    Write { correlation_id: u64, drf: String, value: Value },
    WriteMany { correlation_id: u64, settings: Vec<(String, Value)> },
    Subscribe { correlation_id: u64, drfs: Vec<String> },
    Unsubscribe { correlation_id: u64 },
}

impl Request {
    pub fn correlation_id(&self) -> u64 {
        match self {
            Request::Get { correlation_id, .. }
            | Request::GetMany { correlation_id, .. }
            | Request::Write { correlation_id, .. }
            | Request::WriteMany { correlation_id, .. }
            | Request::Subscribe { correlation_id, .. }
            | Request::Unsubscribe { correlation_id } => *correlation_id,
        }
    }
}

/// One inbound wire message.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Response {
    Reading {
        correlation_id: u64,
        drf: String,
        facility: u8,
        error_code: i8,
        message: Option<String>,
        value: Option<Value>,
    },
    ReadingBatch {
        correlation_id: u64,
        readings: Vec<ReadingWire>,
    },
    WriteResult {
        correlation_id: u64,
        drf: String,
        facility: u8,
        error_code: i8,
        message: Option<String>,
        attempts: u32,
    },
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReadingWire {
    pub drf: String,
    pub facility: u8,
    pub error_code: i8,
    pub message: Option<String>,
    pub value: Option<Value>,
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    #[test]
    fn get_request_serializes_with_a_tagged_kind() {
        let request = Request::Get { correlation_id: 7, drf: "M:OUTTMP".to_string() };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["kind"], "get");
        assert_eq!(json["correlation_id"], 7);
        assert_eq!(json["drf"], "M:OUTTMP");
    }

    #[test]
    fn correlation_id_is_exposed_for_every_request_variant() {
        assert_eq!(Request::Unsubscribe { correlation_id: 3 }.correlation_id(), 3);
        assert_eq!(
            Request::Subscribe { correlation_id: 9, drfs: vec!["M:OUTTMP".to_string()] }.correlation_id(),
            9
        );
    }

    #[test]
    fn reading_response_deserializes_from_a_tagged_payload() {
        let raw = serde_json::json!({
            "kind": "reading",
            "correlation_id": 1,
            "drf": "M:OUTTMP",
            "facility": 0,
            "error_code": 0,
            "message": null,
            "value": {"value_type": "SCALAR", "value": 72.3},
        });
        let response: Response = serde_json::from_value(raw).unwrap();
        match response {
            Response::Reading { correlation_id, drf, value, .. } => {
                assert_eq!(correlation_id, 1);
                assert_eq!(drf, "M:OUTTMP");
                assert_eq!(value, Some(Value::Scalar(72.3)));
            }
            other => panic!("expected Reading, got {other:?}"),
        }
    }

    #[test]
    fn reading_batch_response_carries_its_wire_readings() {
        let raw = serde_json::json!({
            "kind": "reading_batch",
            "correlation_id": 2,
            "readings": [
                {"drf": "M:OUTTMP", "facility": 0, "error_code": 0, "message": null, "value": null},
            ],
        });
        let response: Response = serde_json::from_value(raw).unwrap();
        match response {
            Response::ReadingBatch { correlation_id, readings } => {
                assert_eq!(correlation_id, 2);
                assert_eq!(readings.len(), 1);
                assert_eq!(readings[0].drf, "M:OUTTMP");
            }
            other => panic!("expected ReadingBatch, got {other:?}"),
        }
    }
}
