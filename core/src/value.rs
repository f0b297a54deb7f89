use serde::Deserialize;
use serde::Serialize;

/// A device value, tagged by shape. `value_type` travels alongside on the
/// wire (JSON audit log, gRPC proxy payloads) so a consumer that only has
/// the serialized form still knows how to interpret it without inspecting
/// the tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "value_type", content = "value", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Value {
    Scalar(f64),
    ScalarArray(Vec<f64>),
    Text(String),
    /// Bit-packed digital status/control value.
    Digital(u32),
}

impl Value {
    pub fn value_type(&self) -> &'static str {
        match self {
            Value::Scalar(_) => "SCALAR",
            Value::ScalarArray(_) => "SCALAR_ARRAY",
            Value::Text(_) => "TEXT",
            Value::Digital(_) => "DIGITAL",
        }
    }

    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            Value::Scalar(v) => Some(*v),
            _ => None,
        }
    }
}
