use crate::error::{ArrayError, ArrayResult};
use crate::types::{ElementType, Value};

/// `bool`: a single byte on the wire, `t` / `f` in text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BoolCodec;

impl BoolCodec {
    fn value(value: &Value) -> ArrayResult<bool> {
        match value {
            Value::Bool(b) => Ok(*b),
            other => Err(ArrayError::TypeMismatch {
                expected: ElementType::Bool,
                found: other.type_name(),
            }),
        }
    }

    pub fn encode(&self, value: &Value) -> ArrayResult<Vec<u8>> {
        Ok(vec![Self::value(value)? as u8])
    }

    pub fn decode(&self, data: &[u8]) -> ArrayResult<Value> {
        match data {
            [b] => Ok(Value::Bool(*b != 0)),
            _ => Err(ArrayError::Decode(format!(
                "bool expects 1 byte, got {}",
                data.len()
            ))),
        }
    }

    pub fn encode_text(&self, value: &Value) -> ArrayResult<String> {
        Ok(if Self::value(value)? { "t" } else { "f" }.to_string())
    }

    pub fn decode_text(&self, text: &str) -> ArrayResult<Value> {
        match text.trim().to_ascii_lowercase().as_str() {
            "t" | "true" | "y" | "yes" | "on" | "1" => Ok(Value::Bool(true)),
            "f" | "false" | "n" | "no" | "off" | "0" => Ok(Value::Bool(false)),
            other => Err(ArrayError::Decode(format!("invalid bool literal: {other}"))),
        }
    }
}
