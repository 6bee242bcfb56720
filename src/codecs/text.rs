use crate::error::{ArrayError, ArrayResult};
use crate::types::{ElementType, Value};

/// `text` / `varchar`: UTF-8 bytes, identical in binary and text form.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextCodec;

impl TextCodec {
    fn value(value: &Value) -> ArrayResult<&str> {
        match value {
            Value::Text(s) => Ok(s),
            other => Err(ArrayError::TypeMismatch {
                expected: ElementType::Text,
                found: other.type_name(),
            }),
        }
    }

    pub fn encode(&self, value: &Value) -> ArrayResult<Vec<u8>> {
        Ok(Self::value(value)?.as_bytes().to_vec())
    }

    pub fn decode(&self, data: &[u8]) -> ArrayResult<Value> {
        let s = std::str::from_utf8(data)
            .map_err(|e| ArrayError::Decode(format!("text is not valid UTF-8: {e}")))?;
        Ok(Value::Text(s.to_string()))
    }

    pub fn encode_text(&self, value: &Value) -> ArrayResult<String> {
        Ok(Self::value(value)?.to_string())
    }

    pub fn decode_text(&self, text: &str) -> ArrayResult<Value> {
        Ok(Value::Text(text.to_string()))
    }
}
