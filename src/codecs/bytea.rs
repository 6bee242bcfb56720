use bytes::Bytes;

use crate::error::{ArrayError, ArrayResult};
use crate::types::{ElementType, Value};

/// `bytea`: raw bytes on the wire, `\x`-prefixed hex in text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ByteaCodec;

impl ByteaCodec {
    fn value(value: &Value) -> ArrayResult<&Bytes> {
        match value {
            Value::Bytea(b) => Ok(b),
            other => Err(ArrayError::TypeMismatch {
                expected: ElementType::Bytea,
                found: other.type_name(),
            }),
        }
    }

    pub fn encode(&self, value: &Value) -> ArrayResult<Vec<u8>> {
        Ok(Self::value(value)?.to_vec())
    }

    pub fn decode(&self, data: &[u8]) -> ArrayResult<Value> {
        Ok(Value::Bytea(Bytes::copy_from_slice(data)))
    }

    pub fn encode_text(&self, value: &Value) -> ArrayResult<String> {
        let data = Self::value(value)?;
        let mut out = String::with_capacity(2 + data.len() * 2);
        out.push_str("\\x");
        for b in data.iter() {
            out.push_str(&format!("{b:02x}"));
        }
        Ok(out)
    }

    pub fn decode_text(&self, text: &str) -> ArrayResult<Value> {
        let hex = text
            .strip_prefix("\\x")
            .ok_or_else(|| ArrayError::Decode(format!("bytea literal must start with \\x: {text:?}")))?;
        if !hex.is_ascii() || hex.len() % 2 != 0 {
            return Err(ArrayError::Decode(format!(
                "bytea hex literal is malformed: {text:?}"
            )));
        }
        let out = (0..hex.len())
            .step_by(2)
            .map(|i| {
                u8::from_str_radix(&hex[i..i + 2], 16)
                    .map_err(|e| ArrayError::Decode(format!("invalid bytea hex {text:?}: {e}")))
            })
            .collect::<ArrayResult<Vec<u8>>>()?;
        Ok(Value::Bytea(Bytes::from(out)))
    }
}
