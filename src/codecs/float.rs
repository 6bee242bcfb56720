use byteorder::{BigEndian, ByteOrder};

use crate::error::{ArrayError, ArrayResult};
use crate::types::{ElementType, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FloatWidth {
    Four,
    Eight,
}

/// `float4` / `float8`: big-endian IEEE 754.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FloatCodec {
    pub width: FloatWidth,
}

impl FloatCodec {
    pub fn new(width: FloatWidth) -> Self {
        Self { width }
    }

    pub fn element_type(&self) -> ElementType {
        match self.width {
            FloatWidth::Four => ElementType::Float4,
            FloatWidth::Eight => ElementType::Float8,
        }
    }

    fn coerce(&self, value: &Value) -> ArrayResult<f64> {
        match value {
            Value::Float4(v) => Ok(*v as f64),
            Value::Float8(v) => Ok(*v),
            other => Err(ArrayError::TypeMismatch {
                expected: self.element_type(),
                found: other.type_name(),
            }),
        }
    }

    /// Narrow to `float4`; a finite value that overflows is an error.
    fn narrow(v: f64) -> ArrayResult<f32> {
        let narrowed = v as f32;
        if v.is_finite() && !narrowed.is_finite() {
            return Err(ArrayError::Encode(format!("{v} is out of range for float4")));
        }
        Ok(narrowed)
    }

    pub fn encode(&self, value: &Value) -> ArrayResult<Vec<u8>> {
        let v = self.coerce(value)?;
        Ok(match self.width {
            FloatWidth::Four => {
                let mut buf = vec![0u8; 4];
                BigEndian::write_f32(&mut buf, Self::narrow(v)?);
                buf
            }
            FloatWidth::Eight => {
                let mut buf = vec![0u8; 8];
                BigEndian::write_f64(&mut buf, v);
                buf
            }
        })
    }

    pub fn decode(&self, data: &[u8]) -> ArrayResult<Value> {
        match (self.width, data.len()) {
            (FloatWidth::Four, 4) => Ok(Value::Float4(BigEndian::read_f32(data))),
            (FloatWidth::Eight, 8) => Ok(Value::Float8(BigEndian::read_f64(data))),
            (_, n) => Err(ArrayError::Decode(format!(
                "{} got {n} bytes",
                self.element_type()
            ))),
        }
    }

    pub fn encode_text(&self, value: &Value) -> ArrayResult<String> {
        let v = self.coerce(value)?;
        Ok(if v.is_nan() {
            "NaN".to_string()
        } else if v.is_infinite() {
            let s = if v > 0.0 { "Infinity" } else { "-Infinity" };
            s.to_string()
        } else {
            match self.width {
                FloatWidth::Four => Self::narrow(v)?.to_string(),
                FloatWidth::Eight => v.to_string(),
            }
        })
    }

    pub fn decode_text(&self, text: &str) -> ArrayResult<Value> {
        let text = text.trim();
        let v = match text.to_ascii_lowercase().as_str() {
            "nan" => f64::NAN,
            "infinity" | "inf" | "+infinity" => f64::INFINITY,
            "-infinity" | "-inf" => f64::NEG_INFINITY,
            _ => text.parse::<f64>().map_err(|e| {
                ArrayError::Decode(format!(
                    "invalid {} literal {text:?}: {e}",
                    self.element_type()
                ))
            })?,
        };
        Ok(match self.width {
            FloatWidth::Four => Value::Float4(v as f32),
            FloatWidth::Eight => Value::Float8(v),
        })
    }
}
