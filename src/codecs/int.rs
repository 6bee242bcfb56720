use byteorder::{BigEndian, ByteOrder};

use crate::error::{ArrayError, ArrayResult};
use crate::types::{ElementType, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IntWidth {
    Two,
    Four,
    Eight,
}

impl IntWidth {
    pub fn byte_size(&self) -> usize {
        match self {
            IntWidth::Two => 2,
            IntWidth::Four => 4,
            IntWidth::Eight => 8,
        }
    }
}

/// `int2` / `int4` / `int8`: big-endian two's complement.
///
/// Encoding accepts any integer [`Value`] that fits the column width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntCodec {
    pub width: IntWidth,
}

impl IntCodec {
    pub fn new(width: IntWidth) -> Self {
        Self { width }
    }

    pub fn element_type(&self) -> ElementType {
        match self.width {
            IntWidth::Two => ElementType::Int2,
            IntWidth::Four => ElementType::Int4,
            IntWidth::Eight => ElementType::Int8,
        }
    }

    /// Narrow or widen `value` to this codec's width.
    fn coerce(&self, value: &Value) -> ArrayResult<Value> {
        let wide = match value {
            Value::Int2(v) => *v as i64,
            Value::Int4(v) => *v as i64,
            Value::Int8(v) => *v,
            other => {
                return Err(ArrayError::TypeMismatch {
                    expected: self.element_type(),
                    found: other.type_name(),
                });
            }
        };
        let out_of_range =
            |_| ArrayError::Encode(format!("{wide} is out of range for {}", self.element_type()));
        Ok(match self.width {
            IntWidth::Two => Value::Int2(i16::try_from(wide).map_err(out_of_range)?),
            IntWidth::Four => Value::Int4(i32::try_from(wide).map_err(out_of_range)?),
            IntWidth::Eight => Value::Int8(wide),
        })
    }

    pub fn encode(&self, value: &Value) -> ArrayResult<Vec<u8>> {
        let mut buf = vec![0u8; self.width.byte_size()];
        match self.coerce(value)? {
            Value::Int2(v) => BigEndian::write_i16(&mut buf, v),
            Value::Int4(v) => BigEndian::write_i32(&mut buf, v),
            Value::Int8(v) => BigEndian::write_i64(&mut buf, v),
            _ => unreachable!("coerce only yields integers"),
        }
        Ok(buf)
    }

    pub fn decode(&self, data: &[u8]) -> ArrayResult<Value> {
        if data.len() != self.width.byte_size() {
            return Err(ArrayError::Decode(format!(
                "{} expects {} bytes, got {}",
                self.element_type(),
                self.width.byte_size(),
                data.len()
            )));
        }
        Ok(match self.width {
            IntWidth::Two => Value::Int2(BigEndian::read_i16(data)),
            IntWidth::Four => Value::Int4(BigEndian::read_i32(data)),
            IntWidth::Eight => Value::Int8(BigEndian::read_i64(data)),
        })
    }

    pub fn encode_text(&self, value: &Value) -> ArrayResult<String> {
        Ok(match self.coerce(value)? {
            Value::Int2(v) => v.to_string(),
            Value::Int4(v) => v.to_string(),
            Value::Int8(v) => v.to_string(),
            _ => unreachable!("coerce only yields integers"),
        })
    }

    pub fn decode_text(&self, text: &str) -> ArrayResult<Value> {
        let text = text.trim();
        let invalid = |e: std::num::ParseIntError| {
            ArrayError::Decode(format!("invalid {} literal {text:?}: {e}", self.element_type()))
        };
        Ok(match self.width {
            IntWidth::Two => Value::Int2(text.parse().map_err(invalid)?),
            IntWidth::Four => Value::Int4(text.parse().map_err(invalid)?),
            IntWidth::Eight => Value::Int8(text.parse().map_err(invalid)?),
        })
    }
}
