use crate::array::ArrayReader;
use crate::codecs::TypeRegistry;
use crate::error::{ArrayError, ArrayResult};
use crate::types::{Oid, Value};

/// Element codec for array-typed elements (arrays of arrays).
///
/// Each element is itself a complete wire array whose elements use
/// `element_oid`; encoding and decoding go back through the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArrayCodec {
    pub element_oid: Oid,
}

impl ArrayCodec {
    pub fn new(element_oid: Oid) -> Self {
        Self { element_oid }
    }

    pub fn encode(&self, registry: &TypeRegistry, value: &Value) -> ArrayResult<Vec<u8>> {
        Ok(crate::any::encode_any(value, self.element_oid, registry)?.to_vec())
    }

    pub fn decode(&self, registry: &TypeRegistry, data: &[u8]) -> ArrayResult<Value> {
        self.decode_nested(registry, data, 0)
    }

    /// `nesting` is the number of enclosing array-valued elements. It may
    /// not reach `max_dimensions`.
    pub(crate) fn decode_nested(
        &self,
        registry: &TypeRegistry,
        data: &[u8],
        nesting: usize,
    ) -> ArrayResult<Value> {
        let max = registry.options().max_dimensions;
        if nesting >= max {
            return Err(ArrayError::MalformedWireData(format!(
                "array elements nested more than {max} levels deep"
            )));
        }
        let prefix = ArrayReader::new(data).read_prefix(max)?;
        if prefix.element_oid != self.element_oid {
            return Err(ArrayError::MalformedWireData(format!(
                "nested array has element oid {}, expected {}",
                prefix.element_oid, self.element_oid
            )));
        }
        crate::any::decode_any_nested(data, registry, nesting + 1)
    }

    pub fn encode_text(&self, registry: &TypeRegistry, value: &Value) -> ArrayResult<String> {
        crate::text::format_text(value, self.element_oid, registry)?
            .ok_or_else(|| ArrayError::Encode("absent array has no text form".into()))
    }

    pub fn decode_text(&self, registry: &TypeRegistry, text: &str) -> ArrayResult<Value> {
        crate::text::parse_text(text, self.element_oid, registry)
    }
}

#[cfg(test)]
mod tests {
    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::types::oid;

    fn wrap(inner: &[u8], element_oid: Oid) -> Vec<u8> {
        let mut out = BytesMut::new();
        out.put_i32(1);
        out.put_i32(0);
        out.put_u32(element_oid);
        out.put_i32(1);
        out.put_i32(1);
        out.put_i32(inner.len() as i32);
        out.put_slice(inner);
        out.to_vec()
    }

    fn absent(element_oid: Oid) -> Vec<u8> {
        let mut out = BytesMut::new();
        out.put_i32(0);
        out.put_i32(0);
        out.put_u32(element_oid);
        out.to_vec()
    }

    #[test]
    fn inner_element_oid_must_match() {
        let reg = TypeRegistry::default();
        let codec = ArrayCodec::new(oid::INT4);
        assert_eq!(codec.decode(&reg, &absent(oid::INT4)).unwrap(), Value::Null);
        let err = codec.decode(&reg, &absent(oid::TEXT)).unwrap_err();
        assert!(matches!(err, ArrayError::MalformedWireData(_)));
    }

    #[test]
    fn self_referencing_codec_stops_at_dimension_limit() {
        let mut reg = TypeRegistry::default();
        reg.register(5000, crate::codecs::ElementCodec::Array(ArrayCodec::new(5000)));
        let mut buf = absent(5000);
        for _ in 0..50 {
            buf = wrap(&buf, 5000);
        }
        let err = ArrayCodec::new(5000).decode(&reg, &buf).unwrap_err();
        assert!(matches!(err, ArrayError::MalformedWireData(_)));
    }
}
