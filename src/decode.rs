//! Binary array format to native containers.

use crate::array::{ArrayHeader, ArrayReader};
use crate::codecs::TypeRegistry;
use crate::error::{ArrayError, ArrayResult};
use crate::shape::{ElementCursor, Nested};
use crate::types::Value;

/// Header plus decoded elements in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedArray {
    pub header: ArrayHeader,
    pub elements: Vec<Option<Value>>,
}

/// Parse `buf` and decode every element.
///
/// `depth` is the nesting depth of the caller's target, or 0 to accept any.
/// A depth mismatch is reported before dimensions or elements are read.
/// Returns `None` for an absent array.
pub fn decode_elements(
    buf: &[u8],
    depth: usize,
    registry: &TypeRegistry,
) -> ArrayResult<Option<DecodedArray>> {
    decode_elements_nested(buf, depth, registry, 0)
}

/// [`decode_elements`] for an array that is itself an element, `nesting`
/// levels down.
pub(crate) fn decode_elements_nested(
    buf: &[u8],
    depth: usize,
    registry: &TypeRegistry,
    nesting: usize,
) -> ArrayResult<Option<DecodedArray>> {
    let mut reader = ArrayReader::new(buf);
    let prefix = reader.read_prefix(registry.options().max_dimensions)?;
    tracing::trace!(
        ndims = prefix.ndims,
        element_oid = prefix.element_oid,
        depth,
        nesting,
        "decoding array"
    );

    if prefix.ndims == 0 {
        reader.finish()?;
        return Ok(None);
    }
    if depth > 0 && depth != prefix.ndims {
        tracing::debug!(ndims = prefix.ndims, depth, "array depth does not match target");
        return Err(ArrayError::DimensionMismatch {
            expected: prefix.ndims,
            actual: depth,
        });
    }

    let dimensions = reader.read_dimensions(prefix.ndims)?;
    let header = ArrayHeader {
        flags: prefix.flags,
        element_oid: prefix.element_oid,
        dimensions,
    };

    let count = header.element_count()?;
    if count == 0 {
        reader.finish()?;
        return Ok(Some(DecodedArray {
            header,
            elements: Vec::new(),
        }));
    }

    let codec = registry.lookup(header.element_oid)?;
    reader.ensure_capacity(count)?;
    let mut elements = Vec::with_capacity(count);
    for _ in 0..count {
        let element = match reader.read_element()? {
            None => None,
            Some(payload) => Some(codec.decode_nested(registry, payload, nesting)?),
        };
        elements.push(element);
    }
    reader.finish()?;

    Ok(Some(DecodedArray { header, elements }))
}

/// Decode into a native nested container whose depth must match the array.
///
/// Returns `None` for an absent array and an empty outer `Vec` when any
/// dimension has length 0.
pub fn decode_array<T: Nested>(
    buf: &[u8],
    registry: &TypeRegistry,
) -> ArrayResult<Option<Vec<T>>> {
    let depth = T::DEPTH + 1;
    let Some(decoded) = decode_elements(buf, depth, registry)? else {
        return Ok(None);
    };
    rebuild(&decoded.header.lengths(), decoded.elements).map(Some)
}

/// Reassemble row-major `elements` into a container with `lengths`.
pub(crate) fn rebuild<T: Nested>(
    lengths: &[usize],
    elements: Vec<Option<Value>>,
) -> ArrayResult<Vec<T>> {
    if lengths.contains(&0) {
        return Ok(Vec::new());
    }
    let mut cursor = ElementCursor::new(elements);
    Vec::<T>::rebuild(lengths, &mut cursor)
}

#[cfg(test)]
mod tests {
    use bytes::{BufMut, BytesMut};

    use super::*;
    use crate::encode::encode_array;
    use crate::types::oid;

    fn int4_2d() -> Vec<u8> {
        let mut out = BytesMut::new();
        out.put_i32(2);
        out.put_i32(0);
        out.put_u32(oid::INT4);
        out.put_i32(3);
        out.put_i32(1);
        out.put_i32(4);
        out.put_i32(1);
        for v in 1..=12 {
            out.put_i32(4);
            out.put_i32(v);
        }
        out.to_vec()
    }

    #[test]
    fn two_dimensions() {
        let reg = TypeRegistry::default();
        let v: Vec<Vec<i32>> = decode_array(&int4_2d(), &reg).unwrap().unwrap();
        assert_eq!(
            v,
            vec![vec![1, 2, 3, 4], vec![5, 6, 7, 8], vec![9, 10, 11, 12]]
        );
    }

    #[test]
    fn too_deep_target() {
        let reg = TypeRegistry::default();
        let err = decode_array::<Vec<Vec<i32>>>(&int4_2d(), &reg).unwrap_err();
        assert!(matches!(
            err,
            ArrayError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));
    }

    #[test]
    fn mismatch_reported_before_elements_are_read() {
        let reg = TypeRegistry::default();
        let mut buf = int4_2d();
        buf.truncate(20);
        let err = decode_array::<i32>(&buf, &reg).unwrap_err();
        assert!(matches!(
            err,
            ArrayError::DimensionMismatch {
                expected: 2,
                actual: 1
            }
        ));
    }

    #[test]
    fn mismatch_on_empty_array() {
        let reg = TypeRegistry::default();
        let empty: Vec<i32> = vec![];
        let buf = encode_array(Some(&empty[..]), oid::INT4, &reg).unwrap();
        assert!(matches!(
            decode_array::<Vec<i32>>(&buf, &reg),
            Err(ArrayError::DimensionMismatch {
                expected: 1,
                actual: 2
            })
        ));
    }

    #[test]
    fn absent_and_empty_differ() {
        let reg = TypeRegistry::default();
        let absent = encode_array::<i16>(None, oid::INT2, &reg).unwrap();
        assert_eq!(decode_array::<i16>(&absent, &reg).unwrap(), None);

        let empty: Vec<i16> = vec![];
        let buf = encode_array(Some(&empty[..]), oid::INT2, &reg).unwrap();
        assert_eq!(decode_array::<i16>(&buf, &reg).unwrap(), Some(vec![]));
    }

    #[test]
    fn zero_inner_length_gives_empty_outer() {
        let reg = TypeRegistry::default();
        let v: Vec<Vec<i32>> = vec![vec![], vec![]];
        let buf = encode_array(Some(&v[..]), oid::INT4, &reg).unwrap();
        let back: Vec<Vec<i32>> = decode_array(&buf, &reg).unwrap().unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn null_into_plain_leaf() {
        let reg = TypeRegistry::default();
        let v = vec![Some(1i16), None, Some(3)];
        let buf = encode_array(Some(&v[..]), oid::INT2, &reg).unwrap();
        assert!(matches!(
            decode_array::<i16>(&buf, &reg),
            Err(ArrayError::NullNotAllowed { index: 1 })
        ));
        assert_eq!(decode_array::<Option<i16>>(&buf, &reg).unwrap(), Some(v));
    }

    #[test]
    fn unsupported_wire_element_type() {
        let mut buf = int4_2d();
        buf[8..12].copy_from_slice(&4242u32.to_be_bytes());
        let err = decode_array::<Vec<i32>>(&buf, &TypeRegistry::default()).unwrap_err();
        assert!(matches!(err, ArrayError::UnsupportedElementType(4242)));
    }

    #[test]
    fn decoded_array_keeps_header() {
        let reg = TypeRegistry::default();
        let decoded = decode_elements(&int4_2d(), 0, &reg).unwrap().unwrap();
        assert_eq!(decoded.header.lengths(), vec![3, 4]);
        assert_eq!(decoded.elements.len(), 12);
        assert_eq!(decoded.elements[11], Some(Value::Int4(12)));
    }
}
