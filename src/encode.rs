//! Native containers to the binary array format.

use bytes::{Bytes, BytesMut};

use crate::array::{put_element, ArrayHeader, Dimension};
use crate::codecs::TypeRegistry;
use crate::error::{ArrayError, ArrayResult};
use crate::shape::{infer_shape, Nested};
use crate::types::{Oid, Value};

/// Encode a native nested container.
///
/// `None` produces the absent-array form. Shape and element errors are
/// reported before anything is returned.
pub fn encode_array<T: Nested>(
    value: Option<&[T]>,
    element_oid: Oid,
    registry: &TypeRegistry,
) -> ArrayResult<Bytes> {
    let Some(items) = value else {
        return Ok(encode_absent(element_oid));
    };

    let shape = infer_shape(items, registry.options().max_dimensions)?;
    let mut elements = Vec::with_capacity(shape.element_count());
    for item in items {
        item.flatten_into(&mut elements);
    }
    write_elements(&shape.lengths, &elements, element_oid, registry)
}

pub(crate) fn encode_absent(element_oid: Oid) -> Bytes {
    let mut out = BytesMut::with_capacity(12);
    ArrayHeader::absent(element_oid).write(&mut out);
    out.freeze()
}

/// Emit the header for `lengths` followed by the flat `elements`.
pub(crate) fn write_elements(
    lengths: &[usize],
    elements: &[Option<Value>],
    element_oid: Oid,
    registry: &TypeRegistry,
) -> ArrayResult<Bytes> {
    let lower_bound = registry.options().default_lower_bound;
    let dimensions = lengths
        .iter()
        .map(|&len| {
            let len = i32::try_from(len).map_err(|_| {
                ArrayError::Encode(format!("dimension length {len} exceeds wire limit"))
            })?;
            Ok(Dimension { len, lower_bound })
        })
        .collect::<ArrayResult<Vec<_>>>()?;
    let header = ArrayHeader {
        flags: 0,
        element_oid,
        dimensions,
    };
    tracing::trace!(element_oid, ?lengths, count = elements.len(), "encoding array");

    let codec = registry.lookup(element_oid)?;
    let mut out = BytesMut::new();
    header.write(&mut out);
    for element in elements {
        match element {
            None => put_element(&mut out, None)?,
            Some(v) => {
                let payload = codec.encode(registry, v)?;
                put_element(&mut out, Some(&payload))?;
            }
        }
    }
    Ok(out.freeze())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::oid;

    #[test]
    fn absent_is_header_only() {
        let reg = TypeRegistry::default();
        let bytes = encode_array::<i16>(None, oid::INT2, &reg).unwrap();
        assert_eq!(
            bytes.as_ref(),
            &[0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 21][..]
        );
    }

    #[test]
    fn empty_has_one_zero_length_dimension() {
        let reg = TypeRegistry::default();
        let v: Vec<i16> = vec![];
        let bytes = encode_array(Some(&v[..]), oid::INT2, &reg).unwrap();
        assert_eq!(
            bytes.as_ref(),
            &[0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 21, 0, 0, 0, 0, 0, 0, 0, 1][..]
        );
    }

    #[test]
    fn wire_layout_with_null() {
        let reg = TypeRegistry::default();
        let v = vec![Some(5i16), None];
        let bytes = encode_array(Some(&v[..]), oid::INT2, &reg).unwrap();
        let expected: Vec<u8> = [
            &[0, 0, 0, 1][..],
            &[0, 0, 0, 0],
            &[0, 0, 0, 21],
            &[0, 0, 0, 2, 0, 0, 0, 1],
            &[0, 0, 0, 2, 0, 5],
            &[0xff, 0xff, 0xff, 0xff],
        ]
        .concat();
        assert_eq!(bytes.as_ref(), &expected[..]);
    }

    #[test]
    fn ragged_produces_no_bytes() {
        let reg = TypeRegistry::default();
        let v = vec![vec![1i32, 2, 3, 4], vec![5], vec![9, 10, 11, 12]];
        let res = encode_array(Some(&v[..]), oid::INT4, &reg);
        assert!(matches!(res, Err(ArrayError::RaggedShape { .. })));
    }

    #[test]
    fn element_failure_aborts() {
        let reg = TypeRegistry::default();
        let v = vec![1i32, 70_000];
        let res = encode_array(Some(&v[..]), oid::INT2, &reg);
        assert!(matches!(res, Err(ArrayError::Encode(_))));
    }

    #[test]
    fn unknown_element_type() {
        let reg = TypeRegistry::default();
        let v = vec![1i32];
        assert!(matches!(
            encode_array(Some(&v[..]), 9999, &reg),
            Err(ArrayError::UnsupportedElementType(9999))
        ));
    }

    #[test]
    fn custom_lower_bound() {
        let reg = TypeRegistry::with_options(crate::config::CodecOptions {
            default_lower_bound: 0,
            ..Default::default()
        });
        let v = vec![true];
        let bytes = encode_array(Some(&v[..]), oid::BOOL, &reg).unwrap();
        assert_eq!(&bytes[16..20], &[0, 0, 0, 0]);
    }
}
