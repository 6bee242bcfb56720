//! Schema-less arrays: decoding into and encoding from dynamic [`Value`]s.
//!
//! Containers above the element depth are always `Value::List`; NULL
//! elements and the absent array are both `Value::Null`.

use bytes::Bytes;

use crate::codecs::{ElementCodec, TypeRegistry};
use crate::decode::{decode_elements_nested, rebuild};
use crate::encode::{encode_absent, write_elements};
use crate::error::{ArrayError, ArrayResult};
use crate::shape::Nested;
use crate::types::{ElementType, Oid, Value};

/// Decode into a dynamic value, accepting any number of dimensions.
pub fn decode_any(buf: &[u8], registry: &TypeRegistry) -> ArrayResult<Value> {
    decode_any_nested(buf, registry, 0)
}

pub(crate) fn decode_any_nested(
    buf: &[u8],
    registry: &TypeRegistry,
    nesting: usize,
) -> ArrayResult<Value> {
    match decode_elements_nested(buf, 0, registry, nesting)? {
        None => Ok(Value::Null),
        Some(decoded) => build_value(&decoded.header.lengths(), decoded.elements),
    }
}

/// Nest row-major `elements` into lists of `lengths`.
pub fn build_value(lengths: &[usize], elements: Vec<Option<Value>>) -> ArrayResult<Value> {
    if lengths.contains(&0) {
        return Ok(Value::List(Vec::new()));
    }
    let mut iter = elements.into_iter();
    build_level(lengths, &mut iter)
}

fn build_level(
    lengths: &[usize],
    iter: &mut std::vec::IntoIter<Option<Value>>,
) -> ArrayResult<Value> {
    match lengths.split_first() {
        None => {
            let element = iter.next().ok_or_else(|| {
                ArrayError::MalformedWireData("fewer elements than the dimensions describe".into())
            })?;
            Ok(element.unwrap_or(Value::Null))
        }
        Some((len, rest)) => (0..*len)
            .map(|_| build_level(rest, iter))
            .collect::<ArrayResult<Vec<_>>>()
            .map(Value::List),
    }
}

/// Encode a dynamic value. `Value::Null` is the absent array.
pub fn encode_any(value: &Value, element_oid: Oid, registry: &TypeRegistry) -> ArrayResult<Bytes> {
    let items = match value {
        Value::Null => return Ok(encode_absent(element_oid)),
        Value::List(items) => items,
        other => {
            return Err(ArrayError::TypeMismatch {
                expected: ElementType::Array,
                found: other.type_name(),
            });
        }
    };
    let codec = registry.lookup(element_oid)?;
    let (lengths, elements) = flatten_list(items, codec, registry)?;
    write_elements(&lengths, &elements, element_oid, registry)
}

/// Shape and row-major elements of a dynamic list.
///
/// When the element codec is itself an array codec the list is
/// one-dimensional and each item is a whole array.
pub(crate) fn flatten_list(
    items: &[Value],
    codec: &ElementCodec,
    registry: &TypeRegistry,
) -> ArrayResult<(Vec<usize>, Vec<Option<Value>>)> {
    let lengths = if matches!(codec, ElementCodec::Array(_)) {
        vec![items.len()]
    } else {
        infer_value_shape(items, registry.options().max_dimensions)?
    };
    let mut elements = Vec::with_capacity(lengths.iter().product());
    if lengths.len() == 1 {
        elements.extend(items.iter().map(element_of));
    } else {
        flatten_value(items, &mut elements);
    }
    Ok((lengths, elements))
}

fn element_of(value: &Value) -> Option<Value> {
    (!value.is_null()).then(|| value.clone())
}

fn flatten_value(items: &[Value], out: &mut Vec<Option<Value>>) {
    for item in items {
        match item {
            Value::List(children) => flatten_value(children, out),
            leaf => out.push(element_of(leaf)),
        }
    }
}

/// Dimension lengths of a dynamic list, following first children, with every
/// sibling verified.
pub fn infer_value_shape(items: &[Value], max_dimensions: usize) -> ArrayResult<Vec<usize>> {
    let mut lengths = vec![items.len()];
    let mut level = items;
    while let Some(Value::List(child)) = level.first() {
        lengths.push(child.len());
        level = child.as_slice();
    }
    if lengths.len() > max_dimensions {
        return Err(ArrayError::TooManyDimensions {
            ndims: lengths.len(),
            max: max_dimensions,
        });
    }
    if let Err(e) = check_level(items, 0, &lengths) {
        tracing::debug!(error = %e, ?lengths, "rejecting ragged array value");
        return Err(e);
    }
    Ok(lengths)
}

fn check_level(items: &[Value], depth: usize, lengths: &[usize]) -> ArrayResult<()> {
    let child_depth = depth + 1;
    let leaf_level = child_depth == lengths.len();
    for item in items {
        match (item, leaf_level) {
            (Value::List(children), false) => {
                if children.len() != lengths[child_depth] {
                    return Err(ArrayError::RaggedShape {
                        depth: child_depth,
                        expected: lengths[child_depth],
                        actual: children.len(),
                    });
                }
                check_level(children, child_depth, lengths)?;
            }
            (Value::List(children), true) => {
                return Err(ArrayError::RaggedShape {
                    depth: child_depth,
                    expected: 0,
                    actual: children.len(),
                });
            }
            (_, false) => {
                return Err(ArrayError::RaggedShape {
                    depth: child_depth,
                    expected: lengths[child_depth],
                    actual: 0,
                });
            }
            (_, true) => {}
        }
    }
    Ok(())
}

/// Convert a dynamic value into a native container of depth `T::DEPTH + 1`.
///
/// An empty list fits any target depth, since a dynamic empty list carries no
/// dimensionality of its own.
pub fn value_into_array<T: Nested>(
    value: &Value,
    registry: &TypeRegistry,
) -> ArrayResult<Option<Vec<T>>> {
    let items = match value {
        Value::Null => return Ok(None),
        Value::List(items) => items,
        other => {
            return Err(ArrayError::TypeMismatch {
                expected: ElementType::Array,
                found: other.type_name(),
            });
        }
    };
    let lengths = infer_value_shape(items, registry.options().max_dimensions)?;
    let depth = T::DEPTH + 1;
    if lengths.contains(&0) && lengths.len() <= depth {
        return Ok(Some(Vec::new()));
    }
    if lengths.len() != depth {
        return Err(ArrayError::DimensionMismatch {
            expected: lengths.len(),
            actual: depth,
        });
    }
    let mut elements = Vec::with_capacity(lengths.iter().product());
    flatten_value(items, &mut elements);
    rebuild(&lengths, elements).map(Some)
}
