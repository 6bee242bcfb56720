//! Shape inference over native nested containers.
//!
//! A container is `Vec<...Vec<L>>` where the leaf `L` is a supported scalar or
//! an `Option` of one. `Option` leaves mark the array as nullable.

use bytes::Bytes;

use crate::error::{ArrayError, ArrayResult};
use crate::types::{ElementKind, ElementType, Value};

// ---------------------------------------------------------------------------
// Shape
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    /// One entry per dimension, outermost first.
    pub lengths: Vec<usize>,
    pub kind: ElementKind,
}

impl Shape {
    /// True when some dimension has length 0, so there are no elements.
    pub fn is_empty(&self) -> bool {
        self.lengths.contains(&0)
    }

    pub fn element_count(&self) -> usize {
        self.lengths.iter().product()
    }
}

// ---------------------------------------------------------------------------
// ElementCursor
// ---------------------------------------------------------------------------

/// Row-major stream of decoded elements consumed while rebuilding containers.
pub struct ElementCursor {
    inner: std::iter::Enumerate<std::vec::IntoIter<Option<Value>>>,
}

impl ElementCursor {
    pub fn new(elements: Vec<Option<Value>>) -> Self {
        Self {
            inner: elements.into_iter().enumerate(),
        }
    }

    /// Next element together with its flat index.
    pub fn next_element(&mut self) -> ArrayResult<(usize, Option<Value>)> {
        self.inner.next().ok_or_else(|| {
            ArrayError::MalformedWireData("fewer elements than the dimensions describe".into())
        })
    }
}

// ---------------------------------------------------------------------------
// Nested
// ---------------------------------------------------------------------------

/// A value that can sit at some depth of an array: a leaf or a container of
/// further `Nested` values.
pub trait Nested: Sized {
    /// Container levels above the leaf; 0 for leaves.
    const DEPTH: usize;

    fn element_kind() -> ElementKind;

    /// Push the length of this level and of each first child below it.
    fn probe_lengths(&self, lengths: &mut Vec<usize>);

    /// Verify this value (found at `depth`) and everything below it against
    /// the probed lengths.
    fn check_lengths(&self, depth: usize, lengths: &[usize]) -> ArrayResult<()>;

    /// Append leaves in row-major order; `None` is a NULL element.
    fn flatten_into(&self, out: &mut Vec<Option<Value>>);

    /// Rebuild a value whose remaining dimensions are `lengths`.
    fn rebuild(lengths: &[usize], cursor: &mut ElementCursor) -> ArrayResult<Self>;
}

impl<T: Nested> Nested for Vec<T> {
    const DEPTH: usize = T::DEPTH + 1;

    fn element_kind() -> ElementKind {
        T::element_kind()
    }

    fn probe_lengths(&self, lengths: &mut Vec<usize>) {
        lengths.push(self.len());
        if let Some(first) = self.first() {
            first.probe_lengths(lengths);
        }
    }

    fn check_lengths(&self, depth: usize, lengths: &[usize]) -> ArrayResult<()> {
        let expected = lengths.get(depth).copied().unwrap_or(0);
        if self.len() != expected {
            return Err(ArrayError::RaggedShape {
                depth,
                expected,
                actual: self.len(),
            });
        }
        self.iter()
            .try_for_each(|child| child.check_lengths(depth + 1, lengths))
    }

    fn flatten_into(&self, out: &mut Vec<Option<Value>>) {
        for child in self {
            child.flatten_into(out);
        }
    }

    fn rebuild(lengths: &[usize], cursor: &mut ElementCursor) -> ArrayResult<Self> {
        let (len, rest) = lengths.split_first().ok_or_else(|| {
            ArrayError::MalformedWireData("container nested deeper than the array".into())
        })?;
        (0..*len).map(|_| T::rebuild(rest, cursor)).collect()
    }
}

// ---------------------------------------------------------------------------
// Scalar leaves
// ---------------------------------------------------------------------------

/// Conversion between a leaf type and the dynamic [`Value`] element codecs
/// speak.
pub(crate) trait Scalar: Sized {
    const ELEMENT_TYPE: ElementType;

    fn to_value(&self) -> Value;

    /// Give the value back on mismatch so the error can name it.
    fn from_value(value: Value) -> Result<Self, Value>;
}

impl Scalar for bool {
    const ELEMENT_TYPE: ElementType = ElementType::Bool;

    fn to_value(&self) -> Value {
        Value::Bool(*self)
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Bool(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl Scalar for i16 {
    const ELEMENT_TYPE: ElementType = ElementType::Int2;

    fn to_value(&self) -> Value {
        Value::Int2(*self)
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Int2(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl Scalar for i32 {
    const ELEMENT_TYPE: ElementType = ElementType::Int4;

    fn to_value(&self) -> Value {
        Value::Int4(*self)
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Int4(v) => Ok(v),
            Value::Int2(v) => Ok(v as i32),
            other => Err(other),
        }
    }
}

impl Scalar for i64 {
    const ELEMENT_TYPE: ElementType = ElementType::Int8;

    fn to_value(&self) -> Value {
        Value::Int8(*self)
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Int8(v) => Ok(v),
            Value::Int4(v) => Ok(v as i64),
            Value::Int2(v) => Ok(v as i64),
            other => Err(other),
        }
    }
}

impl Scalar for f32 {
    const ELEMENT_TYPE: ElementType = ElementType::Float4;

    fn to_value(&self) -> Value {
        Value::Float4(*self)
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Float4(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl Scalar for f64 {
    const ELEMENT_TYPE: ElementType = ElementType::Float8;

    fn to_value(&self) -> Value {
        Value::Float8(*self)
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Float8(v) => Ok(v),
            Value::Float4(v) => Ok(v as f64),
            other => Err(other),
        }
    }
}

impl Scalar for String {
    const ELEMENT_TYPE: ElementType = ElementType::Text;

    fn to_value(&self) -> Value {
        Value::Text(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Text(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl Scalar for Bytes {
    const ELEMENT_TYPE: ElementType = ElementType::Bytea;

    fn to_value(&self) -> Value {
        Value::Bytea(self.clone())
    }

    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Bytea(v) => Ok(v),
            other => Err(other),
        }
    }
}

fn convert<T: Scalar>(value: Value) -> ArrayResult<T> {
    T::from_value(value).map_err(|found| ArrayError::TypeMismatch {
        expected: T::ELEMENT_TYPE,
        found: found.type_name(),
    })
}

macro_rules! impl_leaf {
    ($($ty:ty),* $(,)?) => {$(
        impl Nested for $ty {
            const DEPTH: usize = 0;

            fn element_kind() -> ElementKind {
                ElementKind {
                    element_type: <$ty as Scalar>::ELEMENT_TYPE,
                    nullable: false,
                }
            }

            fn probe_lengths(&self, _lengths: &mut Vec<usize>) {}

            fn check_lengths(&self, _depth: usize, _lengths: &[usize]) -> ArrayResult<()> {
                Ok(())
            }

            fn flatten_into(&self, out: &mut Vec<Option<Value>>) {
                out.push(Some(self.to_value()));
            }

            fn rebuild(_lengths: &[usize], cursor: &mut ElementCursor) -> ArrayResult<Self> {
                match cursor.next_element()? {
                    (_, Some(value)) => convert(value),
                    (index, None) => Err(ArrayError::NullNotAllowed { index }),
                }
            }
        }

        impl Nested for Option<$ty> {
            const DEPTH: usize = 0;

            fn element_kind() -> ElementKind {
                ElementKind {
                    element_type: <$ty as Scalar>::ELEMENT_TYPE,
                    nullable: true,
                }
            }

            fn probe_lengths(&self, _lengths: &mut Vec<usize>) {}

            fn check_lengths(&self, _depth: usize, _lengths: &[usize]) -> ArrayResult<()> {
                Ok(())
            }

            fn flatten_into(&self, out: &mut Vec<Option<Value>>) {
                out.push(self.as_ref().map(Scalar::to_value));
            }

            fn rebuild(_lengths: &[usize], cursor: &mut ElementCursor) -> ArrayResult<Self> {
                let (_, element) = cursor.next_element()?;
                element.map(convert).transpose()
            }
        }
    )*};
}

impl_leaf!(bool, i16, i32, i64, f32, f64, String, Bytes);

// ---------------------------------------------------------------------------
// Inference
// ---------------------------------------------------------------------------

/// Determine the dimensions of `items` and verify it is rectangular.
///
/// The number of dimensions always equals the static depth of `Vec<T>`; depths
/// below an empty container are reported as length 0.
pub fn infer_shape<T: Nested>(items: &[T], max_dimensions: usize) -> ArrayResult<Shape> {
    let ndims = T::DEPTH + 1;
    if ndims > max_dimensions {
        return Err(ArrayError::TooManyDimensions {
            ndims,
            max: max_dimensions,
        });
    }

    let mut lengths = vec![items.len()];
    if let Some(first) = items.first() {
        first.probe_lengths(&mut lengths);
    }
    lengths.resize(ndims, 0);

    for item in items {
        if let Err(e) = item.check_lengths(1, &lengths) {
            tracing::debug!(error = %e, ?lengths, "rejecting ragged array");
            return Err(e);
        }
    }

    Ok(Shape {
        lengths,
        kind: T::element_kind(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MAX_DIMENSIONS;

    #[test]
    fn rectangular_two_dimensions() {
        let v = vec![vec![1i32, 2, 3, 4], vec![5, 6, 7, 8], vec![9, 10, 11, 12]];
        let shape = infer_shape(&v, DEFAULT_MAX_DIMENSIONS).unwrap();
        assert_eq!(shape.lengths, vec![3, 4]);
        assert_eq!(shape.element_count(), 12);
        assert_eq!(
            shape.kind,
            ElementKind {
                element_type: ElementType::Int4,
                nullable: false
            }
        );
    }

    #[test]
    fn ragged_inner_length() {
        let v = vec![vec![1i32, 2, 3, 4], vec![5], vec![9, 10, 11, 12]];
        let err = infer_shape(&v, DEFAULT_MAX_DIMENSIONS).unwrap_err();
        assert!(matches!(
            err,
            ArrayError::RaggedShape {
                depth: 1,
                expected: 4,
                actual: 1
            }
        ));
    }

    #[test]
    fn ragged_below_an_empty_first_child() {
        let v: Vec<Vec<i16>> = vec![vec![], vec![1]];
        assert!(matches!(
            infer_shape(&v, DEFAULT_MAX_DIMENSIONS),
            Err(ArrayError::RaggedShape {
                depth: 1,
                expected: 0,
                actual: 1
            })
        ));
    }

    #[test]
    fn ragged_third_level() {
        let v = vec![vec![vec![1i64, 2], vec![3, 4]], vec![vec![5, 6], vec![7]]];
        assert!(matches!(
            infer_shape(&v, DEFAULT_MAX_DIMENSIONS),
            Err(ArrayError::RaggedShape { depth: 2, .. })
        ));
    }

    #[test]
    fn empty_outer_keeps_static_depth() {
        let v: Vec<Vec<i32>> = vec![];
        let shape = infer_shape(&v, DEFAULT_MAX_DIMENSIONS).unwrap();
        assert_eq!(shape.lengths, vec![0, 0]);
        assert!(shape.is_empty());

        let v: Vec<i16> = vec![];
        assert_eq!(infer_shape(&v, DEFAULT_MAX_DIMENSIONS).unwrap().lengths, vec![0]);
    }

    #[test]
    fn empty_inner_containers() {
        let v: Vec<Vec<String>> = vec![vec![], vec![]];
        let shape = infer_shape(&v, DEFAULT_MAX_DIMENSIONS).unwrap();
        assert_eq!(shape.lengths, vec![2, 0]);
        assert_eq!(shape.element_count(), 0);
    }

    #[test]
    fn optional_leaves_are_nullable() {
        let v = vec![Some(1i16), None];
        let shape = infer_shape(&v, DEFAULT_MAX_DIMENSIONS).unwrap();
        assert!(shape.kind.nullable);
        let mut flat = Vec::new();
        v.flatten_into(&mut flat);
        assert_eq!(flat, vec![Some(Value::Int2(1)), None]);
    }

    #[test]
    fn dimension_limit() {
        let v: Vec<Vec<Vec<i32>>> = vec![vec![vec![1]]];
        assert!(matches!(
            infer_shape(&v, 2),
            Err(ArrayError::TooManyDimensions { ndims: 3, max: 2 })
        ));
    }

    #[test]
    fn rebuild_reports_null_index() {
        let mut cursor = ElementCursor::new(vec![Some(Value::Int4(1)), None]);
        let err = Vec::<i32>::rebuild(&[2], &mut cursor).unwrap_err();
        assert!(matches!(err, ArrayError::NullNotAllowed { index: 1 }));
    }

    #[test]
    fn rebuild_widens_integers() {
        let mut cursor = ElementCursor::new(vec![Some(Value::Int2(7)), Some(Value::Int4(8))]);
        let v = Vec::<i64>::rebuild(&[2], &mut cursor).unwrap();
        assert_eq!(v, vec![7, 8]);
    }

    #[test]
    fn rebuild_type_mismatch() {
        let mut cursor = ElementCursor::new(vec![Some(Value::Text("x".into()))]);
        let err = Vec::<Option<bool>>::rebuild(&[1], &mut cursor).unwrap_err();
        assert!(matches!(
            err,
            ArrayError::TypeMismatch {
                expected: ElementType::Bool,
                ..
            }
        ));
    }
}
