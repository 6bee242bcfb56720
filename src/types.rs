use bytes::Bytes;

// ---------------------------------------------------------------------------
// Oid
// ---------------------------------------------------------------------------

/// PostgreSQL type object identifier.
pub type Oid = u32;

pub mod oid {
    use super::Oid;

    pub const BOOL: Oid = 16;
    pub const BYTEA: Oid = 17;
    pub const INT8: Oid = 20;
    pub const INT2: Oid = 21;
    pub const INT4: Oid = 23;
    pub const TEXT: Oid = 25;
    pub const FLOAT4: Oid = 700;
    pub const FLOAT8: Oid = 701;
    pub const VARCHAR: Oid = 1043;

    pub const BOOL_ARRAY: Oid = 1000;
    pub const BYTEA_ARRAY: Oid = 1001;
    pub const INT2_ARRAY: Oid = 1005;
    pub const INT4_ARRAY: Oid = 1007;
    pub const TEXT_ARRAY: Oid = 1009;
    pub const VARCHAR_ARRAY: Oid = 1015;
    pub const INT8_ARRAY: Oid = 1016;
    pub const FLOAT4_ARRAY: Oid = 1021;
    pub const FLOAT8_ARRAY: Oid = 1022;
}

// ---------------------------------------------------------------------------
// ElementType
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementType {
    Bool,
    Int2,
    Int4,
    Int8,
    Float4,
    Float8,
    Text,
    Bytea,
    Array,
}

impl std::fmt::Display for ElementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ElementType::Bool => write!(f, "bool"),
            ElementType::Int2 => write!(f, "int2"),
            ElementType::Int4 => write!(f, "int4"),
            ElementType::Int8 => write!(f, "int8"),
            ElementType::Float4 => write!(f, "float4"),
            ElementType::Float8 => write!(f, "float8"),
            ElementType::Text => write!(f, "text"),
            ElementType::Bytea => write!(f, "bytea"),
            ElementType::Array => write!(f, "array"),
        }
    }
}

/// Whether a leaf may hold NULL, together with its scalar type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ElementKind {
    pub element_type: ElementType,
    pub nullable: bool,
}

// ---------------------------------------------------------------------------
// Value  (dynamic)
// ---------------------------------------------------------------------------

/// Schema-less value produced when the decode target is not statically known.
///
/// `Null` doubles as the absence marker for a whole array and as a NULL
/// element inside a `List`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int2(i16),
    Int4(i32),
    Int8(i64),
    Float4(f32),
    Float8(f64),
    Text(String),
    Bytea(Bytes),
    List(Vec<Value>),
}

impl Value {
    /// Return the [`ElementType`] of this value, or `None` for `Null`.
    pub fn element_type(&self) -> Option<ElementType> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some(ElementType::Bool),
            Value::Int2(_) => Some(ElementType::Int2),
            Value::Int4(_) => Some(ElementType::Int4),
            Value::Int8(_) => Some(ElementType::Int8),
            Value::Float4(_) => Some(ElementType::Float4),
            Value::Float8(_) => Some(ElementType::Float8),
            Value::Text(_) => Some(ElementType::Text),
            Value::Bytea(_) => Some(ElementType::Bytea),
            Value::List(_) => Some(ElementType::Array),
        }
    }

    /// Short name used in error messages.
    pub fn type_name(&self) -> String {
        match self.element_type() {
            Some(t) => t.to_string(),
            None => "null".to_string(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(items) => Some(items),
            _ => None,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Value::Int2(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int4(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int8(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float4(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float8(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<Bytes> for Value {
    fn from(v: Bytes) -> Self {
        Value::Bytea(v)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}
