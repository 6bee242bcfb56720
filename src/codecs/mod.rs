pub mod array;
pub mod boolean;
pub mod bytea;
pub mod float;
pub mod int;
pub mod text;

use std::collections::HashMap;

use crate::config::CodecOptions;
use crate::error::{ArrayError, ArrayResult};
use crate::types::{oid, ElementType, Oid, Value};

use self::float::FloatWidth;
use self::int::IntWidth;

// ---------------------------------------------------------------------------
// ElementCodec  (enum dispatch, no Box<dyn>)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ElementCodec {
    Bool(boolean::BoolCodec),
    Int(int::IntCodec),
    Float(float::FloatCodec),
    Text(text::TextCodec),
    Bytea(bytea::ByteaCodec),
    Array(array::ArrayCodec),
}

impl ElementCodec {
    pub fn element_type(&self) -> ElementType {
        match self {
            ElementCodec::Bool(_) => ElementType::Bool,
            ElementCodec::Int(c) => c.element_type(),
            ElementCodec::Float(c) => c.element_type(),
            ElementCodec::Text(_) => ElementType::Text,
            ElementCodec::Bytea(_) => ElementType::Bytea,
            ElementCodec::Array(_) => ElementType::Array,
        }
    }

    /// Encode a single non-NULL element to its binary payload.
    pub fn encode(&self, registry: &TypeRegistry, value: &Value) -> ArrayResult<Vec<u8>> {
        match self {
            ElementCodec::Bool(c) => c.encode(value),
            ElementCodec::Int(c) => c.encode(value),
            ElementCodec::Float(c) => c.encode(value),
            ElementCodec::Text(c) => c.encode(value),
            ElementCodec::Bytea(c) => c.encode(value),
            ElementCodec::Array(c) => c.encode(registry, value),
        }
    }

    /// Decode a single non-NULL binary payload.
    pub fn decode(&self, registry: &TypeRegistry, data: &[u8]) -> ArrayResult<Value> {
        self.decode_nested(registry, data, 0)
    }

    /// Like [`decode`](Self::decode) for an element found inside `nesting`
    /// array-valued elements.
    pub(crate) fn decode_nested(
        &self,
        registry: &TypeRegistry,
        data: &[u8],
        nesting: usize,
    ) -> ArrayResult<Value> {
        match self {
            ElementCodec::Bool(c) => c.decode(data),
            ElementCodec::Int(c) => c.decode(data),
            ElementCodec::Float(c) => c.decode(data),
            ElementCodec::Text(c) => c.decode(data),
            ElementCodec::Bytea(c) => c.decode(data),
            ElementCodec::Array(c) => c.decode_nested(registry, data, nesting),
        }
    }

    pub fn encode_text(&self, registry: &TypeRegistry, value: &Value) -> ArrayResult<String> {
        match self {
            ElementCodec::Bool(c) => c.encode_text(value),
            ElementCodec::Int(c) => c.encode_text(value),
            ElementCodec::Float(c) => c.encode_text(value),
            ElementCodec::Text(c) => c.encode_text(value),
            ElementCodec::Bytea(c) => c.encode_text(value),
            ElementCodec::Array(c) => c.encode_text(registry, value),
        }
    }

    pub fn decode_text(&self, registry: &TypeRegistry, text: &str) -> ArrayResult<Value> {
        match self {
            ElementCodec::Bool(c) => c.decode_text(text),
            ElementCodec::Int(c) => c.decode_text(text),
            ElementCodec::Float(c) => c.decode_text(text),
            ElementCodec::Text(c) => c.decode_text(text),
            ElementCodec::Bytea(c) => c.decode_text(text),
            ElementCodec::Array(c) => c.decode_text(registry, text),
        }
    }
}

/// Map a built-in type OID to its codec.
pub fn builtin_codec(type_oid: Oid) -> Option<ElementCodec> {
    let codec = match type_oid {
        oid::BOOL => ElementCodec::Bool(boolean::BoolCodec),
        oid::BYTEA => ElementCodec::Bytea(bytea::ByteaCodec),
        oid::INT2 => ElementCodec::Int(int::IntCodec::new(IntWidth::Two)),
        oid::INT4 => ElementCodec::Int(int::IntCodec::new(IntWidth::Four)),
        oid::INT8 => ElementCodec::Int(int::IntCodec::new(IntWidth::Eight)),
        oid::FLOAT4 => ElementCodec::Float(float::FloatCodec::new(FloatWidth::Four)),
        oid::FLOAT8 => ElementCodec::Float(float::FloatCodec::new(FloatWidth::Eight)),
        oid::TEXT | oid::VARCHAR => ElementCodec::Text(text::TextCodec),
        oid::BOOL_ARRAY => ElementCodec::Array(array::ArrayCodec::new(oid::BOOL)),
        oid::BYTEA_ARRAY => ElementCodec::Array(array::ArrayCodec::new(oid::BYTEA)),
        oid::INT2_ARRAY => ElementCodec::Array(array::ArrayCodec::new(oid::INT2)),
        oid::INT4_ARRAY => ElementCodec::Array(array::ArrayCodec::new(oid::INT4)),
        oid::INT8_ARRAY => ElementCodec::Array(array::ArrayCodec::new(oid::INT8)),
        oid::TEXT_ARRAY => ElementCodec::Array(array::ArrayCodec::new(oid::TEXT)),
        oid::VARCHAR_ARRAY => ElementCodec::Array(array::ArrayCodec::new(oid::VARCHAR)),
        oid::FLOAT4_ARRAY => ElementCodec::Array(array::ArrayCodec::new(oid::FLOAT4)),
        oid::FLOAT8_ARRAY => ElementCodec::Array(array::ArrayCodec::new(oid::FLOAT8)),
        _ => return None,
    };
    Some(codec)
}

const BUILTIN_OIDS: &[Oid] = &[
    oid::BOOL,
    oid::BYTEA,
    oid::INT2,
    oid::INT4,
    oid::INT8,
    oid::FLOAT4,
    oid::FLOAT8,
    oid::TEXT,
    oid::VARCHAR,
    oid::BOOL_ARRAY,
    oid::BYTEA_ARRAY,
    oid::INT2_ARRAY,
    oid::INT4_ARRAY,
    oid::INT8_ARRAY,
    oid::TEXT_ARRAY,
    oid::VARCHAR_ARRAY,
    oid::FLOAT4_ARRAY,
    oid::FLOAT8_ARRAY,
];

// ---------------------------------------------------------------------------
// TypeRegistry
// ---------------------------------------------------------------------------

/// Element codecs keyed by type OID, plus the options every array call
/// consults.
///
/// The registry is only read during encode and decode, so a shared reference
/// can serve concurrent calls.
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    codecs: HashMap<Oid, ElementCodec>,
    options: CodecOptions,
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::with_options(CodecOptions::default())
    }
}

impl TypeRegistry {
    /// A registry with no codecs at all.
    pub fn empty() -> Self {
        Self {
            codecs: HashMap::new(),
            options: CodecOptions::default(),
        }
    }

    /// The built-in codecs with custom options.
    pub fn with_options(options: CodecOptions) -> Self {
        let codecs = BUILTIN_OIDS
            .iter()
            .filter_map(|&type_oid| builtin_codec(type_oid).map(|c| (type_oid, c)))
            .collect();
        Self { codecs, options }
    }

    pub fn options(&self) -> &CodecOptions {
        &self.options
    }

    /// Add or replace the codec for `type_oid`, returning the previous one.
    pub fn register(&mut self, type_oid: Oid, codec: ElementCodec) -> Option<ElementCodec> {
        self.codecs.insert(type_oid, codec)
    }

    pub fn lookup(&self, type_oid: Oid) -> ArrayResult<&ElementCodec> {
        self.codecs
            .get(&type_oid)
            .ok_or(ArrayError::UnsupportedElementType(type_oid))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_builtins() {
        let reg = TypeRegistry::default();
        for &type_oid in BUILTIN_OIDS {
            assert!(reg.lookup(type_oid).is_ok(), "missing {type_oid}");
        }
        assert_eq!(reg.lookup(oid::INT8).unwrap().element_type(), ElementType::Int8);
        assert_eq!(
            reg.lookup(oid::INT4_ARRAY).unwrap(),
            &ElementCodec::Array(array::ArrayCodec::new(oid::INT4))
        );
    }

    #[test]
    fn unknown_oid_is_unsupported() {
        let reg = TypeRegistry::default();
        assert!(matches!(
            reg.lookup(114),
            Err(ArrayError::UnsupportedElementType(114))
        ));
        assert!(TypeRegistry::empty().lookup(oid::INT4).is_err());
    }

    #[test]
    fn register_replaces() {
        let mut reg = TypeRegistry::empty();
        assert!(reg.register(25, ElementCodec::Text(text::TextCodec)).is_none());
        let prev = reg.register(25, ElementCodec::Bytea(bytea::ByteaCodec));
        assert_eq!(prev, Some(ElementCodec::Text(text::TextCodec)));
        assert_eq!(reg.lookup(25).unwrap().element_type(), ElementType::Bytea);
    }
}
