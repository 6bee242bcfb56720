use thiserror::Error;

use crate::types::{ElementType, Oid};

pub type ArrayResult<T> = Result<T, ArrayError>;

#[derive(Error, Debug)]
pub enum ArrayError {
    #[error("ragged multi-dimensional array: depth {depth} expected length {expected}, found {actual}")]
    RaggedShape {
        depth: usize,
        expected: usize,
        actual: usize,
    },

    #[error("array has {expected} dimensions but target has {actual} dimensions")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("malformed array data: {0}")]
    MalformedWireData(String),

    #[error("no element codec registered for type oid {0}")]
    UnsupportedElementType(Oid),

    #[error("NULL element at index {index} cannot be decoded into a non-optional value")]
    NullNotAllowed { index: usize },

    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: ElementType,
        found: String,
    },

    #[error("array has {ndims} dimensions, maximum is {max}")]
    TooManyDimensions { ndims: usize, max: usize },

    #[error("array literal syntax error at {position}: {message}")]
    TextSyntax { position: usize, message: String },

    #[error("Encode error: {0}")]
    Encode(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl From<std::io::Error> for ArrayError {
    fn from(e: std::io::Error) -> Self {
        ArrayError::MalformedWireData(e.to_string())
    }
}
