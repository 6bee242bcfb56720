pub mod any;
pub mod array;
pub mod codecs;
pub mod config;
pub mod decode;
pub mod encode;
pub mod error;
pub mod shape;
pub mod text;
pub mod types;

// Re-export key types at crate root for convenience.
pub use any::{decode_any, encode_any};
pub use array::{ArrayHeader, Dimension, RawArray};
pub use codecs::{ElementCodec, TypeRegistry};
pub use config::CodecOptions;
pub use decode::{decode_array, decode_elements, DecodedArray};
pub use encode::encode_array;
pub use error::{ArrayError, ArrayResult};
pub use shape::{infer_shape, Nested, Shape};
pub use text::{decode_text_array, encode_text_array, format_text, parse_text};
pub use types::{oid, ElementKind, ElementType, Oid, Value};
