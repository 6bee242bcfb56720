use serde::{Deserialize, Serialize};

use crate::error::ArrayResult;

/// Server-side limit on array dimensions (`MAXDIM`).
pub const DEFAULT_MAX_DIMENSIONS: usize = 6;

/// Tunables for the array codec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodecOptions {
    /// Arrays with more dimensions are rejected on both encode and decode.
    #[serde(default = "default_max_dimensions")]
    pub max_dimensions: usize,

    /// Lower bound written for every dimension of a freshly encoded array.
    #[serde(default = "default_lower_bound")]
    pub default_lower_bound: i32,
}

fn default_max_dimensions() -> usize {
    DEFAULT_MAX_DIMENSIONS
}

fn default_lower_bound() -> i32 {
    1
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            max_dimensions: DEFAULT_MAX_DIMENSIONS,
            default_lower_bound: 1,
        }
    }
}

impl CodecOptions {
    /// Parse options from a JSON document; missing fields take their defaults.
    pub fn from_json(data: &[u8]) -> ArrayResult<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}
