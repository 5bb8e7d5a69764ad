//! Codec errors.

use thiserror::Error;

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Errors produced while encoding or decoding wire payloads.
#[derive(Error, Debug)]
pub enum CodecError {
    /// The payload was not valid JSON.
    #[error("malformed payload: {0}")]
    Malformed(#[from] serde_json::Error),

    /// The payload was structurally valid but missing required content.
    #[error("invalid structure: {0}")]
    InvalidStructure(String),
}

impl CodecError {
    /// Creates an invalid-structure error.
    pub fn invalid_structure(message: impl Into<String>) -> Self {
        Self::InvalidStructure(message.into())
    }
}
