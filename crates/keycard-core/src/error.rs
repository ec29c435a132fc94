//! # Error Types
//!
//! Errors raised by the byte-level primitives in this crate. Higher layers
//! wrap these with `#[from]` so the original cause survives propagation.

use thiserror::Error;

/// Error during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// The value could not be converted into a JSON value tree, or JCS
    /// serialization of that tree failed.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Error decoding a transport encoding (base64 or hex).
#[derive(Error, Debug)]
pub enum EncodingError {
    /// Input is not valid standard base64.
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// Input is not valid hex or has the wrong length.
    #[error("invalid hex: {0}")]
    Hex(String),
}
