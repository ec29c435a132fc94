//! # Transport Encoding
//!
//! Snapshot and signature bytes cross the wire as standard base64 (RFC 4648
//! alphabet, with padding). Export and import both go through these two
//! functions; signatures are verified against the decoded bytes, so a
//! mismatch in alphabet or padding would break every card.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::error::EncodingError;

/// Encode bytes as standard padded base64.
pub fn base64_encode(bytes: impl AsRef<[u8]>) -> String {
    STANDARD.encode(bytes)
}

/// Decode standard padded base64.
pub fn base64_decode(text: &str) -> Result<Vec<u8>, EncodingError> {
    Ok(STANDARD.decode(text.trim())?)
}
