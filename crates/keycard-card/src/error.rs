//! # Card Error Types
//!
//! One error enum for the whole signed-request layer. Every operation
//! reports failures synchronously to its immediate caller; nothing here
//! retries or falls back.
//!
//! A signature that was checked and did not match is not an error. The
//! validator reports it as `Ok(false)`. [`CardError::Verification`] is
//! reserved for checks that could not run at all.

use thiserror::Error;

use keycard_core::{CanonicalizationError, EncodingError};
use keycard_crypto::CryptoError;

/// Errors from snapshot encoding, request signing, and card validation.
#[derive(Error, Debug)]
pub enum CardError {
    /// Snapshot bytes are not parseable JSON (or exceed the size limit).
    #[error("malformed snapshot: {0}")]
    MalformedSnapshot(String),

    /// Snapshot parsed but does not match the expected content schema.
    #[error("snapshot schema mismatch: {0}")]
    SchemaMismatch(String),

    /// A required value at a public API boundary was blank or absent.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The request is not in a state that allows the operation.
    #[error("invalid request state: {0}")]
    InvalidState(String),

    /// The crypto capability rejected a signing operation.
    #[error("signing failed: {0}")]
    Signing(String),

    /// A signature check could not be performed.
    #[error("verification could not run: {0}")]
    Verification(String),

    /// An exported request envelope could not be decoded.
    #[error("envelope decode failed: {0}")]
    EnvelopeDecode(String),

    /// Key import or another crypto operation failed.
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Validator configuration could not be loaded or applied.
    #[error("configuration error: {0}")]
    Config(String),

    /// Canonical serialization of request content failed.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),
}

impl CardError {
    pub(crate) fn envelope(context: &str, err: impl std::fmt::Display) -> Self {
        Self::EnvelopeDecode(format!("{context}: {err}"))
    }
}

impl From<EncodingError> for CardError {
    fn from(err: EncodingError) -> Self {
        Self::EnvelopeDecode(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_prefixes() {
        assert_eq!(
            CardError::InvalidArgument("signer id is blank".into()).to_string(),
            "invalid argument: signer id is blank"
        );
        assert!(CardError::MalformedSnapshot("x".into())
            .to_string()
            .starts_with("malformed snapshot"));
        assert!(CardError::SchemaMismatch("x".into())
            .to_string()
            .starts_with("snapshot schema mismatch"));
    }

    #[test]
    fn crypto_error_converts() {
        let err: CardError = CryptoError::KeyRejected("bad seed".into()).into();
        assert!(matches!(err, CardError::Crypto(_)));
        assert!(err.to_string().contains("bad seed"));
    }

    #[test]
    fn encoding_error_becomes_envelope_decode() {
        let err: CardError = EncodingError::Hex("odd".into()).into();
        assert!(matches!(err, CardError::EnvelopeDecode(_)));
    }
}
