//! # Cryptographic Error Types
//!
//! Structured errors for the crypto capability. A signature that checks out
//! as "not matching" is **not** an error: [`Crypto::verify`](crate::Crypto::verify)
//! returns `Ok(false)` for that. These variants cover the cases where an
//! operation could not run at all.

use thiserror::Error;

/// Errors from cryptographic operations.
#[derive(Error, Debug)]
pub enum CryptoError {
    /// A private key was rejected for signing or import.
    #[error("private key rejected: {0}")]
    KeyRejected(String),

    /// Public key bytes could not be imported.
    #[error("invalid Ed25519 public key: {0}")]
    InvalidPublicKey(String),

    /// Signature bytes are malformed (wrong length or encoding).
    #[error("invalid Ed25519 signature: expected {expected} bytes, got {actual}")]
    InvalidSignature {
        /// Expected signature length.
        expected: usize,
        /// Length that was supplied.
        actual: usize,
    },
}
