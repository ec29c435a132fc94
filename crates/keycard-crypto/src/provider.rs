//! # Crypto Capability
//!
//! The `Crypto` trait is the only way the request, signer, and validator
//! layers touch cryptography. It is object-safe so callers can hold a
//! `&dyn Crypto` and swap backends (an HSM, a platform keystore) without
//! touching the protocol code.
//!
//! ## Verification results
//!
//! [`Crypto::verify`] distinguishes two outcomes that must never be
//! conflated:
//!
//! - `Ok(false)`: the signature was checked and does not match.
//! - `Err(_)`: the check could not run (malformed signature bytes).

use ed25519_dalek::{Signature, Signer, Verifier};
use keycard_core::Fingerprint;

use crate::ed25519::{KeyPair, PrivateKey, PublicKey, SIGNATURE_LEN};
use crate::error::CryptoError;

/// Cryptographic capability consumed by the signed-request protocol.
///
/// Implementations MUST:
/// - Never expose raw private key bytes through this trait.
/// - Return `Ok(false)` from `verify` for a well-formed signature that
///   does not match, reserving `Err` for inputs that cannot be checked.
pub trait Crypto: Send + Sync {
    /// Compute the content fingerprint of `data`.
    fn fingerprint(&self, data: &[u8]) -> Fingerprint;

    /// Sign `data` with `key`.
    fn sign(&self, data: &[u8], key: &PrivateKey) -> Result<Vec<u8>, CryptoError>;

    /// Verify `signature` over `data` against `key`.
    fn verify(&self, data: &[u8], signature: &[u8], key: &PublicKey) -> Result<bool, CryptoError>;

    /// Import a public key from its exported byte form.
    fn import_public_key(&self, bytes: &[u8]) -> Result<PublicKey, CryptoError>;

    /// Import a private key, optionally protected by `password`.
    fn import_private_key(
        &self,
        bytes: &[u8],
        password: Option<&str>,
    ) -> Result<PrivateKey, CryptoError>;

    /// Export a public key to the byte form accepted by `import_public_key`.
    fn export_public_key(&self, key: &PublicKey) -> Vec<u8>;

    /// Derive the public key matching `key`.
    fn extract_public_key(&self, key: &PrivateKey) -> PublicKey;

    /// Generate a fresh key pair.
    fn generate_key_pair(&self) -> KeyPair;
}

/// In-process SHA-256 fingerprints and Ed25519 signatures.
///
/// Keys are raw: 32-byte public keys, 32-byte private seeds. Password
/// protected key containers belong to key storage and are rejected here.
#[derive(Debug, Clone, Copy, Default)]
pub struct SoftwareCrypto;

impl SoftwareCrypto {
    /// Create the software provider.
    pub fn new() -> Self {
        Self
    }
}

impl Crypto for SoftwareCrypto {
    fn fingerprint(&self, data: &[u8]) -> Fingerprint {
        Fingerprint::of(data)
    }

    fn sign(&self, data: &[u8], key: &PrivateKey) -> Result<Vec<u8>, CryptoError> {
        let sig = key.signing_key().sign(data);
        Ok(sig.to_bytes().to_vec())
    }

    fn verify(&self, data: &[u8], signature: &[u8], key: &PublicKey) -> Result<bool, CryptoError> {
        let bytes: [u8; SIGNATURE_LEN] =
            signature
                .try_into()
                .map_err(|_| CryptoError::InvalidSignature {
                    expected: SIGNATURE_LEN,
                    actual: signature.len(),
                })?;
        let sig = Signature::from_bytes(&bytes);
        match key.verifying_key().verify(data, &sig) {
            Ok(()) => Ok(true),
            Err(e) => {
                tracing::debug!(error = %e, "Ed25519 signature did not verify");
                Ok(false)
            }
        }
    }

    fn import_public_key(&self, bytes: &[u8]) -> Result<PublicKey, CryptoError> {
        PublicKey::from_slice(bytes)
    }

    fn import_private_key(
        &self,
        bytes: &[u8],
        password: Option<&str>,
    ) -> Result<PrivateKey, CryptoError> {
        if password.is_some() {
            return Err(CryptoError::KeyRejected(
                "password-protected keys are not supported by the software provider".to_string(),
            ));
        }
        PrivateKey::from_seed_slice(bytes)
    }

    fn export_public_key(&self, key: &PublicKey) -> Vec<u8> {
        key.to_bytes().to_vec()
    }

    fn extract_public_key(&self, key: &PrivateKey) -> PublicKey {
        key.public_key()
    }

    fn generate_key_pair(&self) -> KeyPair {
        KeyPair::generate()
    }
}
