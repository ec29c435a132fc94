//! # keycard-crypto: Cryptographic Capability
//!
//! The signed-request protocol treats cryptography as a black box. This
//! crate defines that box:
//!
//! - [`Crypto`]: the capability trait: fingerprinting, signing,
//!   verification, key import/export. Callers hold a `&dyn Crypto` or a
//!   generic `C: Crypto`, never a process-wide singleton.
//! - [`PublicKey`], [`PrivateKey`], [`KeyPair`]: Ed25519 key newtypes.
//!   Private keys zeroize on drop and never implement `Serialize`.
//! - [`SoftwareCrypto`]: in-process SHA-256 + Ed25519 implementation.
//!
//! ## Crate Policy
//!
//! - Depends only on `keycard-core` internally.
//! - No mocking of cryptographic operations in tests: all tests use real
//!   SHA-256 and real Ed25519.

pub mod ed25519;
pub mod error;
pub mod provider;

pub use ed25519::{KeyPair, PrivateKey, PublicKey, PUBLIC_KEY_LEN, SIGNATURE_LEN};
pub use error::CryptoError;
pub use provider::{Crypto, SoftwareCrypto};
