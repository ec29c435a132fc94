//! # keycard-core: Foundational Types for Signed Identity Cards
//!
//! This crate is the leaf of the keycard workspace. It defines the byte-level
//! primitives every signature in the system is computed over:
//!
//! 1. **`CanonicalBytes` newtype.** All snapshot bytes produced locally flow
//!    through `CanonicalBytes::new()` (RFC 8785 JCS). Identical logical content
//!    always yields identical bytes, so any party holding the same content can
//!    reproduce a signature's message.
//!
//! 2. **`Fingerprint`.** The SHA-256 digest of a snapshot. It is both the
//!    content-addressed card id (as lowercase hex) and the message that every
//!    party signs.
//!
//! 3. **Transport encoding.** Snapshots and signatures travel as standard
//!    base64 with padding. Both directions go through [`encoding`] so export
//!    and import can never disagree on the alphabet.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `keycard-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod canonical;
pub mod encoding;
pub mod error;
pub mod fingerprint;

// Re-export primary types for ergonomic imports.
pub use canonical::CanonicalBytes;
pub use encoding::{base64_decode, base64_encode};
pub use error::{CanonicalizationError, EncodingError};
pub use fingerprint::{Fingerprint, FINGERPRINT_LEN};
