//! # Content Fingerprint
//!
//! A `Fingerprint` is the SHA-256 digest of a snapshot. It serves two roles:
//!
//! - **Content address.** Its lowercase hex rendering is the card id, and the
//!   subject's self-signature is stored under that same id.
//! - **Signed message.** Every party signs the 32 fingerprint bytes, never the
//!   snapshot text itself, so verification needs only the snapshot.
//!
//! Fingerprints are computed over raw bytes rather than `CanonicalBytes`:
//! a snapshot received from transport must be hashed exactly as delivered,
//! even if it was not produced by this workspace's canonicalizer.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::{Digest, Sha256};

use crate::error::EncodingError;

/// Length of a fingerprint in bytes.
pub const FINGERPRINT_LEN: usize = 32;

/// SHA-256 fingerprint of a snapshot.
///
/// Serializes as a lowercase hex string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint([u8; FINGERPRINT_LEN]);

impl Fingerprint {
    /// Compute the SHA-256 fingerprint of `data`.
    pub fn of(data: &[u8]) -> Self {
        let hash = Sha256::digest(data);
        let mut bytes = [0u8; FINGERPRINT_LEN];
        bytes.copy_from_slice(&hash);
        Self(bytes)
    }

    /// Wrap an existing 32-byte digest.
    pub fn from_bytes(bytes: [u8; FINGERPRINT_LEN]) -> Self {
        Self(bytes)
    }

    /// Return the raw digest bytes. This is the message parties sign.
    pub fn as_bytes(&self) -> &[u8; FINGERPRINT_LEN] {
        &self.0
    }

    /// Render the fingerprint as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// Parse a fingerprint from its 64-character hex rendering.
    pub fn from_hex(hex: &str) -> Result<Self, EncodingError> {
        let hex = hex.trim().to_ascii_lowercase();
        if hex.len() != FINGERPRINT_LEN * 2 {
            return Err(EncodingError::Hex(format!(
                "fingerprint hex must be {} chars, got {}",
                FINGERPRINT_LEN * 2,
                hex.len()
            )));
        }
        let bytes = hex_to_bytes(&hex)?;
        let mut arr = [0u8; FINGERPRINT_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl AsRef<[u8]> for Fingerprint {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl std::fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Fingerprint({})", self.to_hex())
    }
}

impl Serialize for Fingerprint {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Fingerprint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Self::from_hex(&hex).map_err(serde::de::Error::custom)
    }
}

// ---------------------------------------------------------------------------
// Hex utilities (no external hex crate dependency)
// ---------------------------------------------------------------------------

fn hex_to_bytes(hex: &str) -> Result<Vec<u8>, EncodingError> {
    if hex.len() % 2 != 0 {
        return Err(EncodingError::Hex(
            "hex string must have even length".to_string(),
        ));
    }
    (0..hex.len())
        .step_by(2)
        .map(|i| {
            hex.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| EncodingError::Hex(format!("invalid hex at position {i}")))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CanonicalBytes;

    #[test]
    fn test_known_sha256_vector() {
        // SHA-256("{}"), the fingerprint of an empty canonical object.
        let cb = CanonicalBytes::new(&serde_json::json!({})).unwrap();
        let fp = Fingerprint::of(cb.as_bytes());
        assert_eq!(
            fp.to_hex(),
            "44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a"
        );
    }

    #[test]
    fn test_empty_input_vector() {
        assert_eq!(
            Fingerprint::of(b"").to_hex(),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_fingerprint_deterministic() {
        assert_eq!(Fingerprint::of(b"snapshot"), Fingerprint::of(b"snapshot"));
        assert_ne!(Fingerprint::of(b"snapshot"), Fingerprint::of(b"snapshoT"));
    }

    #[test]
    fn test_hex_roundtrip() {
        let fp = Fingerprint::of(b"card");
        let hex = fp.to_hex();
        assert_eq!(hex.len(), 64);
        assert_eq!(Fingerprint::from_hex(&hex).unwrap(), fp);
        assert_eq!(Fingerprint::from_hex(&hex.to_uppercase()).unwrap(), fp);
    }

    #[test]
    fn test_from_hex_rejects_bad_input() {
        assert!(Fingerprint::from_hex("abcd").is_err());
        assert!(Fingerprint::from_hex(&"zz".repeat(32)).is_err());
        // Multi-byte characters must not panic on slicing.
        assert!(Fingerprint::from_hex(&"\u{00e9}".repeat(32)).is_err());
    }

    #[test]
    fn test_display_and_serde() {
        let fp = Fingerprint::of(b"x");
        assert_eq!(fp.to_string(), fp.to_hex());
        let json = serde_json::to_string(&fp).unwrap();
        assert_eq!(json, format!("\"{}\"", fp.to_hex()));
        let back: Fingerprint = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fp);
    }

    #[test]
    fn test_debug_shows_hex() {
        let fp = Fingerprint::from_bytes([0u8; 32]);
        assert_eq!(format!("{fp:?}"), format!("Fingerprint({})", "00".repeat(32)));
    }
}
