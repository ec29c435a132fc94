//! # Canonical Serialization: JCS Byte Production
//!
//! This module defines `CanonicalBytes`, the sole construction path for
//! snapshot bytes produced by this workspace.
//!
//! ## Security Invariant
//!
//! Signatures are computed over the fingerprint of a snapshot, so two parties
//! holding the same logical content must derive byte-identical snapshots.
//! `CanonicalBytes` has a private inner field and one construction pipeline that
//! serializes through RFC 8785 (JSON Canonicalization Scheme):
//!
//! 1. Object keys sorted lexicographically at every depth, so map insertion
//!    order never leaks into the bytes.
//! 2. Compact separators, no insignificant whitespace.
//! 3. UTF-8 output, strings escaped per the JCS rules.
//!
//! Any function that needs bytes for signing must accept `&CanonicalBytes`
//! (or a type wrapping it), and the only way to produce one is through
//! this pipeline.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// Bytes produced exclusively by JCS canonicalization.
///
/// # Invariants
///
/// - The only constructors are [`CanonicalBytes::new()`] and
///   [`CanonicalBytes::from_value()`].
/// - Serialization uses sorted keys with compact separators (RFC 8785).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Construct canonical bytes from any serializable value.
    ///
    /// # Errors
    ///
    /// Returns `CanonicalizationError::SerializationFailed` if the value cannot
    /// be represented as JSON (for example a map with non-string keys).
    pub fn new(obj: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let value = serde_json::to_value(obj)?;
        Self::from_value(value)
    }

    /// Construct canonical bytes from an already-built JSON value tree.
    pub fn from_value(value: Value) -> Result<Self, CanonicalizationError> {
        let s = serde_jcs::to_string(&value)?;
        Ok(Self(s.into_bytes()))
    }

    /// Access the canonical bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Consume the wrapper and return the owned bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    /// Returns the length of the canonical byte sequence.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the canonical byte sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl AsRef<[u8]> for CanonicalBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeMap, HashMap};

    #[test]
    fn test_canonical_bytes_simple_dict() {
        let data = serde_json::json!({"b": 2, "a": 1, "c": "hello"});
        let cb = CanonicalBytes::new(&data).expect("should canonicalize");
        let s = std::str::from_utf8(cb.as_bytes()).unwrap();
        assert_eq!(s, r#"{"a":1,"b":2,"c":"hello"}"#);
    }

    #[test]
    fn test_canonical_bytes_nested() {
        let data = serde_json::json!({
            "outer": {"b": "2", "a": "1"},
            "list": ["3", "2", "1"]
        });
        let cb = CanonicalBytes::new(&data).expect("should canonicalize");
        let s = std::str::from_utf8(cb.as_bytes()).unwrap();
        assert_eq!(s, r#"{"list":["3","2","1"],"outer":{"a":"1","b":"2"}}"#);
    }

    #[test]
    fn test_hash_map_order_does_not_leak() {
        let mut first = HashMap::new();
        let mut second = HashMap::new();
        for i in 0..32 {
            first.insert(format!("key-{i}"), i.to_string());
        }
        for i in (0..32).rev() {
            second.insert(format!("key-{i}"), i.to_string());
        }
        let a = CanonicalBytes::new(&first).unwrap();
        let b = CanonicalBytes::new(&second).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_struct_field_order_is_lexicographic() {
        #[derive(Serialize)]
        struct Content {
            zeta: &'static str,
            alpha: &'static str,
        }
        let cb = CanonicalBytes::new(&Content {
            zeta: "z",
            alpha: "a",
        })
        .unwrap();
        assert_eq!(cb.as_bytes(), br#"{"alpha":"a","zeta":"z"}"#);
    }

    #[test]
    fn test_non_string_keys_rejected() {
        let mut data = BTreeMap::new();
        data.insert(vec![1u8], "v");
        assert!(CanonicalBytes::new(&data).is_err());
    }

    #[test]
    fn test_empty_object() {
        let cb = CanonicalBytes::new(&serde_json::json!({})).unwrap();
        assert_eq!(cb.as_bytes(), b"{}");
        assert!(!cb.is_empty());
        assert_eq!(cb.len(), 2);
    }

    #[test]
    fn test_unicode_passthrough() {
        let data = serde_json::json!({"name": "\u{00e9}l\u{00e8}ve"});
        let cb = CanonicalBytes::new(&data).unwrap();
        let s = std::str::from_utf8(cb.as_bytes()).unwrap();
        assert!(s.contains('\u{00e9}'));
    }

    #[test]
    fn test_into_bytes_matches_as_bytes() {
        let cb = CanonicalBytes::new(&serde_json::json!({"k": "v"})).unwrap();
        let expected = cb.as_bytes().to_vec();
        assert_eq!(cb.into_bytes(), expected);
    }
}
