//! # Canonical Snapshot Codec
//!
//! Converts [`CardContent`] into snapshot bytes and back.
//!
//! ## Encoding
//!
//! Content is serialized through [`CanonicalBytes`], so field order is fixed
//! by key sorting rather than by struct layout or map insertion order, and
//! unset optionals are omitted. Encoding is a pure function of the content:
//! any party holding the same logical content reproduces the same bytes.
//!
//! ## Decoding
//!
//! A snapshot is decoded against the schema of an explicitly supplied
//! [`RequestKind`]. There is no type sniffing: a revoke snapshot decoded as a
//! create request is a schema mismatch, not a silent reinterpretation.
//!
//! - Bytes that are not JSON, or exceed the size limit → `MalformedSnapshot`.
//!
//! Encoding refuses content whose snapshot would exceed the same limit, so
//! every snapshot this codec produces also decodes with it.
//! - JSON that does not fit the kind's schema → `SchemaMismatch`.

use serde::de::DeserializeOwned;
use serde_json::Value;

use keycard_core::{base64_encode, CanonicalBytes};

use crate::content::{CardContent, CreateCardContent, RequestKind, RevokeCardContent};
use crate::error::CardError;

/// Default upper bound on accepted snapshot size.
pub const DEFAULT_MAX_SNAPSHOT_LEN: usize = 64 * 1024;

/// Snapshot bytes: the exact bytes a request's fingerprint is computed over.
///
/// Locally produced snapshots come from [`SnapshotCodec::encode`]. Snapshots
/// received from transport are kept verbatim via [`Snapshot::from_bytes`] and
/// are never re-encoded, since re-encoding could change the fingerprint.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Snapshot(Vec<u8>);

impl Snapshot {
    /// Wrap bytes received from transport.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// The raw snapshot bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Standard base64 rendering used by the request envelope.
    pub fn to_base64(&self) -> String {
        base64_encode(&self.0)
    }

    /// Consume the snapshot and return the owned bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl From<CanonicalBytes> for Snapshot {
    fn from(bytes: CanonicalBytes) -> Self {
        Self(bytes.into_bytes())
    }
}

impl AsRef<[u8]> for Snapshot {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for Snapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(text) => write!(f, "Snapshot({text})"),
            Err(_) => write!(f, "Snapshot(<{} bytes>)", self.0.len()),
        }
    }
}

/// Encoder/decoder between [`CardContent`] and [`Snapshot`].
///
/// Passed explicitly to every component that needs it; there is no global
/// codec instance.
#[derive(Debug, Clone)]
pub struct SnapshotCodec {
    max_snapshot_len: usize,
}

impl Default for SnapshotCodec {
    fn default() -> Self {
        Self {
            max_snapshot_len: DEFAULT_MAX_SNAPSHOT_LEN,
        }
    }
}

impl SnapshotCodec {
    /// Codec with the default size limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec that rejects snapshots larger than `max_snapshot_len` bytes.
    pub fn with_max_snapshot_len(max_snapshot_len: usize) -> Self {
        Self { max_snapshot_len }
    }

    /// The configured size limit.
    pub fn max_snapshot_len(&self) -> usize {
        self.max_snapshot_len
    }

    /// Encode content into canonical snapshot bytes.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if the content violates its field invariants, or
    /// if its snapshot would exceed the size limit that [`decode`](Self::decode)
    /// enforces.
    pub fn encode(&self, content: &CardContent) -> Result<Snapshot, CardError> {
        content.validate().map_err(CardError::InvalidArgument)?;
        let canonical = match content {
            CardContent::Create(c) => CanonicalBytes::new(c)?,
            CardContent::Revoke(r) => CanonicalBytes::new(r)?,
        };
        if canonical.len() > self.max_snapshot_len {
            return Err(CardError::InvalidArgument(format!(
                "snapshot would be {} bytes, limit is {}",
                canonical.len(),
                self.max_snapshot_len
            )));
        }
        Ok(Snapshot::from(canonical))
    }

    /// Decode snapshot bytes against the schema for `kind`.
    pub fn decode(&self, bytes: &[u8], kind: RequestKind) -> Result<CardContent, CardError> {
        if bytes.len() > self.max_snapshot_len {
            return Err(CardError::MalformedSnapshot(format!(
                "snapshot is {} bytes, limit is {}",
                bytes.len(),
                self.max_snapshot_len
            )));
        }
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| CardError::MalformedSnapshot(e.to_string()))?;
        if !value.is_object() {
            return Err(CardError::SchemaMismatch(
                "snapshot must be a JSON object".to_string(),
            ));
        }

        let content = match kind {
            RequestKind::CreateCard => CardContent::Create(from_schema::<CreateCardContent>(value)?),
            RequestKind::RevokeCard => CardContent::Revoke(from_schema::<RevokeCardContent>(value)?),
        };
        content.validate().map_err(CardError::SchemaMismatch)?;
        Ok(content)
    }

    /// Decode a create-card snapshot.
    pub fn decode_create(&self, bytes: &[u8]) -> Result<CreateCardContent, CardError> {
        match self.decode(bytes, RequestKind::CreateCard)? {
            CardContent::Create(c) => Ok(c),
            CardContent::Revoke(_) => Err(CardError::SchemaMismatch(
                "expected create-card content".to_string(),
            )),
        }
    }
}

fn from_schema<T: DeserializeOwned>(value: Value) -> Result<T, CardError> {
    serde_json::from_value(value).map_err(|e| CardError::SchemaMismatch(e.to_string()))
}


#[cfg(test)]
mod proptests {
    use super::*;
    use crate::content::{CardScope, DeviceInfo, RevocationReason};
    use proptest::prelude::*;
    use std::collections::BTreeMap;

    fn create_content() -> impl Strategy<Value = CreateCardContent> {
        (
            "[a-z][a-z0-9@.]{0,20}",
            "[a-z]{1,12}",
            prop::collection::vec(any::<u8>(), 1..64),
            prop_oneof![Just(CardScope::Application), Just(CardScope::Global)],
            prop::collection::btree_map("[a-z_]{1,8}", "[ -~]{0,16}", 0..6),
            prop::option::of(("[A-Za-z ]{0,12}", "[A-Za-z' ]{0,12}")),
        )
            .prop_map(|(identity, identity_type, public_key, scope, data, info)| {
                CreateCardContent {
                    identity,
                    identity_type,
                    public_key,
                    scope,
                    data,
                    info: info.map(|(device, device_name)| DeviceInfo {
                        device,
                        device_name,
                    }),
                }
            })
    }

    proptest! {
        #[test]
        fn create_round_trip(content in create_content()) {
            let codec = SnapshotCodec::new();
            let snapshot = codec.encode(&content.clone().into()).unwrap();
            let decoded = codec.decode(snapshot.as_bytes(), RequestKind::CreateCard).unwrap();
            prop_assert_eq!(decoded, CardContent::Create(content));
        }

        #[test]
        fn revoke_round_trip(card_id in "[0-9a-f]{1,64}", compromised in any::<bool>()) {
            let reason = if compromised {
                RevocationReason::Compromised
            } else {
                RevocationReason::Unspecified
            };
            let content = RevokeCardContent::new(card_id, reason).unwrap();
            let codec = SnapshotCodec::new();
            let snapshot = codec.encode(&content.clone().into()).unwrap();
            let decoded = codec.decode(snapshot.as_bytes(), RequestKind::RevokeCard).unwrap();
            prop_assert_eq!(decoded, CardContent::Revoke(content));
        }

        /// Insertion order of metadata never changes the snapshot.
        #[test]
        fn data_insertion_order_irrelevant(
            entries in prop::collection::vec(("[a-z]{1,6}", "[a-z]{0,6}"), 0..8)
        ) {
            let unique: BTreeMap<String, String> = entries.into_iter().collect();
            let mut forward = CreateCardContent::new("a", "b", vec![1]).unwrap();
            let mut reverse = forward.clone();
            for (k, v) in unique.iter() {
                forward.data.insert(k.clone(), v.clone());
            }
            for (k, v) in unique.iter().rev() {
                reverse.data.insert(k.clone(), v.clone());
            }
            let codec = SnapshotCodec::new();
            prop_assert_eq!(
                codec.encode(&forward.into()).unwrap(),
                codec.encode(&reverse.into()).unwrap()
            );
        }
    }
}
