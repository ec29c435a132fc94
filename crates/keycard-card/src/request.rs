//! # Signable Request
//!
//! A request wraps card content, freezes it into a snapshot, and accumulates
//! signatures from independent parties over that snapshot's fingerprint.
//!
//! ## State machine
//!
//! ```text
//!   Fresh ──take_snapshot()──▶ Snapshotted ──export()──▶ (envelope bytes)
//!                                  │  ▲
//!                                  └──┘ append_signature()
//! ```
//!
//! - `take_snapshot()` encodes once and caches. Later calls return the
//!   cached bytes, even if the content was mutated in between. Signatures
//!   and snapshot can therefore never drift apart.
//! - Export does not freeze the request; further local signing is allowed.
//!
//! ## Signer id collisions
//!
//! Appending under an existing signer id replaces the previous signature.
//! The replacement is reported through [`SignatureSlot::Replaced`] and
//! counted by [`SignableRequest::replaced_signatures`], so a caller that
//! wants to reject duplicates can do so without changing this contract.
//!
//! ## Envelope
//!
//! ```json
//! {"content_snapshot":"<base64 snapshot>","meta":{"signs":{"<signer id>":"<base64 signature>"}}}
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use keycard_core::{base64_decode, base64_encode};

use crate::codec::{Snapshot, SnapshotCodec};
use crate::content::{CardContent, CreateCardContent, RequestKind, RevokeCardContent};
use crate::error::CardError;

/// Snapshot state of a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestState {
    /// Content is set, no snapshot has been taken.
    Fresh,
    /// Snapshot computed or restored; immutable from here on.
    Snapshotted(Snapshot),
}

/// Outcome of appending a signature.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureSlot {
    /// No signature existed under this signer id.
    Inserted,
    /// A signature under this signer id was replaced.
    Replaced {
        /// The signature that was overwritten.
        previous: Vec<u8>,
    },
}

impl SignatureSlot {
    /// Whether an existing signature was overwritten.
    pub fn is_replacement(&self) -> bool {
        matches!(self, Self::Replaced { .. })
    }
}

/// Wire form of an exported request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    /// Base64 of the snapshot bytes.
    pub content_snapshot: String,
    /// Signature metadata.
    pub meta: EnvelopeMeta,
}

/// The `meta` object of a request envelope.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvelopeMeta {
    /// Signer id → base64 signature.
    #[serde(default)]
    pub signs: BTreeMap<String, String>,
}

/// A card request being signed by one or more parties.
#[derive(Debug, Clone)]
pub struct SignableRequest {
    content: CardContent,
    state: RequestState,
    signatures: BTreeMap<String, Vec<u8>>,
    replaced_signatures: usize,
}

impl SignableRequest {
    /// A fresh request over `content`.
    pub fn new(content: impl Into<CardContent>) -> Self {
        Self {
            content: content.into(),
            state: RequestState::Fresh,
            signatures: BTreeMap::new(),
            replaced_signatures: 0,
        }
    }

    /// A fresh create-card request.
    pub fn create_card(content: CreateCardContent) -> Self {
        Self::new(content)
    }

    /// A fresh revoke-card request.
    pub fn revoke_card(content: RevokeCardContent) -> Self {
        Self::new(content)
    }

    /// Rebuild a snapshotted request from a transported snapshot and its
    /// signatures. The typed content is re-derived by decoding `snapshot`
    /// against `kind`; the snapshot bytes themselves are kept verbatim.
    pub fn restore(
        snapshot: Snapshot,
        signatures: BTreeMap<String, Vec<u8>>,
        kind: RequestKind,
        codec: &SnapshotCodec,
    ) -> Result<Self, CardError> {
        let content = codec.decode(snapshot.as_bytes(), kind)?;
        let mut request = Self::new(content);
        request.state = RequestState::Snapshotted(snapshot);
        for (signer_id, signature) in signatures {
            request.append_signature(&signer_id, signature)?;
        }
        Ok(request)
    }

    /// The request kind.
    pub fn kind(&self) -> RequestKind {
        self.content.kind()
    }

    /// The typed content.
    pub fn content(&self) -> &CardContent {
        &self.content
    }

    /// Mutable access to the content. Has no effect on an already taken
    /// snapshot.
    pub fn content_mut(&mut self) -> &mut CardContent {
        &mut self.content
    }

    /// The current snapshot state.
    pub fn state(&self) -> &RequestState {
        &self.state
    }

    /// Whether a snapshot has been taken or restored.
    pub fn is_snapshotted(&self) -> bool {
        matches!(self.state, RequestState::Snapshotted(_))
    }

    /// The snapshot, if one has been taken. Never computes.
    pub fn snapshot(&self) -> Option<&Snapshot> {
        match &self.state {
            RequestState::Snapshotted(snapshot) => Some(snapshot),
            RequestState::Fresh => None,
        }
    }

    /// Compute the snapshot on first call; return the cached one afterwards.
    pub fn take_snapshot(&mut self, codec: &SnapshotCodec) -> Result<&Snapshot, CardError> {
        if matches!(self.state, RequestState::Fresh) {
            let snapshot = codec.encode(&self.content)?;
            tracing::debug!(kind = %self.kind(), len = snapshot.len(), "request snapshot taken");
            self.state = RequestState::Snapshotted(snapshot);
        }
        self.snapshot()
            .ok_or_else(|| CardError::InvalidState("snapshot missing after encode".to_string()))
    }

    /// Add a signature under `signer_id`. Replaces any existing signature
    /// under the same id.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `signer_id` is blank or `signature` is empty.
    /// - `InvalidState` if no snapshot has been taken yet.
    pub fn append_signature(
        &mut self,
        signer_id: &str,
        signature: Vec<u8>,
    ) -> Result<SignatureSlot, CardError> {
        if signer_id.trim().is_empty() {
            return Err(CardError::InvalidArgument(
                "signer id must not be blank".to_string(),
            ));
        }
        if signature.is_empty() {
            return Err(CardError::InvalidArgument(format!(
                "signature for signer {signer_id} must not be empty"
            )));
        }
        if self.snapshot().is_none() {
            return Err(CardError::InvalidState(
                "signatures can only be appended after the snapshot is taken".to_string(),
            ));
        }

        match self.signatures.insert(signer_id.to_string(), signature) {
            None => Ok(SignatureSlot::Inserted),
            Some(previous) => {
                self.replaced_signatures += 1;
                tracing::warn!(signer_id, "replacing existing signature for signer");
                Ok(SignatureSlot::Replaced { previous })
            }
        }
    }

    /// All signatures, keyed by signer id.
    pub fn signatures(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.signatures
    }

    /// The signature stored under `signer_id`.
    pub fn signature(&self, signer_id: &str) -> Option<&[u8]> {
        self.signatures.get(signer_id).map(Vec::as_slice)
    }

    /// How many appends replaced an existing signature.
    pub fn replaced_signatures(&self) -> usize {
        self.replaced_signatures
    }

    /// Build the wire envelope.
    pub fn to_envelope(&self) -> Result<RequestEnvelope, CardError> {
        let snapshot = self.snapshot().ok_or_else(|| {
            CardError::InvalidState("a request must be snapshotted before export".to_string())
        })?;
        let signs = self
            .signatures
            .iter()
            .map(|(id, sig)| (id.clone(), base64_encode(sig)))
            .collect();
        Ok(RequestEnvelope {
            content_snapshot: snapshot.to_base64(),
            meta: EnvelopeMeta { signs },
        })
    }

    /// Export the request as JSON envelope bytes.
    pub fn export(&self) -> Result<Vec<u8>, CardError> {
        let envelope = self.to_envelope()?;
        serde_json::to_vec(&envelope)
            .map_err(|e| CardError::InvalidState(format!("envelope serialization failed: {e}")))
    }

    /// Export the JSON envelope wrapped in base64 text.
    pub fn export_base64(&self) -> Result<String, CardError> {
        Ok(base64_encode(self.export()?))
    }

    /// Import an envelope produced by [`export`](Self::export).
    ///
    /// # Errors
    ///
    /// - `EnvelopeDecode` if the outer structure or its base64 fields do not
    ///   decode.
    /// - `MalformedSnapshot` / `SchemaMismatch` if the snapshot does not
    ///   decode as `expected_kind`.
    pub fn import(
        bytes: &[u8],
        expected_kind: RequestKind,
        codec: &SnapshotCodec,
    ) -> Result<Self, CardError> {
        let envelope: RequestEnvelope =
            serde_json::from_slice(bytes).map_err(|e| CardError::envelope("envelope", e))?;
        Self::from_envelope(envelope, expected_kind, codec)
    }

    /// Import an envelope produced by [`export_base64`](Self::export_base64).
    pub fn import_base64(
        text: &str,
        expected_kind: RequestKind,
        codec: &SnapshotCodec,
    ) -> Result<Self, CardError> {
        let bytes = base64_decode(text).map_err(|e| CardError::envelope("envelope base64", e))?;
        Self::import(&bytes, expected_kind, codec)
    }

    /// Rebuild a request from an already parsed envelope.
    pub fn from_envelope(
        envelope: RequestEnvelope,
        expected_kind: RequestKind,
        codec: &SnapshotCodec,
    ) -> Result<Self, CardError> {
        let snapshot = base64_decode(&envelope.content_snapshot)
            .map_err(|e| CardError::envelope("content_snapshot", e))?;
        let signatures = decode_signs(envelope.meta.signs)?;
        Self::restore(Snapshot::from_bytes(snapshot), signatures, expected_kind, codec)
    }
}

/// Decode a base64 `signs` map, rejecting entries that could never verify.
pub(crate) fn decode_signs(
    signs: BTreeMap<String, String>,
) -> Result<BTreeMap<String, Vec<u8>>, CardError> {
    signs
        .into_iter()
        .map(|(id, text)| {
            let sig = base64_decode(&text)
                .map_err(|e| CardError::envelope(&format!("signature for {id}"), e))?;
            if id.trim().is_empty() || sig.is_empty() {
                return Err(CardError::EnvelopeDecode(
                    "signs entries need a signer id and a non-empty signature".to_string(),
                ));
            }
            Ok((id, sig))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::RevocationReason;

    fn request() -> SignableRequest {
        SignableRequest::create_card(
            CreateCardContent::new("alice", "username", vec![7u8; 32]).unwrap(),
        )
    }

    #[test]
    fn starts_fresh() {
        let req = request();
        assert_eq!(req.state(), &RequestState::Fresh);
        assert!(req.snapshot().is_none());
        assert_eq!(req.kind(), RequestKind::CreateCard);
    }

    #[test]
    fn take_snapshot_is_idempotent() {
        let codec = SnapshotCodec::new();
        let mut req = request();
        let first = req.take_snapshot(&codec).unwrap().clone();
        let second = req.take_snapshot(&codec).unwrap().clone();
        assert_eq!(first, second);
        assert!(matches!(req.state(), RequestState::Snapshotted(_)));
    }

    #[test]
    fn snapshot_survives_content_mutation() {
        let codec = SnapshotCodec::new();
        let mut req = request();
        let before = req.take_snapshot(&codec).unwrap().clone();

        if let CardContent::Create(c) = req.content_mut() {
            c.identity = "mallory".to_string();
            c.data.insert("injected".to_string(), "yes".to_string());
        }

        let after = req.take_snapshot(&codec).unwrap().clone();
        assert_eq!(before, after);
        assert!(!std::str::from_utf8(after.as_bytes()).unwrap().contains("mallory"));
    }

    #[test]
    fn oversized_content_never_snapshots() {
        let codec = SnapshotCodec::with_max_snapshot_len(64);
        let mut req = SignableRequest::create_card(
            CreateCardContent::new("alice", "username", vec![7u8; 32])
                .unwrap()
                .with_data("note", "y".repeat(128)),
        );
        let err = req.take_snapshot(&codec).unwrap_err();
        assert!(matches!(err, CardError::InvalidArgument(_)));
        assert!(!req.is_snapshotted());
        assert!(matches!(req.export(), Err(CardError::InvalidState(_))));
    }

    #[test]
    fn append_before_snapshot_is_invalid_state() {
        let mut req = request();
        let err = req.append_signature("A", vec![1]).unwrap_err();
        assert!(matches!(err, CardError::InvalidState(_)));
    }

    #[test]
    fn append_rejects_blank_id_and_empty_signature() {
        let codec = SnapshotCodec::new();
        let mut req = request();
        req.take_snapshot(&codec).unwrap();
        assert!(matches!(
            req.append_signature("  ", vec![1]),
            Err(CardError::InvalidArgument(_))
        ));
        assert!(matches!(
            req.append_signature("A", Vec::new()),
            Err(CardError::InvalidArgument(_))
        ));
        assert!(req.signatures().is_empty());
    }

    #[test]
    fn last_signature_wins() {
        let codec = SnapshotCodec::new();
        let mut req = request();
        req.take_snapshot(&codec).unwrap();

        assert_eq!(req.append_signature("A", vec![1]).unwrap(), SignatureSlot::Inserted);
        let slot = req.append_signature("A", vec![2]).unwrap();
        assert_eq!(slot, SignatureSlot::Replaced { previous: vec![1] });
        assert!(slot.is_replacement());

        assert_eq!(req.signatures().len(), 1);
        assert_eq!(req.signature("A"), Some(&[2u8][..]));
        assert_eq!(req.replaced_signatures(), 1);
    }

    #[test]
    fn export_requires_snapshot() {
        let err = request().export().unwrap_err();
        assert!(matches!(err, CardError::InvalidState(_)));
    }

    #[test]
    fn export_has_exact_envelope_shape() {
        let codec = SnapshotCodec::new();
        let mut req = request();
        req.take_snapshot(&codec).unwrap();
        req.append_signature("signer", vec![0xfb, 0xff]).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&req.export().unwrap()).unwrap();
        let obj = value.as_object().unwrap();
        assert_eq!(obj.len(), 2);
        assert_eq!(value["meta"]["signs"]["signer"], "+/8=");
        let snapshot = base64_decode(value["content_snapshot"].as_str().unwrap()).unwrap();
        assert_eq!(snapshot, req.snapshot().unwrap().as_bytes());
    }

    #[test]
    fn export_does_not_freeze_signing() {
        let codec = SnapshotCodec::new();
        let mut req = request();
        req.take_snapshot(&codec).unwrap();
        req.append_signature("A", vec![1]).unwrap();
        let _ = req.export().unwrap();
        req.append_signature("B", vec![2]).unwrap();
        assert_eq!(req.signatures().len(), 2);
    }

    #[test]
    fn import_restores_snapshot_and_signatures() {
        let codec = SnapshotCodec::new();
        let mut req = SignableRequest::revoke_card(
            RevokeCardContent::new("abc", RevocationReason::Compromised).unwrap(),
        );
        req.take_snapshot(&codec).unwrap();
        req.append_signature("A", vec![1, 2, 3]).unwrap();
        req.append_signature("B", vec![4, 5, 6]).unwrap();

        let restored =
            SignableRequest::import(&req.export().unwrap(), RequestKind::RevokeCard, &codec).unwrap();
        assert_eq!(restored.snapshot(), req.snapshot());
        assert_eq!(restored.signatures(), req.signatures());
        assert_eq!(restored.content(), req.content());
        assert_eq!(restored.replaced_signatures(), 0);
    }

    #[test]
    fn import_base64_round_trip() {
        let codec = SnapshotCodec::new();
        let mut req = request();
        req.take_snapshot(&codec).unwrap();
        req.append_signature("A", vec![9]).unwrap();
        let text = req.export_base64().unwrap();
        let restored = SignableRequest::import_base64(&text, RequestKind::CreateCard, &codec).unwrap();
        assert_eq!(restored.signatures(), req.signatures());
    }

    #[test]
    fn import_keeps_transported_snapshot_verbatim() {
        // Non-canonical key order and whitespace must survive import untouched.
        let raw = br#"{ "scope":"global", "public_key":"AQ==", "identity_type":"u", "identity":"a" }"#;
        let envelope = serde_json::json!({
            "content_snapshot": base64_encode(raw),
            "meta": {"signs": {}}
        });
        let restored = SignableRequest::import(
            &serde_json::to_vec(&envelope).unwrap(),
            RequestKind::CreateCard,
            &SnapshotCodec::new(),
        )
        .unwrap();
        assert_eq!(restored.snapshot().unwrap().as_bytes(), &raw[..]);
    }

    #[test]
    fn import_non_json_is_envelope_error() {
        let err = SignableRequest::import(b"garbage", RequestKind::CreateCard, &SnapshotCodec::new())
            .unwrap_err();
        assert!(matches!(err, CardError::EnvelopeDecode(_)));
    }

    #[test]
    fn import_missing_meta_is_envelope_error() {
        let err = SignableRequest::import(
            br#"{"content_snapshot":"e30="}"#,
            RequestKind::CreateCard,
            &SnapshotCodec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, CardError::EnvelopeDecode(_)));
    }

    #[test]
    fn import_bad_signature_base64_is_envelope_error() {
        let err = SignableRequest::import(
            br#"{"content_snapshot":"e30=","meta":{"signs":{"A":"%%%"}}}"#,
            RequestKind::RevokeCard,
            &SnapshotCodec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, CardError::EnvelopeDecode(_)));
    }

    #[test]
    fn import_wrong_schema_propagates_snapshot_error() {
        // "{}" decodes as JSON but lacks every revoke field.
        let err = SignableRequest::import(
            br#"{"content_snapshot":"e30=","meta":{"signs":{}}}"#,
            RequestKind::RevokeCard,
            &SnapshotCodec::new(),
        )
        .unwrap_err();
        assert!(matches!(err, CardError::SchemaMismatch(_)));
    }
}
