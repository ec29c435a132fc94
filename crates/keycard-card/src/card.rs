//! # Card Model
//!
//! A [`Card`] is the server-issued record the validator checks: the exact
//! snapshot bytes it was created from, the fields decoded out of that
//! snapshot, a version string, and the multi-party signature map.
//!
//! Cards are read-only. There are no setters, and [`Card::signatures`]
//! hands out a shared borrow of the map.
//!
//! The card id is expected to equal the hex fingerprint of the snapshot.
//! Nothing here enforces that; trust is established by the validator
//! checking signatures over the recomputed fingerprint, not by the id.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use keycard_core::base64_decode;
use keycard_crypto::Crypto;

use crate::codec::{Snapshot, SnapshotCodec};
use crate::content::{CardScope, CreateCardContent};
use crate::error::CardError;
use crate::request::{decode_signs, SignableRequest};

/// A published identity card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    id: String,
    snapshot: Snapshot,
    identity: String,
    identity_type: String,
    public_key: Vec<u8>,
    scope: CardScope,
    data: BTreeMap<String, String>,
    device: Option<String>,
    device_name: Option<String>,
    version: String,
    created_at: Option<DateTime<Utc>>,
    signatures: BTreeMap<String, Vec<u8>>,
}

/// Inputs for [`Card::from_parts`].
#[derive(Debug, Clone)]
pub struct CardParts {
    /// Card id as issued by the server.
    pub id: String,
    /// Snapshot bytes exactly as received.
    pub snapshot: Snapshot,
    /// Content decoded from `snapshot`.
    pub content: CreateCardContent,
    /// Card format version.
    pub version: String,
    /// Issue time, if the server reported one.
    pub created_at: Option<DateTime<Utc>>,
    /// Signer id → signature bytes.
    pub signatures: BTreeMap<String, Vec<u8>>,
}

impl Card {
    /// Assemble a card from already decoded parts.
    pub fn from_parts(parts: CardParts) -> Self {
        let CardParts {
            id,
            snapshot,
            content,
            version,
            created_at,
            signatures,
        } = parts;
        let (device, device_name) = match content.info {
            Some(info) => (Some(info.device), Some(info.device_name)),
            None => (None, None),
        };
        Self {
            id,
            snapshot,
            identity: content.identity,
            identity_type: content.identity_type,
            public_key: content.public_key,
            scope: content.scope,
            data: content.data,
            device,
            device_name,
            version,
            created_at,
            signatures,
        }
    }

    /// Build a card from a server response, decoding the snapshot as
    /// create-card content. The snapshot bytes are kept verbatim.
    ///
    /// # Errors
    ///
    /// - `EnvelopeDecode` if a base64 field does not decode.
    /// - `MalformedSnapshot` / `SchemaMismatch` if the snapshot is not valid
    ///   create-card content.
    pub fn from_response(
        response: &SignedResponse,
        codec: &SnapshotCodec,
    ) -> Result<Self, CardError> {
        let bytes = base64_decode(&response.content_snapshot)
            .map_err(|e| CardError::envelope("content_snapshot", e))?;
        let content = codec.decode_create(&bytes)?;
        let signatures = decode_signs(response.meta.signs.clone())?;
        Ok(Self::from_parts(CardParts {
            id: response.id.clone(),
            snapshot: Snapshot::from_bytes(bytes),
            content,
            version: response.meta.card_version.clone(),
            created_at: response.meta.created_at,
            signatures,
        }))
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The exact bytes the signatures were made over (via their fingerprint).
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn identity_type(&self) -> &str {
        &self.identity_type
    }

    pub fn public_key(&self) -> &[u8] {
        &self.public_key
    }

    pub fn scope(&self) -> CardScope {
        self.scope
    }

    pub fn data(&self) -> &BTreeMap<String, String> {
        &self.data
    }

    pub fn device(&self) -> Option<&str> {
        self.device.as_deref()
    }

    pub fn device_name(&self) -> Option<&str> {
        self.device_name.as_deref()
    }

    /// Card format version. Compared against the validator's legacy version.
    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }

    /// Read-only view of the signature map.
    pub fn signatures(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.signatures
    }

    /// The signature stored under `signer_id`.
    pub fn signature(&self, signer_id: &str) -> Option<&[u8]> {
        self.signatures.get(signer_id).map(Vec::as_slice)
    }
}

// ---------------------------------------------------------------------------
// Server response
// ---------------------------------------------------------------------------

/// A card record as returned by the card service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedResponse {
    /// Card id (hex fingerprint of the snapshot).
    pub id: String,
    /// Base64 of the snapshot bytes.
    pub content_snapshot: String,
    /// Signatures and record metadata.
    pub meta: ResponseMeta,
}

/// The `meta` object of a [`SignedResponse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResponseMeta {
    /// Signer id → base64 signature.
    #[serde(default)]
    pub signs: BTreeMap<String, String>,
    /// Card format version.
    pub card_version: String,
    /// Issue time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl SignedResponse {
    /// Build the response a card service would return for `request`: the
    /// id is the fingerprint of the request's snapshot and the signatures
    /// are carried over unchanged.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the request has not been snapshotted.
    pub fn from_request<C: Crypto + ?Sized>(
        request: &SignableRequest,
        card_version: impl Into<String>,
        crypto: &C,
    ) -> Result<Self, CardError> {
        let envelope = request.to_envelope()?;
        let snapshot = request.snapshot().ok_or_else(|| {
            CardError::InvalidState("a request must be snapshotted before it is issued".to_string())
        })?;
        Ok(Self {
            id: crypto.fingerprint(snapshot.as_bytes()).to_hex(),
            content_snapshot: envelope.content_snapshot,
            meta: ResponseMeta {
                signs: envelope.meta.signs,
                card_version: card_version.into(),
                created_at: Some(Utc::now()),
            },
        })
    }

    /// Parse a response from JSON bytes.
    pub fn from_json(bytes: &[u8]) -> Result<Self, CardError> {
        serde_json::from_slice(bytes).map_err(|e| CardError::envelope("signed response", e))
    }
}
