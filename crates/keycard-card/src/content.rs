//! # Card Content
//!
//! The logical payload a request carries and every party signs over. The
//! field layout here is load-bearing: the snapshot codec serializes these
//! structs directly, so renaming a field or changing its `serde` attributes
//! changes every snapshot, fingerprint, and card id.
//!
//! ## Wire shape
//!
//! Create-card content:
//!
//! ```json
//! {"data":{"k":"v"},"identity":"alice","identity_type":"username",
//!  "info":{"device":"iPhone","device_name":"Alice's phone"},
//!  "public_key":"<base64>","scope":"application"}
//! ```
//!
//! Revoke-card content:
//!
//! ```json
//! {"card_id":"<hex fingerprint>","revocation_reason":"compromised"}
//! ```
//!
//! Optional values that are unset (`info`, an empty `data` map) are omitted
//! entirely, so "absent" and "empty" encode the same way.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::CardError;

/// Visibility scope of a card.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardScope {
    /// Visible only to the issuing application.
    #[default]
    Application,
    /// Visible to every application.
    Global,
}

impl std::fmt::Display for CardScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Application => f.write_str("application"),
            Self::Global => f.write_str("global"),
        }
    }
}

/// Reason recorded on a revocation. Carried opaquely inside the snapshot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RevocationReason {
    /// No reason given.
    #[default]
    Unspecified,
    /// The card's private key is known or suspected to be compromised.
    Compromised,
}

/// Device the card's key lives on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeviceInfo {
    /// Device model or class.
    pub device: String,
    /// Human-readable device name.
    pub device_name: String,
}

/// A claimed identity, optionally accompanied by a validation token issued
/// by a separate identity-verification flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// Identity type, e.g. `"email"` or `"username"`.
    #[serde(rename = "type")]
    pub identity_type: String,
    /// Identity value, e.g. `"alice@example.com"`.
    pub value: String,
    /// Proof of verification, if the identity has been confirmed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation_token: Option<String>,
    /// Provider-specific extra fields.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub extra_fields: BTreeMap<String, String>,
}

impl Identity {
    /// An unvalidated identity.
    pub fn new(identity_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            identity_type: identity_type.into(),
            value: value.into(),
            validation_token: None,
            extra_fields: BTreeMap::new(),
        }
    }

    /// Attach a validation token.
    pub fn with_validation_token(mut self, token: impl Into<String>) -> Self {
        self.validation_token = Some(token.into());
        self
    }

    /// Whether a validation token is present.
    pub fn is_validated(&self) -> bool {
        self.validation_token.is_some()
    }
}

/// Content of a create-card request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateCardContent {
    /// Identity value.
    pub identity: String,
    /// Identity type.
    pub identity_type: String,
    /// Exported public key bytes (base64 on the wire).
    #[serde(with = "base64_bytes")]
    pub public_key: Vec<u8>,
    /// Card visibility scope.
    #[serde(default)]
    pub scope: CardScope,
    /// Free-form metadata. Keys are unique and encoded in sorted order.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub data: BTreeMap<String, String>,
    /// Device information.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<DeviceInfo>,
}

impl CreateCardContent {
    /// Create content with the mandatory fields, application scope, and no
    /// metadata.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `identity` or `identity_type` is blank or
    /// `public_key` is empty.
    pub fn new(
        identity: impl Into<String>,
        identity_type: impl Into<String>,
        public_key: Vec<u8>,
    ) -> Result<Self, CardError> {
        let content = Self {
            identity: identity.into(),
            identity_type: identity_type.into(),
            public_key,
            scope: CardScope::Application,
            data: BTreeMap::new(),
            info: None,
        };
        content.validate().map_err(CardError::InvalidArgument)?;
        Ok(content)
    }

    /// Create content for a claimed [`Identity`].
    pub fn for_identity(identity: &Identity, public_key: Vec<u8>) -> Result<Self, CardError> {
        Self::new(identity.value.clone(), identity.identity_type.clone(), public_key)
    }

    /// Set the scope.
    pub fn with_scope(mut self, scope: CardScope) -> Self {
        self.scope = scope;
        self
    }

    /// Add one metadata entry; a repeated key replaces the previous value.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Set the device information.
    pub fn with_device_info(mut self, info: DeviceInfo) -> Self {
        self.info = Some(info);
        self
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.identity.trim().is_empty() {
            return Err("identity must not be blank".to_string());
        }
        if self.identity_type.trim().is_empty() {
            return Err("identity_type must not be blank".to_string());
        }
        if self.public_key.is_empty() {
            return Err("public_key must not be empty".to_string());
        }
        Ok(())
    }
}

/// Content of a revoke-card request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RevokeCardContent {
    /// Id of the card being revoked.
    pub card_id: String,
    /// Why the card is revoked.
    #[serde(rename = "revocation_reason")]
    pub reason: RevocationReason,
}

impl RevokeCardContent {
    /// # Errors
    ///
    /// `InvalidArgument` if `card_id` is blank.
    pub fn new(card_id: impl Into<String>, reason: RevocationReason) -> Result<Self, CardError> {
        let content = Self {
            card_id: card_id.into(),
            reason,
        };
        content.validate().map_err(CardError::InvalidArgument)?;
        Ok(content)
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        if self.card_id.trim().is_empty() {
            return Err("card_id must not be blank".to_string());
        }
        Ok(())
    }
}

/// The kind of a signable request. Selects the schema a snapshot is
/// decoded against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    /// Publish a new card.
    CreateCard,
    /// Revoke an existing card.
    RevokeCard,
}

impl std::fmt::Display for RequestKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreateCard => f.write_str("create_card"),
            Self::RevokeCard => f.write_str("revoke_card"),
        }
    }
}

/// Content of any signable request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardContent {
    /// Create-card content.
    Create(CreateCardContent),
    /// Revoke-card content.
    Revoke(RevokeCardContent),
}

impl CardContent {
    /// The request kind this content belongs to.
    pub fn kind(&self) -> RequestKind {
        match self {
            Self::Create(_) => RequestKind::CreateCard,
            Self::Revoke(_) => RequestKind::RevokeCard,
        }
    }

    /// Borrow as create-card content.
    pub fn as_create(&self) -> Option<&CreateCardContent> {
        match self {
            Self::Create(c) => Some(c),
            Self::Revoke(_) => None,
        }
    }

    /// Borrow as revoke-card content.
    pub fn as_revoke(&self) -> Option<&RevokeCardContent> {
        match self {
            Self::Revoke(r) => Some(r),
            Self::Create(_) => None,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), String> {
        match self {
            Self::Create(c) => c.validate(),
            Self::Revoke(r) => r.validate(),
        }
    }
}

impl From<CreateCardContent> for CardContent {
    fn from(content: CreateCardContent) -> Self {
        Self::Create(content)
    }
}

impl From<RevokeCardContent> for CardContent {
    fn from(content: RevokeCardContent) -> Self {
        Self::Revoke(content)
    }
}

/// Serde adapter: `Vec<u8>` as standard padded base64 text.
pub(crate) mod base64_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&keycard_core::base64_encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let text = String::deserialize(deserializer)?;
        keycard_core::base64_decode(&text).map_err(serde::de::Error::custom)
    }
}
