//! # Card Template Builder
//!
//! Assembles the inputs of a create-card request before any key material
//! is resolved. A template names its public key in exactly one of two
//! ways: inline key bytes, or the id of a key held elsewhere (a keystore,
//! an HSM) that is resolved when the request is produced.
//!
//! Signatures collected ahead of time (for example an authority signature
//! delivered out of band) are accumulated with [`CardTemplateBuilder::sign`]
//! and appended once the request is snapshotted.

use std::collections::BTreeMap;

use crate::codec::SnapshotCodec;
use crate::content::{CardScope, CreateCardContent, DeviceInfo};
use crate::error::CardError;
use crate::request::SignableRequest;

/// Where a template's public key comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublicKeySource {
    /// Key id, resolved to bytes by the caller.
    Id(String),
    /// Exported public key bytes.
    Key(Vec<u8>),
}

/// Validated inputs for a create-card request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardTemplate {
    identity: String,
    identity_type: String,
    key_source: PublicKeySource,
    scope: CardScope,
    data: BTreeMap<String, String>,
    info: Option<DeviceInfo>,
    signs: BTreeMap<String, Vec<u8>>,
}

impl CardTemplate {
    pub fn builder() -> CardTemplateBuilder {
        CardTemplateBuilder::default()
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn identity_type(&self) -> &str {
        &self.identity_type
    }

    pub fn key_source(&self) -> &PublicKeySource {
        &self.key_source
    }

    pub fn scope(&self) -> CardScope {
        self.scope
    }

    pub fn data(&self) -> &BTreeMap<String, String> {
        &self.data
    }

    pub fn device_info(&self) -> Option<&DeviceInfo> {
        self.info.as_ref()
    }

    /// Signatures accumulated on the builder.
    pub fn signs(&self) -> &BTreeMap<String, Vec<u8>> {
        &self.signs
    }

    /// Resolve the key source and produce create-card content.
    ///
    /// `resolver` is only called for [`PublicKeySource::Id`].
    pub fn into_content<F>(self, resolver: F) -> Result<CreateCardContent, CardError>
    where
        F: FnOnce(&str) -> Result<Vec<u8>, CardError>,
    {
        self.split(resolver).map(|(content, _)| content)
    }

    /// Produce a snapshotted create-card request carrying the accumulated
    /// signatures.
    pub fn into_request<F>(
        self,
        resolver: F,
        codec: &SnapshotCodec,
    ) -> Result<SignableRequest, CardError>
    where
        F: FnOnce(&str) -> Result<Vec<u8>, CardError>,
    {
        let (content, signs) = self.split(resolver)?;
        let mut request = SignableRequest::create_card(content);
        request.take_snapshot(codec)?;
        for (signer_id, signature) in signs {
            request.append_signature(&signer_id, signature)?;
        }
        Ok(request)
    }

    fn split<F>(self, resolver: F) -> Result<(CreateCardContent, BTreeMap<String, Vec<u8>>), CardError>
    where
        F: FnOnce(&str) -> Result<Vec<u8>, CardError>,
    {
        let public_key = match self.key_source {
            PublicKeySource::Key(bytes) => bytes,
            PublicKeySource::Id(id) => {
                let bytes = resolver(&id)?;
                tracing::debug!(key_id = %id, "template public key resolved");
                bytes
            }
        };
        let mut content = CreateCardContent::new(self.identity, self.identity_type, public_key)?
            .with_scope(self.scope);
        content.data = self.data;
        content.info = self.info;
        Ok((content, self.signs))
    }
}

/// Builder for [`CardTemplate`].
#[derive(Debug, Clone, Default)]
pub struct CardTemplateBuilder {
    identity: Option<String>,
    identity_type: Option<String>,
    key_source: Option<PublicKeySource>,
    scope: CardScope,
    data: BTreeMap<String, String>,
    info: Option<DeviceInfo>,
    signs: BTreeMap<String, Vec<u8>>,
}

impl CardTemplateBuilder {
    pub fn identity(mut self, identity: impl Into<String>) -> Self {
        self.identity = Some(identity.into());
        self
    }

    pub fn identity_type(mut self, identity_type: impl Into<String>) -> Self {
        self.identity_type = Some(identity_type.into());
        self
    }

    /// Replace the whole metadata map.
    pub fn data(mut self, data: BTreeMap<String, String>) -> Self {
        self.data = data;
        self
    }

    /// Add one metadata entry.
    pub fn data_entry(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Accumulate a pre-existing signature. A repeated id replaces the
    /// earlier signature.
    pub fn sign(mut self, signer_id: impl Into<String>, signature: Vec<u8>) -> Self {
        self.signs.insert(signer_id.into(), signature);
        self
    }

    pub fn scope(mut self, scope: CardScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn device_info(mut self, device: impl Into<String>, device_name: impl Into<String>) -> Self {
        self.info = Some(DeviceInfo {
            device: device.into(),
            device_name: device_name.into(),
        });
        self
    }

    /// Use a key held elsewhere, identified by `key_id`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if inline key bytes were already set.
    pub fn public_key_id(self, key_id: impl Into<String>) -> Result<Self, CardError> {
        self.set_key_source(PublicKeySource::Id(key_id.into()))
    }

    /// Use inline exported key bytes.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if a key id was already set.
    pub fn public_key(self, key: Vec<u8>) -> Result<Self, CardError> {
        self.set_key_source(PublicKeySource::Key(key))
    }

    fn set_key_source(mut self, source: PublicKeySource) -> Result<Self, CardError> {
        match (&self.key_source, &source) {
            (Some(PublicKeySource::Key(_)), PublicKeySource::Id(_)) => {
                return Err(CardError::InvalidArgument(
                    "public key bytes already set; a key id cannot also be given".to_string(),
                ));
            }
            (Some(PublicKeySource::Id(_)), PublicKeySource::Key(_)) => {
                return Err(CardError::InvalidArgument(
                    "public key id already set; key bytes cannot also be given".to_string(),
                ));
            }
            _ => {}
        }
        self.key_source = Some(source);
        Ok(self)
    }

    /// Validate and build.
    ///
    /// Checks run in this order: a key source is set, the identity is not
    /// blank, the identity type is not blank.
    pub fn build(self) -> Result<CardTemplate, CardError> {
        let key_source = match self.key_source {
            Some(PublicKeySource::Id(id)) if id.trim().is_empty() => {
                return Err(CardError::InvalidArgument(
                    "public key id must not be blank".to_string(),
                ));
            }
            Some(PublicKeySource::Key(key)) if key.is_empty() => {
                return Err(CardError::InvalidArgument(
                    "public key must not be empty".to_string(),
                ));
            }
            Some(source) => source,
            None => {
                return Err(CardError::InvalidArgument(
                    "either a public key or a public key id is required".to_string(),
                ));
            }
        };
        let identity = non_blank(self.identity, "identity")?;
        let identity_type = non_blank(self.identity_type, "identity type")?;
        Ok(CardTemplate {
            identity,
            identity_type,
            key_source,
            scope: self.scope,
            data: self.data,
            info: self.info,
            signs: self.signs,
        })
    }
}

fn non_blank(value: Option<String>, what: &str) -> Result<String, CardError> {
    match value {
        Some(v) if !v.trim().is_empty() => Ok(v),
        _ => Err(CardError::InvalidArgument(format!("{what} must not be blank"))),
    }
}
