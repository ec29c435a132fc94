//! # Request Signer
//!
//! Applies signatures to a [`SignableRequest`]. Every party signs the same
//! thing: the 32 fingerprint bytes of the request's snapshot. The validator
//! later recomputes that fingerprint from the card's snapshot and checks
//! each verifier's signature over it.
//!
//! The signer takes the snapshot itself if the request is still fresh, so a
//! signature can never be produced over content that is not yet frozen.

use keycard_core::Fingerprint;
use keycard_crypto::{Crypto, PrivateKey};

use crate::codec::SnapshotCodec;
use crate::error::CardError;
use crate::request::{SignableRequest, SignatureSlot};

/// A signature that was appended to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedSignature {
    /// Id the signature was stored under.
    pub signer_id: String,
    /// Whether it filled a new slot or replaced an existing signature.
    pub slot: SignatureSlot,
}

/// Signs requests through a borrowed crypto capability.
pub struct RequestSigner<'a, C: Crypto + ?Sized> {
    crypto: &'a C,
    codec: &'a SnapshotCodec,
}

impl<'a, C: Crypto + ?Sized> RequestSigner<'a, C> {
    pub fn new(crypto: &'a C, codec: &'a SnapshotCodec) -> Self {
        Self { crypto, codec }
    }

    /// Sign as the card subject. The signer id is the hex fingerprint of
    /// the snapshot, which is also the id the card will be published under.
    pub fn self_sign(
        &self,
        request: &mut SignableRequest,
        subject_key: &PrivateKey,
    ) -> Result<AppliedSignature, CardError> {
        let fingerprint = self.fingerprint(request)?;
        let signer_id = fingerprint.to_hex();
        self.apply(request, fingerprint, signer_id, subject_key)
    }

    /// Sign as an issuing authority under `authority_id`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` if `authority_id` is blank.
    pub fn authority_sign(
        &self,
        request: &mut SignableRequest,
        authority_id: &str,
        authority_key: &PrivateKey,
    ) -> Result<AppliedSignature, CardError> {
        if authority_id.trim().is_empty() {
            return Err(CardError::InvalidArgument(
                "authority id must not be blank".to_string(),
            ));
        }
        self.sign_as(request, authority_id, authority_key)
    }

    /// Sign under an arbitrary signer id.
    pub fn sign_as(
        &self,
        request: &mut SignableRequest,
        signer_id: &str,
        key: &PrivateKey,
    ) -> Result<AppliedSignature, CardError> {
        if signer_id.trim().is_empty() {
            return Err(CardError::InvalidArgument(
                "signer id must not be blank".to_string(),
            ));
        }
        let fingerprint = self.fingerprint(request)?;
        self.apply(request, fingerprint, signer_id.to_string(), key)
    }

    fn fingerprint(&self, request: &mut SignableRequest) -> Result<Fingerprint, CardError> {
        let snapshot = request
            .take_snapshot(self.codec)
            .map_err(|e| CardError::Signing(format!("snapshot could not be taken: {e}")))?;
        Ok(self.crypto.fingerprint(snapshot.as_bytes()))
    }

    fn apply(
        &self,
        request: &mut SignableRequest,
        fingerprint: Fingerprint,
        signer_id: String,
        key: &PrivateKey,
    ) -> Result<AppliedSignature, CardError> {
        let signature = self
            .crypto
            .sign(fingerprint.as_bytes(), key)
            .map_err(|e| CardError::Signing(e.to_string()))?;
        let slot = request.append_signature(&signer_id, signature)?;
        tracing::debug!(
            kind = %request.kind(),
            signer_id = %signer_id,
            fingerprint = %fingerprint,
            replaced = slot.is_replacement(),
            "request signed"
        );
        Ok(AppliedSignature { signer_id, slot })
    }
}
