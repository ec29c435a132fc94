//! # Card Trust Validator
//!
//! Decides whether a [`Card`] is trusted: every registered verifier must
//! have signed the fingerprint of the card's snapshot.
//!
//! ## Algorithm
//!
//! 1. If `card.version()` equals the legacy version, accept.
//! 2. Recompute the fingerprint of the card's snapshot bytes.
//! 3. For each registered verifier, in id order: a missing signature or one
//!    that does not verify rejects the card. A signature that cannot be
//!    checked at all is an error.
//! 4. Otherwise accept.
//!
//! This is a strict conjunction with early exit. There is no quorum, and
//! signatures from signers outside the registry are ignored.
//!
//! ## Service verifier
//!
//! Every validator is built around the card service's verifier, so the
//! registry is never empty: a card the service did not sign is always
//! rejected. The service verifier's key can be replaced through
//! [`CardValidator::add_verifier`] but it cannot be removed.
//!
//! ## Legacy bypass
//!
//! Cards issued under the legacy scheme carry no per-verifier signatures,
//! so the legacy version skips step 2 onward entirely. This is a trust
//! downgrade for any card that claims that version. Every bypass is logged
//! at `info` so it stays visible.
//!
//! ## Concurrency
//!
//! The registry sits behind a `parking_lot::RwLock`. Registration takes the
//! write lock; validation holds the read lock for the whole check, so one
//! validation always sees a single consistent registry.

use std::collections::BTreeMap;

use parking_lot::RwLock;

use keycard_crypto::{Crypto, PublicKey, SoftwareCrypto};

use crate::card::Card;
use crate::config::{ValidatorConfig, LEGACY_CARD_VERSION};
use crate::error::CardError;

/// Validates cards against a registry of trusted verifiers.
pub struct CardValidator<C: Crypto = SoftwareCrypto> {
    crypto: C,
    legacy_version: String,
    service_id: String,
    verifiers: RwLock<BTreeMap<String, PublicKey>>,
}

impl<C: Crypto> CardValidator<C> {
    /// A validator whose registry holds the service verifier, with the
    /// default legacy version.
    ///
    /// # Errors
    ///
    /// Same as [`add_verifier`](Self::add_verifier).
    pub fn new(crypto: C, service_id: &str, service_key: &[u8]) -> Result<Self, CardError> {
        Self::with_legacy_version(crypto, LEGACY_CARD_VERSION, service_id, service_key)
    }

    fn with_legacy_version(
        crypto: C,
        legacy_version: &str,
        service_id: &str,
        service_key: &[u8],
    ) -> Result<Self, CardError> {
        let validator = Self {
            crypto,
            legacy_version: legacy_version.to_string(),
            service_id: service_id.to_string(),
            verifiers: RwLock::new(BTreeMap::new()),
        };
        validator.add_verifier(service_id, service_key)?;
        Ok(validator)
    }

    /// A validator seeded from configuration.
    ///
    /// # Errors
    ///
    /// - `Config` if the service verifier is missing, the legacy version is
    ///   blank, or a configured key is not valid base64.
    /// - Any error [`add_verifier`](Self::add_verifier) reports for an entry.
    pub fn from_config(crypto: C, config: &ValidatorConfig) -> Result<Self, CardError> {
        if config.legacy_version.trim().is_empty() {
            return Err(CardError::Config(
                "legacy_version must not be blank".to_string(),
            ));
        }
        let service = config.service.as_ref().ok_or_else(|| {
            CardError::Config("a service verifier is required".to_string())
        })?;
        let validator = Self::with_legacy_version(
            crypto,
            &config.legacy_version,
            &service.id,
            &service.public_key_bytes()?,
        )?;
        for entry in &config.verifiers {
            let key = entry.public_key_bytes()?;
            validator.add_verifier(&entry.id, &key)?;
        }
        tracing::info!(
            verifiers = validator.len(),
            service_id = %validator.service_id,
            legacy_version = %validator.legacy_version,
            "card validator configured"
        );
        Ok(validator)
    }

    /// The version string that bypasses signature checks.
    pub fn legacy_version(&self) -> &str {
        &self.legacy_version
    }

    /// Id of the service verifier.
    pub fn service_id(&self) -> &str {
        &self.service_id
    }

    /// Register (or replace) a verifier from exported public key bytes.
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if `verifier_id` is blank or `public_key` is empty.
    /// - `Crypto` if the key bytes do not import.
    pub fn add_verifier(&self, verifier_id: &str, public_key: &[u8]) -> Result<(), CardError> {
        if verifier_id.trim().is_empty() {
            return Err(CardError::InvalidArgument(
                "verifier id must not be blank".to_string(),
            ));
        }
        if public_key.is_empty() {
            return Err(CardError::InvalidArgument(format!(
                "public key for verifier {verifier_id} must not be empty"
            )));
        }
        let key = self.crypto.import_public_key(public_key)?;
        self.add_verifier_key(verifier_id, key)
    }

    /// Register (or replace) a verifier from an imported key.
    pub fn add_verifier_key(&self, verifier_id: &str, key: PublicKey) -> Result<(), CardError> {
        if verifier_id.trim().is_empty() {
            return Err(CardError::InvalidArgument(
                "verifier id must not be blank".to_string(),
            ));
        }
        let previous = self.verifiers.write().insert(verifier_id.to_string(), key);
        if previous.is_some() {
            tracing::warn!(verifier_id, "verifier key replaced");
        } else {
            tracing::debug!(verifier_id, "verifier registered");
        }
        Ok(())
    }

    /// Remove a verifier. Returns its key if it was registered. The service
    /// verifier stays registered and `None` is returned for it.
    pub fn remove_verifier(&self, verifier_id: &str) -> Option<PublicKey> {
        if verifier_id == self.service_id {
            tracing::warn!(verifier_id, "service verifier cannot be removed");
            return None;
        }
        let removed = self.verifiers.write().remove(verifier_id);
        if removed.is_some() {
            tracing::debug!(verifier_id, "verifier removed");
        }
        removed
    }

    /// Registered verifier ids, sorted.
    pub fn verifier_ids(&self) -> Vec<String> {
        self.verifiers.read().keys().cloned().collect()
    }

    pub fn contains(&self, verifier_id: &str) -> bool {
        self.verifiers.read().contains_key(verifier_id)
    }

    pub fn len(&self) -> usize {
        self.verifiers.read().len()
    }

    /// Always `false`: the service verifier is always registered.
    pub fn is_empty(&self) -> bool {
        self.verifiers.read().is_empty()
    }

    /// Check `card` against every registered verifier.
    ///
    /// Returns `Ok(false)` when a signature is missing or does not match.
    ///
    /// # Errors
    ///
    /// `Verification` if a present signature could not be checked (for
    /// example it has the wrong length).
    pub fn validate(&self, card: &Card) -> Result<bool, CardError> {
        if card.version() == self.legacy_version {
            tracing::info!(
                card_id = card.id(),
                version = card.version(),
                "legacy card version: signature checks bypassed"
            );
            return Ok(true);
        }

        let fingerprint = self.crypto.fingerprint(card.snapshot().as_bytes());
        let verifiers = self.verifiers.read();

        for (verifier_id, key) in verifiers.iter() {
            let Some(signature) = card.signature(verifier_id) else {
                tracing::warn!(card_id = card.id(), verifier_id = %verifier_id, "card lacks verifier signature");
                return Ok(false);
            };
            let valid = self
                .crypto
                .verify(fingerprint.as_bytes(), signature, key)
                .map_err(|e| {
                    CardError::Verification(format!("signature from {verifier_id}: {e}"))
                })?;
            if !valid {
                tracing::warn!(card_id = card.id(), verifier_id = %verifier_id, "verifier signature does not match");
                return Ok(false);
            }
        }

        tracing::debug!(card_id = card.id(), verifiers = verifiers.len(), "card validated");
        Ok(true)
    }
}

impl<C: Crypto> std::fmt::Debug for CardValidator<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardValidator")
            .field("legacy_version", &self.legacy_version)
            .field("service_id", &self.service_id)
            .field("verifiers", &self.verifier_ids())
            .finish_non_exhaustive()
    }
}
