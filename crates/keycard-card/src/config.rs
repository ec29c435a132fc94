//! # Validator Configuration
//!
//! Seeds a [`CardValidator`](crate::CardValidator) with the service verifier,
//! any additional trusted verifiers, and the legacy version string.
//!
//! ```yaml
//! legacy_version: "3.0"
//! service:
//!   id: card-service
//!   public_key: "<base64 raw Ed25519 key>"
//! verifiers:
//!   - id: authority
//!     public_key: "<base64>"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use keycard_core::base64_decode;

use crate::error::CardError;

/// Card version whose cards skip signature checks.
pub const LEGACY_CARD_VERSION: &str = "3.0";

fn default_legacy_version() -> String {
    LEGACY_CARD_VERSION.to_string()
}

/// A trusted verifier entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VerifierConfig {
    /// Signer id the verifier's signature is stored under.
    pub id: String,
    /// Base64 of the exported public key.
    pub public_key: String,
}

impl VerifierConfig {
    /// Decode the base64 public key.
    pub fn public_key_bytes(&self) -> Result<Vec<u8>, CardError> {
        base64_decode(&self.public_key)
            .map_err(|e| CardError::Config(format!("verifier {}: public_key: {e}", self.id)))
    }
}

/// Trust configuration for a card validator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ValidatorConfig {
    /// Cards with this version are accepted without signature checks.
    #[serde(default = "default_legacy_version")]
    pub legacy_version: String,
    /// The card service's own verifier. Optional when parsing, required by
    /// [`CardValidator::from_config`](crate::CardValidator::from_config).
    #[serde(default)]
    pub service: Option<VerifierConfig>,
    /// Further verifiers whose signatures every card must carry.
    #[serde(default)]
    pub verifiers: Vec<VerifierConfig>,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            legacy_version: default_legacy_version(),
            service: None,
            verifiers: Vec::new(),
        }
    }
}

impl ValidatorConfig {
    /// Parse YAML text.
    pub fn from_yaml_str(text: &str) -> Result<Self, CardError> {
        serde_yaml::from_str(text).map_err(|e| CardError::Config(format!("invalid YAML: {e}")))
    }

    /// Parse JSON text.
    pub fn from_json_str(text: &str) -> Result<Self, CardError> {
        serde_json::from_str(text).map_err(|e| CardError::Config(format!("invalid JSON: {e}")))
    }

    /// Load from a file. `.json` files are parsed as JSON, everything else
    /// as YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CardError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| CardError::Config(format!("cannot read {}: {e}", path.display())))?;
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        let config = if is_json {
            Self::from_json_str(&text)?
        } else {
            Self::from_yaml_str(&text)?
        };
        tracing::debug!(
            path = %path.display(),
            verifiers = config.all_verifiers().count(),
            "validator config loaded"
        );
        Ok(config)
    }

    /// Service verifier first, then the additional verifiers.
    pub fn all_verifiers(&self) -> impl Iterator<Item = &VerifierConfig> {
        self.service.iter().chain(self.verifiers.iter())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const KEY_B64: &str = "11qYAYKxCrfVS/7TyWQHOg7hcvPapiMlrwIaaPcHURo=";

    #[test]
    fn defaults() {
        let config = ValidatorConfig::default();
        assert_eq!(config.legacy_version, "3.0");
        assert!(config.service.is_none());
        assert_eq!(config.all_verifiers().count(), 0);
    }

    #[test]
    fn yaml_with_service_and_verifiers() {
        let yaml = format!(
            "service:\n  id: card-service\n  public_key: \"{KEY_B64}\"\nverifiers:\n  - id: authority\n    public_key: \"{KEY_B64}\"\n"
        );
        let config = ValidatorConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(config.legacy_version, "3.0");
        let ids: Vec<&str> = config.all_verifiers().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, ["card-service", "authority"]);
        assert_eq!(config.verifiers[0].public_key_bytes().unwrap().len(), 32);
    }

    #[test]
    fn json_overrides_legacy_version() {
        let config =
            ValidatorConfig::from_json_str(r#"{"legacy_version":"2.0","verifiers":[]}"#).unwrap();
        assert_eq!(config.legacy_version, "2.0");
    }

    #[test]
    fn unknown_field_is_config_error() {
        let err = ValidatorConfig::from_yaml_str("quorum: 2\n").unwrap_err();
        assert!(matches!(err, CardError::Config(_)));
    }

    #[test]
    fn bad_key_base64_is_config_error() {
        let v = VerifierConfig {
            id: "x".to_string(),
            public_key: "not base64!".to_string(),
        };
        assert!(matches!(v.public_key_bytes(), Err(CardError::Config(_))));
    }

    #[test]
    fn load_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let yaml_path = dir.path().join("validator.yaml");
        let mut f = std::fs::File::create(&yaml_path).unwrap();
        writeln!(f, "legacy_version: \"1.0\"").unwrap();
        assert_eq!(ValidatorConfig::load(&yaml_path).unwrap().legacy_version, "1.0");

        let json_path = dir.path().join("validator.json");
        std::fs::write(&json_path, r#"{"legacy_version":"5.0"}"#).unwrap();
        assert_eq!(ValidatorConfig::load(&json_path).unwrap().legacy_version, "5.0");
    }

    #[test]
    fn load_missing_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = ValidatorConfig::load(dir.path().join("absent.yaml")).unwrap_err();
        assert!(matches!(err, CardError::Config(msg) if msg.contains("cannot read")));
    }
}
