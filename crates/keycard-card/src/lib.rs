//! # keycard-card: Signed Identity Card Requests
//!
//! Implements the signed-request protocol for identity cards:
//!
//! - [`codec`]: canonical snapshot encoding of request content and
//!   schema-directed decoding.
//! - [`request`]: the signable request state machine, signature
//!   accumulation, and envelope export/import.
//! - [`signer`]: self, authority, and third-party signatures over the
//!   snapshot fingerprint.
//! - [`card`]: the read-only card model and the service response it is
//!   built from.
//! - [`validator`]: trust validation against a verifier registry, with the
//!   legacy version bypass.
//! - [`template`]: a builder for create-card requests.
//! - [`config`]: validator configuration loaded from YAML or JSON.
//!
//! ## Data Flow
//!
//! ```text
//! CardContent ─encode─▶ Snapshot ─fingerprint─▶ Fingerprint ─sign─▶ signatures
//!                          │                                            │
//!                          └──────────── export / import ───────────────┘
//!                                              │
//!                                   SignedResponse ─▶ Card ─▶ CardValidator
//! ```
//!
//! ## Crate Policy
//!
//! - No global state: the codec, crypto capability, and validator are
//!   values passed to whoever needs them.
//! - No `.unwrap()` outside tests.

pub mod card;
pub mod codec;
pub mod config;
pub mod content;
pub mod error;
pub mod request;
pub mod signer;
pub mod template;
pub mod validator;

pub use card::{Card, CardParts, ResponseMeta, SignedResponse};
pub use codec::{Snapshot, SnapshotCodec, DEFAULT_MAX_SNAPSHOT_LEN};
pub use config::{ValidatorConfig, VerifierConfig, LEGACY_CARD_VERSION};
pub use content::{
    CardContent, CardScope, CreateCardContent, DeviceInfo, Identity, RequestKind,
    RevocationReason, RevokeCardContent,
};
pub use error::CardError;
pub use request::{EnvelopeMeta, RequestEnvelope, RequestState, SignableRequest, SignatureSlot};
pub use signer::{AppliedSignature, RequestSigner};
pub use template::{CardTemplate, CardTemplateBuilder, PublicKeySource};
pub use validator::CardValidator;
