use jsonwebtoken::errors::ErrorKind;
use thiserror::Error;

use super::options::TokenOptions;

/// Error type for token codec operations.
///
/// Messages follow a `summary. key: value` layout so the error translator can
/// lift the detail into response templates.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    #[error("jwt expired")]
    Expired,

    #[error("jwt not active")]
    NotYetValid,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("jwt malformed. reason: {0}")]
    Malformed(String),

    #[error("jwt {claim} invalid. expected: {expected}")]
    ClaimMismatch { claim: String, expected: String },

    #[error("decryption failed. reason: {0}")]
    Decryption(String),

    #[error("encryption failed. reason: {0}")]
    Encryption(String),

    #[error("signing failed. reason: {0}")]
    Encoding(String),

    #[error("invalid key. reason: {0}")]
    Key(String),
}

impl CodecError {
    /// Classify a verification failure from the signing library.
    pub(crate) fn from_verification(
        err: jsonwebtoken::errors::Error,
        options: &TokenOptions,
    ) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => CodecError::Expired,
            ErrorKind::ImmatureSignature => CodecError::NotYetValid,
            ErrorKind::InvalidSignature => CodecError::InvalidSignature,
            ErrorKind::InvalidAudience => CodecError::mismatch(
                "audience",
                options.audience.as_ref().map(|a| a.joined()),
            ),
            ErrorKind::InvalidIssuer => {
                CodecError::mismatch("issuer", options.issuer.as_ref().map(|i| i.joined()))
            }
            ErrorKind::InvalidSubject => CodecError::mismatch("subject", options.subject.clone()),
            ErrorKind::InvalidAlgorithm => CodecError::mismatch(
                "algorithm",
                Some(format!("{:?}", options.algorithm_or_default())),
            ),
            ErrorKind::MissingRequiredClaim(claim) => {
                CodecError::Malformed(format!("missing required claim {}", claim))
            }
            ErrorKind::InvalidKeyFormat | ErrorKind::InvalidEcdsaKey | ErrorKind::InvalidRsaKey(_) => {
                CodecError::Key(err.to_string())
            }
            _ => CodecError::Malformed(err.to_string()),
        }
    }

    fn mismatch(claim: &str, expected: Option<String>) -> Self {
        CodecError::ClaimMismatch {
            claim: claim.to_string(),
            expected: expected.unwrap_or_else(|| "none".to_string()),
        }
    }

    pub fn is_expired(&self) -> bool {
        matches!(self, CodecError::Expired)
    }
}
