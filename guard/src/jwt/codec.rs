use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::oneshot;
use uuid::Uuid;

use super::claims::Claims;
use super::errors::CodecError;
use super::options::TokenOptions;
use crate::crypter::Envelope;

/// Signs, verifies and decodes tokens for one token namespace.
///
/// Holds the HMAC secret, the namespace's default options and, when
/// encryption is enabled, the envelope wrapped around every signed token.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    defaults: TokenOptions,
    envelope: Option<Envelope>,
}

impl TokenCodec {
    /// Create a codec with a secret key and default options.
    ///
    /// # Arguments
    /// * `secret` - HMAC secret for signing tokens
    /// * `defaults` - Options applied to every call unless overridden
    pub fn new(secret: &[u8], defaults: TokenOptions) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            defaults,
            envelope: None,
        }
    }

    /// Wrap every token produced (and expect every token consumed) in `envelope`.
    pub fn with_envelope(mut self, envelope: Envelope) -> Self {
        self.envelope = Some(envelope);
        self
    }

    /// Sign `payload` into a token.
    ///
    /// # Arguments
    /// * `payload` - Caller data, stored under the `payload` claim
    /// * `options` - Per-call options layered over the codec defaults
    ///
    /// # Returns
    /// Compact token string, enveloped when encryption is enabled
    ///
    /// # Errors
    /// * `Encoding` - Payload serialization or signing failed
    /// * `Encryption` - Envelope encryption failed
    pub fn sign<T: Serialize + ?Sized>(
        &self,
        payload: &T,
        options: &TokenOptions,
    ) -> Result<String, CodecError> {
        let options = self.defaults.merged(options);
        let payload =
            serde_json::to_value(payload).map_err(|e| CodecError::Encoding(e.to_string()))?;

        let now = Utc::now().timestamp();
        let claims = Claims {
            payload,
            exp: options
                .expires_in
                .map(|lifetime| now.saturating_add(lifetime.as_secs())),
            iat: (!options.no_timestamp.unwrap_or(false)).then_some(now),
            nbf: options
                .not_before
                .map(|lifetime| now.saturating_add(lifetime.as_secs())),
            iss: options
                .issuer
                .as_ref()
                .and_then(|issuer| issuer.first())
                .map(str::to_string),
            aud: options.audience.clone(),
            sub: options.subject.clone(),
            jti: Some(
                options
                    .jwtid
                    .clone()
                    .unwrap_or_else(|| Uuid::new_v4().to_string()),
            ),
        };

        let mut header = Header::new(options.algorithm_or_default());
        header.kid = options.keyid.clone();

        let token = encode(&header, &claims, &self.encoding_key)
            .map_err(|e| CodecError::Encoding(e.to_string()))?;

        match &self.envelope {
            Some(envelope) => envelope.seal(&token),
            None => Ok(token),
        }
    }

    /// Sign and also deliver the result on `notify`.
    ///
    /// The returned value is identical to [`TokenCodec::sign`]; a dropped
    /// receiver is ignored.
    pub fn sign_notify<T: Serialize + ?Sized>(
        &self,
        payload: &T,
        options: &TokenOptions,
        notify: oneshot::Sender<Result<String, CodecError>>,
    ) -> Result<String, CodecError> {
        let result = self.sign(payload, options);
        if notify.send(result.clone()).is_err() {
            tracing::debug!("Sign completion receiver dropped");
        }
        result
    }

    /// Verify a token and return its full claim set.
    ///
    /// # Arguments
    /// * `token` - Token string, enveloped when encryption is enabled
    /// * `options` - Per-call options layered over the codec defaults
    ///
    /// # Errors
    /// * `Decryption` - Envelope could not be opened
    /// * `Expired` - The `exp` claim has passed
    /// * `NotYetValid` - The `nbf` claim is in the future
    /// * `InvalidSignature` - Signature does not match
    /// * `ClaimMismatch` - Audience, issuer, subject or algorithm rejected
    /// * `Malformed` - Token could not be parsed
    pub fn verify(&self, token: &str, options: &TokenOptions) -> Result<Claims, CodecError> {
        let options = self.defaults.merged(options);
        let compact = self.open(token)?;

        let token_data = decode::<Claims>(&compact, &self.decoding_key, &validation_for(&options))
            .map_err(|e| CodecError::from_verification(e, &options))?;

        Ok(token_data.claims)
    }

    /// Verify a token and return only its `payload` claim.
    pub fn verify_payload(&self, token: &str, options: &TokenOptions) -> Result<Value, CodecError> {
        self.verify(token, options).map(|claims| claims.payload)
    }

    /// Verify and also deliver the result on `notify`.
    pub fn verify_notify(
        &self,
        token: &str,
        options: &TokenOptions,
        notify: oneshot::Sender<Result<Claims, CodecError>>,
    ) -> Result<Claims, CodecError> {
        let result = self.verify(token, options);
        if notify.send(result.clone()).is_err() {
            tracing::debug!("Verify completion receiver dropped");
        }
        result
    }

    /// Read claims without checking the signature or any time-based claim.
    ///
    /// # Security Warning
    /// The result is NOT proof of authenticity. It exists only so the refresh
    /// flow can recover the payload of an expired access token, and that
    /// payload must then be matched against a fully verified refresh token.
    ///
    /// # Errors
    /// * `Decryption` - Envelope could not be opened
    /// * `Malformed` - Token format is invalid
    pub fn decode(&self, token: &str) -> Result<Claims, CodecError> {
        let compact = self.open(token)?;

        let mut validation = Validation::new(self.defaults.algorithm_or_default());
        validation.insecure_disable_signature_validation();
        validation.required_spec_claims.clear();
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;

        let token_data = decode::<Claims>(&compact, &self.decoding_key, &validation)
            .map_err(|e| CodecError::Malformed(e.to_string()))?;

        Ok(token_data.claims)
    }

    fn open(&self, token: &str) -> Result<String, CodecError> {
        match &self.envelope {
            Some(envelope) => envelope.open(token),
            None => Ok(token.to_string()),
        }
    }
}

fn validation_for(options: &TokenOptions) -> Validation {
    let mut validation = Validation::new(options.algorithm_or_default());
    // Tokens without `exp` are allowed; expiry is enforced when present
    validation.required_spec_claims.clear();
    validation.leeway = options.leeway.unwrap_or(0);
    validation.validate_nbf = true;
    validation.validate_aud = false;

    if let Some(audience) = &options.audience {
        validation.set_audience(audience.as_slice());
        validation.validate_aud = true;
    }
    if let Some(issuer) = &options.issuer {
        validation.set_issuer(issuer.as_slice());
    }
    validation.sub = options.subject.clone();

    validation
}
