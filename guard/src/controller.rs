use std::sync::Arc;

use jsonwebtoken::Algorithm;
use serde::Serialize;
use serde_json::Value;

use crate::blacklist::BlacklistDriver;
use crate::blacklist::DriverRegistry;
use crate::config::ConfigError;
use crate::config::ConfigStore;
use crate::crypter::Envelope;
use crate::errors::AuthError;
use crate::errors::ErrorTranslator;
use crate::errors::FaultCode;
use crate::extractor::HeaderExtractor;
use crate::extractor::TokenExtractor;
use crate::host::Continuation;
use crate::host::RequestContext;
use crate::host::RequestHeaders;
use crate::host::ResponseSink;
use crate::jwt::Claims;
use crate::jwt::TokenCodec;
use crate::jwt::TokenOptions;

/// Request-facing flow run by [`AuthController::handle`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Authenticate,
    Refresh,
    SignOut,
}

/// Verified access token of the current request.
#[derive(Debug, Clone)]
pub struct Authenticated {
    pub token: String,
    pub claims: Claims,
}

/// Outcome of the refresh flow.
#[derive(Debug, Clone)]
pub struct Refreshed {
    pub payload: Value,
    /// New access token, present only when the presented one had expired.
    pub rotated_token: Option<String>,
}

/// Access and refresh tokens minted together at login.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Authentication coordinator combining token verification, revocation and rotation.
///
/// Built once from a [`ConfigStore`] and shared behind an `Arc` by every
/// request handler.
pub struct AuthController {
    access: TokenCodec,
    refresh: TokenCodec,
    blacklist: Option<Arc<dyn BlacklistDriver>>,
    access_extractor: Box<dyn TokenExtractor>,
    refresh_extractor: Box<dyn TokenExtractor>,
    translator: ErrorTranslator,
    payload_key: String,
    refresh_header: String,
}

impl AuthController {
    pub fn builder(store: &ConfigStore) -> AuthControllerBuilder<'_> {
        AuthControllerBuilder::new(store)
    }

    /// Request context key the verified payload is attached under.
    pub fn payload_key(&self) -> &str {
        &self.payload_key
    }

    /// Response header a rotated access token is written to.
    pub fn refresh_header(&self) -> &str {
        &self.refresh_header
    }

    /// Mint an access and refresh token pair for `payload`.
    ///
    /// # Errors
    /// * `Codec` - Signing or envelope encryption failed
    pub fn issue<T: Serialize + ?Sized>(&self, payload: &T) -> Result<TokenPair, AuthError> {
        let options = TokenOptions::default();

        Ok(TokenPair {
            access_token: self.access.sign(payload, &options)?,
            refresh_token: self.refresh.sign(payload, &options)?,
        })
    }

    /// Extract and verify the request's access token.
    ///
    /// # Errors
    /// * `MISSING_TOKEN` / `INVALID_TOKEN_SCHEMA` / `INVALID_TOKEN` - Extraction failed
    /// * `CORRUPTED_TOKEN` - Token verified but carries an empty payload
    /// * `TOKEN_BLACKLISTED` - Token has been signed out
    /// * `Codec` - Verification failed (expired, bad signature, ...)
    pub fn authenticate(&self, request: &dyn RequestHeaders) -> Result<Authenticated, AuthError> {
        let token = self.access_extractor.extract(request)?;
        tracing::debug!("Access token extracted");

        let claims = self.verify_access(&token)?;
        tracing::debug!(jti = ?claims.jti, "Access token authenticated");

        Ok(Authenticated { token, claims })
    }

    /// Authenticate, rotating an expired access token with the refresh token.
    ///
    /// A still-valid access token passes through without rotation. Only an
    /// expired one triggers the refresh path; every other failure propagates.
    ///
    /// # Errors
    /// * `CORRUPTED_TOKEN` - Access and refresh payloads differ, or the refresh payload is empty
    /// * `TOKEN_BLACKLISTED` - Refresh token has been signed out
    /// * Any error of [`AuthController::authenticate`] other than expiry
    pub fn refresh(&self, request: &dyn RequestHeaders) -> Result<Refreshed, AuthError> {
        let token = self.access_extractor.extract(request)?;

        match self.verify_access(&token) {
            Ok(claims) => {
                tracing::debug!("Access token still valid, rotation skipped");
                return Ok(Refreshed {
                    payload: claims.payload,
                    rotated_token: None,
                });
            }
            Err(err) if !err.is_expired() => return Err(err),
            Err(_) => tracing::debug!("Access token expired, trying refresh token"),
        }

        let refresh_token = self.refresh_extractor.extract(request)?;
        tracing::debug!("Refresh token extracted");

        let refresh_claims = self.refresh.verify(&refresh_token, &TokenOptions::default())?;
        if refresh_claims.has_empty_payload() {
            return Err(AuthError::fault(FaultCode::CorruptedToken));
        }
        self.ensure_not_blacklisted(&refresh_token)?;
        tracing::debug!("Refresh token verified");

        // The expired access token's payload is read without signature checks.
        // Rotation is authorized only by its equality with the verified refresh payload.
        let expired_claims = self.access.decode(&token)?;
        if expired_claims.payload != refresh_claims.payload {
            tracing::warn!("Access and refresh token payloads differ");
            return Err(AuthError::fault(FaultCode::CorruptedToken));
        }

        let rotated = self
            .access
            .sign(&refresh_claims.payload, &TokenOptions::default())?;
        tracing::info!(jti = ?refresh_claims.jti, "Access token rotated");

        Ok(Refreshed {
            payload: refresh_claims.payload,
            rotated_token: Some(rotated),
        })
    }

    /// Authenticate and revoke the access token until its own expiry.
    ///
    /// With the blacklist disabled the token is authenticated but not revoked.
    ///
    /// # Errors
    /// * `CORRUPTED_TOKEN` - Token has no `exp` claim to bound its revocation
    /// * Any error of [`AuthController::authenticate`]
    pub fn sign_out(&self, request: &dyn RequestHeaders) -> Result<Authenticated, AuthError> {
        let authenticated = self.authenticate(request)?;

        let Some(blacklist) = &self.blacklist else {
            tracing::info!("Blacklist disabled, sign-out leaves token valid");
            return Ok(authenticated);
        };

        let expires_at = authenticated
            .claims
            .exp
            .ok_or_else(|| AuthError::fault(FaultCode::CorruptedToken))?;
        blacklist.set(&authenticated.token, expires_at);
        tracing::info!(jti = ?authenticated.claims.jti, expires_at, "Token signed out");

        Ok(authenticated)
    }

    /// Run `flow` against host request and response collaborators.
    ///
    /// On success the payload is attached to `request` (and a rotated token
    /// written to `response`); translatable faults are rendered to
    /// `response`; anything else is handed back as `Continuation::Forward`.
    pub fn handle<Req, Res>(&self, flow: Flow, request: &mut Req, response: &mut Res) -> Continuation
    where
        Req: RequestContext,
        Res: ResponseSink + ?Sized,
    {
        let outcome = match flow {
            Flow::Authenticate => self
                .authenticate(&*request)
                .map(|authenticated| (authenticated.claims.payload, None)),
            Flow::Refresh => self
                .refresh(&*request)
                .map(|refreshed| (refreshed.payload, refreshed.rotated_token)),
            Flow::SignOut => self
                .sign_out(&*request)
                .map(|authenticated| (authenticated.claims.payload, None)),
        };

        match outcome {
            Ok((payload, rotated_token)) => {
                if let Some(token) = rotated_token {
                    response.set_header(&self.refresh_header, &token);
                }
                request.attach(&self.payload_key, payload);
                Continuation::Next
            }
            Err(err) => self.translator.respond(err, &*request, response),
        }
    }

    fn verify_access(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.access.verify(token, &TokenOptions::default())?;

        if claims.has_empty_payload() {
            return Err(AuthError::fault(FaultCode::CorruptedToken));
        }
        self.ensure_not_blacklisted(token)?;

        Ok(claims)
    }

    fn ensure_not_blacklisted(&self, token: &str) -> Result<(), AuthError> {
        match &self.blacklist {
            Some(blacklist) if blacklist.is_exists(token) => {
                tracing::warn!("Blacklisted token presented");
                Err(AuthError::fault(FaultCode::TokenBlacklisted))
            }
            _ => Ok(()),
        }
    }
}

/// Builder wiring an [`AuthController`] from configuration plus host-supplied parts.
pub struct AuthControllerBuilder<'a> {
    store: &'a ConfigStore,
    access_extractor: Option<Box<dyn TokenExtractor>>,
    refresh_extractor: Option<Box<dyn TokenExtractor>>,
    registry: Option<DriverRegistry>,
    blacklist_driver: Option<Arc<dyn BlacklistDriver>>,
}

impl<'a> AuthControllerBuilder<'a> {
    fn new(store: &'a ConfigStore) -> Self {
        Self {
            store,
            access_extractor: None,
            refresh_extractor: None,
            registry: None,
            blacklist_driver: None,
        }
    }

    /// Replace the header extractor configured under `jwt.extract`.
    pub fn access_extractor<E: TokenExtractor + 'static>(mut self, extractor: E) -> Self {
        self.access_extractor = Some(Box::new(extractor));
        self
    }

    /// Replace the header extractor configured under `jwt.refresh.extract`.
    pub fn refresh_extractor<E: TokenExtractor + 'static>(mut self, extractor: E) -> Self {
        self.refresh_extractor = Some(Box::new(extractor));
        self
    }

    /// Registry used to resolve `jwt.blacklist.driver_name`.
    pub fn registry(mut self, registry: DriverRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Use `driver` directly instead of resolving one by name.
    pub fn blacklist_driver(mut self, driver: Arc<dyn BlacklistDriver>) -> Self {
        self.blacklist_driver = Some(driver);
        self
    }

    /// Build the controller.
    ///
    /// # Errors
    /// * `Config` - Secret missing, non-HMAC algorithm, bad envelope key, or malformed tree
    /// * `Blacklist` - Driver unknown or its parameters rejected
    pub fn build(self) -> Result<AuthController, AuthError> {
        if !self.store.is_initialized() {
            tracing::warn!("Building controller from built-in defaults, configuration was never initialized");
        }
        let settings = self.store.settings()?;
        let jwt = &settings.jwt;

        let secret = non_empty(jwt.secret.as_deref())
            .ok_or_else(|| ConfigError::Missing("jwt.secret".to_string()))?;
        let refresh_secret = non_empty(jwt.refresh.secret.as_deref()).unwrap_or(secret);

        ensure_hmac("jwt.options.algorithm", &jwt.options)?;
        ensure_hmac("jwt.refresh.options.algorithm", &jwt.refresh.options)?;

        let mut access = TokenCodec::new(secret.as_bytes(), jwt.options.clone());
        let mut refresh = TokenCodec::new(refresh_secret.as_bytes(), jwt.refresh.options.clone());

        if jwt.use_encrypt {
            let key = non_empty(settings.encryption.secret.as_deref())
                .ok_or_else(|| ConfigError::Missing("encryption.secret".to_string()))?;
            let envelope = Envelope::new(settings.encryption.algorithm, key.as_bytes())
                .map_err(|e| ConfigError::invalid("encryption.secret", e))?;

            access = access.with_envelope(envelope.clone());
            refresh = refresh.with_envelope(envelope);
        }

        let blacklist = if jwt.use_blacklist {
            let driver = match self.blacklist_driver {
                Some(driver) => driver,
                None => self
                    .registry
                    .unwrap_or_default()
                    .create(&jwt.blacklist.driver_name, &jwt.blacklist.driver_params)?,
            };
            Some(driver)
        } else {
            None
        };

        let access_extractor = self
            .access_extractor
            .unwrap_or_else(|| Box::new(HeaderExtractor::from(&jwt.extract)));
        let refresh_extractor = self
            .refresh_extractor
            .unwrap_or_else(|| Box::new(HeaderExtractor::from(&jwt.refresh.extract)));

        tracing::info!(
            encrypted = jwt.use_encrypt,
            blacklist = jwt.use_blacklist,
            "Auth controller ready"
        );

        Ok(AuthController {
            access,
            refresh,
            blacklist,
            access_extractor,
            refresh_extractor,
            translator: ErrorTranslator::new(settings.localization.responses.clone()),
            payload_key: jwt.middleware.token_payload_key.clone(),
            refresh_header: jwt.refresh.response_header.clone(),
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

fn ensure_hmac(path: &str, options: &TokenOptions) -> Result<(), ConfigError> {
    match options.algorithm_or_default() {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(()),
        other => Err(ConfigError::invalid(
            path,
            format!("{:?} is not an HMAC algorithm", other),
        )),
    }
}
