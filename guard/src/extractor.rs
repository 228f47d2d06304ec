use crate::config::ExtractSettings;
use crate::errors::AuthError;
use crate::errors::FaultCode;
use crate::host::RequestHeaders;

/// Pulls a raw token string out of a request.
///
/// Implemented for [`HeaderExtractor`] and for any
/// `Fn(&dyn RequestHeaders) -> Result<String, AuthError>` closure, so hosts
/// can plug in cookie or query-string extraction. Faults raised by a custom
/// extractor that are not [`AuthError::Fault`] are forwarded to the host.
pub trait TokenExtractor: Send + Sync {
    fn extract(&self, request: &dyn RequestHeaders) -> Result<String, AuthError>;
}

impl<F> TokenExtractor for F
where
    F: Fn(&dyn RequestHeaders) -> Result<String, AuthError> + Send + Sync,
{
    fn extract(&self, request: &dyn RequestHeaders) -> Result<String, AuthError> {
        self(request)
    }
}

/// Reads `<scheme> <token>` (or the bare token when no scheme is set) from a header.
#[derive(Debug, Clone)]
pub struct HeaderExtractor {
    header: String,
    scheme: Option<String>,
}

impl HeaderExtractor {
    pub fn new(header: impl ToString, scheme: Option<&str>) -> Self {
        Self {
            header: header.to_string(),
            scheme: scheme.map(str::to_string),
        }
    }

    /// `Authorization: Bearer <token>`.
    pub fn bearer() -> Self {
        Self::new("authorization", Some("Bearer"))
    }

    pub fn header(&self) -> &str {
        &self.header
    }
}

impl From<&ExtractSettings> for HeaderExtractor {
    fn from(settings: &ExtractSettings) -> Self {
        Self::new(&settings.header, settings.scheme.as_deref())
    }
}

impl TokenExtractor for HeaderExtractor {
    /// # Errors
    /// * `MISSING_TOKEN` - Header absent, or empty when no scheme is expected
    /// * `INVALID_TOKEN` - Value is not exactly `<scheme> <token>`, or the token is empty
    /// * `INVALID_TOKEN_SCHEMA` - Scheme differs from the configured one
    fn extract(&self, request: &dyn RequestHeaders) -> Result<String, AuthError> {
        let value = request
            .header(&self.header)
            .ok_or_else(|| AuthError::fault(FaultCode::MissingToken))?;

        let Some(expected_scheme) = &self.scheme else {
            if value.is_empty() {
                return Err(AuthError::fault(FaultCode::MissingToken));
            }
            return Ok(value.to_string());
        };

        let parts: Vec<&str> = value.split(' ').collect();
        let [scheme, token] = parts.as_slice() else {
            return Err(AuthError::fault(FaultCode::InvalidToken));
        };

        if scheme != expected_scheme {
            return Err(AuthError::fault(FaultCode::InvalidTokenSchema));
        }
        if token.is_empty() {
            return Err(AuthError::fault(FaultCode::InvalidToken));
        }

        Ok(token.to_string())
    }
}
