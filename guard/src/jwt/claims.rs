use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use super::options::OneOrMany;

/// Claim set carried by every token this crate signs.
///
/// Caller data lives under `payload`; the remaining fields are the standard
/// RFC 7519 claims, all optional.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Caller-supplied data
    #[serde(default)]
    pub payload: Value,

    /// Expiration time (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,

    /// Issued at (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,

    /// Not before (Unix timestamp)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Issuer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,

    /// Audience
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aud: Option<OneOrMany>,

    /// Subject
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,

    /// JWT ID (unique token identifier)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    /// Create claims carrying only a payload.
    pub fn new(payload: Value) -> Self {
        Self {
            payload,
            exp: None,
            iat: None,
            nbf: None,
            iss: None,
            aud: None,
            sub: None,
            jti: None,
        }
    }

    /// True when the payload carries no data (`null`, `{}`, `[]`, `""`).
    pub fn has_empty_payload(&self) -> bool {
        match &self.payload {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            Value::Array(items) => items.is_empty(),
            Value::String(text) => text.is_empty(),
            Value::Bool(_) | Value::Number(_) => false,
        }
    }
}
