use serde::Deserialize;
use serde_json::Value;

use crate::crypter::EnvelopeAlgorithm;
use crate::errors::ResponseTable;
use crate::jwt::TokenOptions;

/// Typed snapshot of the configuration tree.
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub jwt: JwtSettings,
    pub encryption: EncryptionSettings,
    pub localization: LocalizationSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtSettings {
    pub secret: Option<String>,
    pub options: TokenOptions,
    pub use_encrypt: bool,
    pub use_blacklist: bool,
    pub extract: ExtractSettings,
    pub middleware: MiddlewareSettings,
    pub refresh: RefreshSettings,
    pub blacklist: BlacklistSettings,
}

/// Where the default extractor finds a token.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractSettings {
    pub header: String,
    /// Authorization scheme expected before the token; `None` takes the raw header value.
    pub scheme: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MiddlewareSettings {
    pub token_payload_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshSettings {
    /// Falls back to `jwt.secret` when unset.
    pub secret: Option<String>,
    pub options: TokenOptions,
    pub extract: ExtractSettings,
    pub response_header: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlacklistSettings {
    pub driver_name: String,
    #[serde(default)]
    pub driver_params: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EncryptionSettings {
    pub algorithm: EnvelopeAlgorithm,
    pub secret: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LocalizationSettings {
    pub responses: ResponseTable,
}
