use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Stable fault codes used to look up localized responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FaultCode {
    MissingToken,
    InvalidTokenSchema,
    InvalidToken,
    CorruptedToken,
    TokenExpired,
    TokenBlacklisted,
    UnknownError,
}

impl FaultCode {
    pub const ALL: [FaultCode; 7] = [
        FaultCode::MissingToken,
        FaultCode::InvalidTokenSchema,
        FaultCode::InvalidToken,
        FaultCode::CorruptedToken,
        FaultCode::TokenExpired,
        FaultCode::TokenBlacklisted,
        FaultCode::UnknownError,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            FaultCode::MissingToken => "MISSING_TOKEN",
            FaultCode::InvalidTokenSchema => "INVALID_TOKEN_SCHEMA",
            FaultCode::InvalidToken => "INVALID_TOKEN",
            FaultCode::CorruptedToken => "CORRUPTED_TOKEN",
            FaultCode::TokenExpired => "TOKEN_EXPIRED",
            FaultCode::TokenBlacklisted => "TOKEN_BLACKLISTED",
            FaultCode::UnknownError => "UNKNOWN_ERROR",
        }
    }

    /// Parse a code string; anything unrecognized becomes `UNKNOWN_ERROR`.
    pub fn from_code(code: &str) -> Self {
        FaultCode::ALL
            .into_iter()
            .find(|candidate| candidate.as_str() == code)
            .unwrap_or(FaultCode::UnknownError)
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed fault raised by this crate, as opposed to raw codec failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}")]
pub struct DomainFault {
    code: FaultCode,
    context: BTreeMap<String, String>,
}

impl DomainFault {
    pub fn new(code: FaultCode) -> Self {
        Self {
            code,
            context: BTreeMap::new(),
        }
    }

    /// Attach a value for `${key}` placeholders in the response template.
    pub fn with_context(mut self, key: impl ToString, value: impl ToString) -> Self {
        self.context.insert(key.to_string(), value.to_string());
        self
    }

    pub fn code(&self) -> FaultCode {
        self.code
    }

    pub fn context(&self) -> &BTreeMap<String, String> {
        &self.context
    }
}

impl From<FaultCode> for DomainFault {
    fn from(code: FaultCode) -> Self {
        DomainFault::new(code)
    }
}
