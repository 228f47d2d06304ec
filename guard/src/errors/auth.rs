use thiserror::Error;

use super::fault::DomainFault;
use super::fault::FaultCode;
use crate::blacklist::BlacklistError;
use crate::config::ConfigError;
use crate::jwt::CodecError;

/// Top-level error for controller operations.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Authentication fault: {0}")]
    Fault(#[from] DomainFault),

    #[error("Token codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Blacklist error: {0}")]
    Blacklist(#[from] BlacklistError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Failure raised by host-supplied code such as a custom token extractor.
    #[error(transparent)]
    Host(#[from] anyhow::Error),
}

impl AuthError {
    pub fn fault(code: FaultCode) -> Self {
        AuthError::Fault(DomainFault::new(code))
    }

    /// True only for an expired token, the one fault the refresh flow recovers from.
    pub fn is_expired(&self) -> bool {
        matches!(self, AuthError::Codec(err) if err.is_expired())
    }

    /// Fault code for domain faults, `None` for everything else.
    pub fn code(&self) -> Option<FaultCode> {
        match self {
            AuthError::Fault(fault) => Some(fault.code()),
            _ => None,
        }
    }
}
