use thiserror::Error;

/// Error type for blacklist driver construction.
#[derive(Debug, Clone, Error)]
pub enum BlacklistError {
    #[error("Unknown blacklist driver: {0}")]
    UnknownDriver(String),

    #[error("Invalid parameters for blacklist driver {driver}: {reason}")]
    InvalidParams { driver: String, reason: String },
}
