use thiserror::Error;

/// Error type for configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{path} is not an object (actual type {actual})")]
    NotAMapping { path: String, actual: &'static str },

    #[error("Configuration path is empty")]
    EmptyPath,

    #[error("Missing required setting: {0}")]
    Missing(String),

    #[error("Invalid setting {path}: {reason}")]
    Invalid { path: String, reason: String },

    #[error("Failed to load configuration sources: {0}")]
    Source(#[from] config::ConfigError),
}

impl ConfigError {
    pub(crate) fn invalid(path: impl ToString, reason: impl ToString) -> Self {
        Self::Invalid {
            path: path.to_string(),
            reason: reason.to_string(),
        }
    }
}
