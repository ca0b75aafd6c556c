//! Configuration error types.

use thiserror::Error;

/// Result type alias for configuration loading and validation.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while loading or validating autoscaler configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),

    #[error("invalid autoscale rule set #{index}: {reason}")]
    InvalidRule { index: usize, reason: String },
}

impl ConfigError {
    pub fn invalid_rule(index: usize, reason: impl Into<String>) -> Self {
        Self::InvalidRule {
            index,
            reason: reason.into(),
        }
    }
}
