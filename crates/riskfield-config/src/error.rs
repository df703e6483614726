use thiserror::Error;

/// Errors raised while loading or validating a domain configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(String),

    #[error("failed to read configuration: {0}")]
    Io(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}
