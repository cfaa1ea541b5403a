use error_common::{Categorized, ErrorCategory, ErrorCode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration source error: {0}")]
    Source(#[from] config::ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl Categorized for ConfigError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::Source(_) | Self::Validation(_) => ErrorCategory::Validation,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    fn code(&self) -> ErrorCode {
        match self {
            Self::Source(_) | Self::Validation(_) => ErrorCode::INVALID_CONFIGURATION,
            Self::Internal(_) => ErrorCode::INTERNAL,
        }
    }
}
