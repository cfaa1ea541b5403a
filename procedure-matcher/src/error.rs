use error_common::{Categorized, ErrorCategory, ErrorCode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MatcherError {
    #[error("Catalog unavailable: {0}")]
    Catalog(String),

    #[error("Invalid catalog data: {0}")]
    InvalidCatalog(#[from] serde_json::Error),

    #[error("Invalid matcher configuration: {0}")]
    InvalidConfig(String),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type MatcherResult<T> = Result<T, MatcherError>;

impl Categorized for MatcherError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidConfig(_) => ErrorCategory::Validation,
            Self::Catalog(_) | Self::InvalidCatalog(_) => ErrorCategory::Collaborator,
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    fn code(&self) -> ErrorCode {
        match self {
            Self::InvalidConfig(_) => ErrorCode::INVALID_CONFIGURATION,
            Self::Catalog(_) | Self::InvalidCatalog(_) => ErrorCode::CATALOG_UNAVAILABLE,
            Self::Internal(_) => ErrorCode::INTERNAL,
        }
    }
}
