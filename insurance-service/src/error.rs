use error_common::{Categorized, ErrorCategory, ErrorCode};
use procedure_matcher::MatcherError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum InsuranceError {
    #[error("Document extraction error: {0}")]
    Extraction(String),

    #[error("Procedure matching error: {0}")]
    Matcher(#[from] MatcherError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type InsuranceResult<T> = Result<T, InsuranceError>;

impl Categorized for InsuranceError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::Extraction(_) => ErrorCategory::Collaborator,
            Self::Matcher(inner) => inner.category(),
            Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    fn code(&self) -> ErrorCode {
        match self {
            Self::Extraction(_) => ErrorCode::EXTRACTION_FAILED,
            Self::Matcher(inner) => inner.code(),
            Self::Internal(_) => ErrorCode::INTERNAL,
        }
    }
}
