use config_engine::ConfigError;
use database_layer::DatabaseError;
use error_common::{Categorized, ErrorCategory, ErrorCode};
use insurance_service::InsuranceError;
use logger_redacted::LoggerError;
use procedure_matcher::MatcherError;
use thiserror::Error;
use workflow_engine::DialogError;

#[derive(Error, Debug)]
pub enum AssistantError {
    #[error(transparent)]
    Dialog(#[from] DialogError),

    #[error(transparent)]
    Insurance(#[from] InsuranceError),

    #[error(transparent)]
    Matcher(#[from] MatcherError),

    #[error(transparent)]
    Database(#[from] DatabaseError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Logging setup failed: {0}")]
    Logger(#[from] LoggerError),

    #[error("Startup failed: {0}")]
    Setup(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type AssistantResult<T> = Result<T, AssistantError>;

impl Categorized for AssistantError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::Dialog(err) => err.category(),
            Self::Insurance(err) => err.category(),
            Self::Matcher(err) => err.category(),
            Self::Database(err) => err.category(),
            Self::Config(err) => err.category(),
            Self::Logger(_) | Self::Setup(_) => ErrorCategory::Validation,
            Self::Http(_) => ErrorCategory::Collaborator,
            Self::Io(_) | Self::Internal(_) => ErrorCategory::Internal,
        }
    }

    fn code(&self) -> ErrorCode {
        match self {
            Self::Dialog(err) => err.code(),
            Self::Insurance(err) => err.code(),
            Self::Matcher(err) => err.code(),
            Self::Database(err) => err.code(),
            Self::Config(err) => err.code(),
            Self::Logger(_) | Self::Setup(_) => ErrorCode::INVALID_CONFIGURATION,
            Self::Http(_) => ErrorCode::RESPONDER_FAILED,
            Self::Io(_) | Self::Internal(_) => ErrorCode::INTERNAL,
        }
    }
}
