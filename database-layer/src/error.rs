use error_common::{Categorized, ErrorCategory, ErrorCode};
use procedure_matcher::MatcherError;
use thiserror::Error;
use workflow_engine::DialogError;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Concurrent update of {0}")]
    Conflict(String),

    #[error("Slot {slot_id} is no longer available")]
    SlotTaken { slot_id: String },

    #[error("Unexpected stored value: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;

impl Categorized for DatabaseError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::InternalError(_) => ErrorCategory::Internal,
            _ => ErrorCategory::Collaborator,
        }
    }

    fn code(&self) -> ErrorCode {
        match self {
            Self::SlotTaken { .. } => ErrorCode::SLOT_TAKEN,
            Self::InternalError(_) => ErrorCode::INTERNAL,
            _ => ErrorCode::STORE_UNAVAILABLE,
        }
    }
}

impl From<DatabaseError> for DialogError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::SlotTaken { slot_id } => DialogError::SlotTaken { slot_id },
            other => DialogError::Store(other.to_string()),
        }
    }
}

impl From<DatabaseError> for MatcherError {
    fn from(err: DatabaseError) -> Self {
        MatcherError::Catalog(err.to_string())
    }
}
