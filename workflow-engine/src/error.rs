use error_common::{Categorized, ErrorCategory, ErrorCode};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DialogError {
    #[error("Transcript store error: {0}")]
    Store(String),

    #[error("Scheduling directory error: {0}")]
    Scheduling(String),

    #[error("Slot {slot_id} is no longer available")]
    SlotTaken { slot_id: String },

    #[error("Free-text responder error: {0}")]
    Responder(String),

    #[error("Invalid dialog settings: {0}")]
    InvalidSettings(String),

    #[error("Cannot resume {step} without its collected data")]
    StaleStep { step: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type DialogResult<T> = Result<T, DialogError>;

impl Categorized for DialogError {
    fn category(&self) -> ErrorCategory {
        match self {
            Self::Internal(_) => ErrorCategory::Internal,
            Self::InvalidSettings(_) => ErrorCategory::Validation,
            Self::StaleStep { .. } => ErrorCategory::Reconstruction,
            _ => ErrorCategory::Collaborator,
        }
    }

    fn code(&self) -> ErrorCode {
        match self {
            Self::Store(_) | Self::Serialization(_) => ErrorCode::STORE_UNAVAILABLE,
            Self::Scheduling(_) => ErrorCode::SCHEDULING_UNAVAILABLE,
            Self::SlotTaken { .. } => ErrorCode::SLOT_TAKEN,
            Self::Responder(_) => ErrorCode::RESPONDER_FAILED,
            Self::InvalidSettings(_) => ErrorCode::INVALID_CONFIGURATION,
            Self::StaleStep { .. } => ErrorCode::STALE_STEP,
            Self::Internal(_) => ErrorCode::INTERNAL,
        }
    }
}
