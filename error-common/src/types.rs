use crate::codes::ErrorCode;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a failure is handled at the dialog boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Bad caller input. The current step re-prompts.
    Validation,
    /// A store, catalog, scheduling or responder call failed.
    /// The dialog apologises and returns to the main menu.
    Collaborator,
    /// Persisted markers no longer map to a usable step.
    Reconstruction,
    /// Nothing matched. Rendered as a normal reply.
    NoMatch,
    Internal,
}

impl ErrorCategory {
    /// Whether a failure in this category should discard in-progress dialog state.
    pub fn resets_dialog(&self) -> bool {
        matches!(self, Self::Collaborator | Self::Reconstruction | Self::Internal)
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validation => "validation",
            Self::Collaborator => "collaborator",
            Self::Reconstruction => "reconstruction",
            Self::NoMatch => "no_match",
            Self::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Implemented by every crate-level error enum.
pub trait Categorized: std::error::Error {
    fn category(&self) -> ErrorCategory;

    fn code(&self) -> ErrorCode;
}
