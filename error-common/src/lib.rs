//! Common error handling utilities for the clinic assistant
//!
//! Every crate in the workspace keeps its own `thiserror` enum. This crate
//! holds the pieces they share so that failures are classified and logged
//! the same way no matter where they surface.
//!
//! # Error Categories
//!
//! - **Validation**: malformed caller input, recovered by re-prompting
//! - **Collaborator**: store, catalog, scheduling or responder failures
//! - **Reconstruction**: transcript markers that no longer describe a valid step
//! - **NoMatch**: the matcher found nothing, which is a result and not a fault
//! - **Internal**: anything else
//!
//! # Example
//!
//! ```rust
//! use error_common::{report_error, Categorized, ErrorCategory, ErrorCode, ErrorContext};
//!
//! #[derive(Debug, thiserror::Error)]
//! #[error("slot already booked")]
//! struct SlotTaken;
//!
//! impl Categorized for SlotTaken {
//!     fn category(&self) -> ErrorCategory {
//!         ErrorCategory::Collaborator
//!     }
//!
//!     fn code(&self) -> ErrorCode {
//!         ErrorCode::SLOT_TAKEN
//!     }
//! }
//!
//! let context = ErrorContext::new("commit_booking").with_step("wizard.confirm");
//! report_error(&context, &SlotTaken);
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod codes;
pub mod context;
pub mod reporting;
pub mod types;

pub use codes::*;
pub use context::*;
pub use reporting::*;
pub use types::*;
