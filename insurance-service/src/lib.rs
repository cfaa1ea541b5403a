//! Prior-authorization lookup for the clinic assistant
//!
//! Provides:
//! - Document-to-text extraction (embedded text with an OCR fallback)
//! - Procedure identification through the fuzzy procedure matcher
//! - Interpretation of the catalog's audit lead time
//! - Caller-facing rendering of the outcome

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod authorization;
pub mod document;
pub mod error;
pub mod models;

pub use authorization::*;
pub use document::*;
pub use error::*;
pub use models::*;
