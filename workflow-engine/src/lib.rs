//! Conversation state machine for the clinic assistant
//!
//! This crate owns everything about a caller's position in the dialog:
//! - Sessions and turns, with the channel each turn was created on
//! - The tagged dialog and booking-wizard states
//! - Reading a step back from legacy transcripts
//! - The [`DialogEngine`] that applies one caller input to a state
//! - Collaborator traits for transcripts, scheduling and free-text answers,
//!   each with an in-memory implementation
//!
//! # Dialog Tree
//!
//! ```text
//! Menu ──1──▶ FreeQa
//!      ──2──▶ Wizard: Specialty ▶ Provider ▶ Slot ▶ PatientData ▶ Confirm ──▶ Menu
//!      ──3──▶ Authorization
//! any ──reset token──▶ Menu
//! ```
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use workflow_engine::{
//!     DialogEngine, DialogSettings, DialogState, InMemorySchedulingDirectory,
//!     KeywordFaqResponder, SlotWindow,
//! };
//!
//! # tokio_test::block_on(async {
//! let engine = DialogEngine::new(
//!     Arc::new(InMemorySchedulingDirectory::new(vec![], vec![], SlotWindow::default())),
//!     Arc::new(KeywordFaqResponder::with_default_entries()),
//!     DialogSettings::default(),
//! );
//!
//! let transition = engine.advance(&DialogState::Menu, "1", &[]).await;
//! assert_eq!(transition.next, DialogState::FreeQa);
//! # });
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing))]

pub mod engine;
pub mod error;
pub mod prompts;
pub mod reconstruct;
pub mod responder;
pub mod scheduling;
pub mod session;
pub mod settings;
pub mod state;
pub mod store;

pub use engine::*;
pub use error::*;
pub use reconstruct::*;
pub use responder::*;
pub use scheduling::*;
pub use session::*;
pub use settings::*;
pub use state::*;
pub use store::*;
