//! Clinic assistant orchestrator
//!
//! Ties the dialog engine, the transcript store and the prior-authorization
//! lookup together behind [`ClinicAssistant::handle_turn`]:
//!
//! ```text
//! inbound text ─▶ session lookup / inactivity check ─▶ step resolution
//!              ─▶ DialogEngine or AuthorizationService ─▶ transcript save ─▶ reply
//! ```
//!
//! [`build_assistant`] wires everything from an [`config_engine::AssistantConfig`],
//! either in memory from JSON fixtures or against PostgreSQL.

#![cfg_attr(
    test,
    allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)
)]

pub mod bootstrap;
pub mod chat_completion;
pub mod error;
pub mod orchestrator;

pub use bootstrap::build_assistant;
pub use chat_completion::*;
pub use error::*;
pub use orchestrator::*;
