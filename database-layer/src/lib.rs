//! PostgreSQL persistence for the clinic assistant
//!
//! Implements the collaborator traits of the dialog and matching crates
//! against one database:
//! - [`PostgresTranscriptStore`]: sessions, turns and the persisted dialog step
//! - [`PostgresProcedureCatalog`]: catalog records plus weighted full-text ranking
//! - [`PostgresSchedulingDirectory`]: providers, slots and transactional booking
//!
//! The schema lives in `migrations/` and is applied with
//! [`DatabasePool::run_migrations`].

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod catalog_repository;
pub mod connection;
pub mod error;
pub mod scheduling_repository;
pub mod transcript_repository;

pub use catalog_repository::PostgresProcedureCatalog;
pub use connection::DatabasePool;
pub use error::*;
pub use scheduling_repository::PostgresSchedulingDirectory;
pub use transcript_repository::PostgresTranscriptStore;
