//! Fuzzy procedure matching for prior-authorization lookups
//!
//! Maps noisy lines of text (usually extracted from a scanned referral) to
//! the single best entry of a procedure catalog.
//!
//! # Scoring
//!
//! For every fragment, catalog record and descriptive field:
//!
//! - **Procedure name / terminology label**: `max(similarity, weight * relevance)`
//! - **Subgroup / group / chapter**: `similarity` only
//!
//! `similarity` is the trigram overlap of the case-folded, accent-stripped
//! texts. `relevance` is a ranked full-text score supplied by the catalog.
//! A field is only considered when its similarity reaches the threshold or
//! the fragment is a full-text match for the record; everything else is
//! dropped instead of being scored at zero. The winner is the best
//! (record, field, fragment) triple over all fragments.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use procedure_matcher::{CatalogRecord, InMemoryProcedureCatalog, MatcherConfig, ProcedureMatcher};
//!
//! # tokio_test::block_on(async {
//! let catalog = InMemoryProcedureCatalog::new(
//!     vec![CatalogRecord::new("40808130").with_procedure_name("Ressonância Magnética do Joelho")],
//!     Default::default(),
//! );
//! let matcher = ProcedureMatcher::new(Arc::new(catalog), MatcherConfig::default());
//!
//! let result = matcher.best_match(&["ressonancia do joelho"]).await.unwrap();
//! assert_eq!(result.unwrap().matched_text, "Ressonância Magnética do Joelho");
//! # });
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod catalog;
pub mod config;
pub mod error;
pub mod matcher;
pub mod normalize;
pub mod relevance;
pub mod trigram;

pub use catalog::*;
pub use config::*;
pub use error::*;
pub use matcher::*;
pub use normalize::normalize;
pub use relevance::{TextRelevance, Tier, TierWeights, WeightedDocument};
pub use trigram::{similarity, TrigramSet};
