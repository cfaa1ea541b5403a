//! Configuration loading for the clinic assistant
//!
//! Layers, lowest precedence first:
//! - Serde defaults on every section
//! - An optional YAML, TOML or JSON file
//! - `CLINIC_*` environment variables, with `__` between nested keys
//!   (`CLINIC_SESSION__INACTIVITY_TIMEOUT_SECS=300`) and `,` between list
//!   items (`CLINIC_SESSION__RESET_TOKENS=0,menu`)
//!
//! The loaded configuration is validated before it is returned.
//!
//! # Example
//!
//! ```rust
//! use config_engine::ConfigEngine;
//! use std::collections::HashMap;
//!
//! let config = ConfigEngine::new()
//!     .with_env_source(HashMap::from([(
//!         "CLINIC_BOOKING__MAX_SLOTS".to_string(),
//!         "5".to_string(),
//!     )]))
//!     .load()
//!     .unwrap();
//! assert_eq!(config.booking.max_slots, 5);
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod engine;
pub mod error;
pub mod settings;
pub mod validation;

pub use engine::*;
pub use error::*;
pub use settings::*;
pub use validation::Validate;
