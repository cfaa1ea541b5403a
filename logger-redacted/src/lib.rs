//! Logging with automatic redaction of patient contact data
//!
//! Callers type names, phone numbers and document numbers straight into the
//! chat. Anything derived from caller text goes through [`PiiRedactor`] before
//! it reaches a log line.
//!
//! # Detected Data Types
//!
//! - **Phone Numbers**: `(11) 98765-4321`, `+55 11 98765 4321` → `PHONE[hash]`
//! - **CPF**: `123.456.789-09` → `CPF[hash]`
//! - **Email Addresses**: `maria@example.com` → `EMAIL[hash]`
//!
//! Hashes are the first bytes of a SHA-256 digest so the same value can be
//! correlated across log lines without being readable.
//!
//! # Example
//!
//! ```rust
//! use logger_redacted::{init_tracing, redacted_info, LoggerConfig};
//!
//! let _ = init_tracing(&LoggerConfig::default());
//! redacted_info!("caller sent {}", "Maria, (11) 98765-4321");
//! ```

#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used))]

pub mod config;
pub mod macros;
pub mod redactor;

pub use config::*;
pub use redactor::*;

#[doc(hidden)]
pub use tracing as __tracing;

use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static REDACTION_ENABLED: AtomicBool = AtomicBool::new(true);

#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("Invalid log filter '{0}'")]
    InvalidFilter(String),

    #[error("Tracing subscriber already installed: {0}")]
    AlreadyInitialized(String),
}

/// Install the global tracing subscriber.
///
/// `RUST_LOG` wins over `config.log_level` when it is set.
pub fn init_tracing(config: &LoggerConfig) -> Result<(), LoggerError> {
    REDACTION_ENABLED.store(config.redaction_enabled, Ordering::Relaxed);

    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.log_level)
            .map_err(|_| LoggerError::InvalidFilter(config.log_level.clone()))?,
    };

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if config.json {
        registry
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_timer(fmt::time::ChronoUtc::rfc_3339())
                    .with_ansi(false)
                    .json(),
            )
            .try_init()
    } else {
        registry
            .with(fmt::layer().with_target(true).with_level(true))
            .try_init()
    };

    result.map_err(|e| LoggerError::AlreadyInitialized(e.to_string()))
}

/// Redact a message with the process-wide redactor, unless redaction was
/// switched off through [`LoggerConfig::redaction_enabled`].
pub fn redact_message(message: &str) -> String {
    if REDACTION_ENABLED.load(Ordering::Relaxed) {
        global_redactor().redact(message)
    } else {
        message.to_string()
    }
}
