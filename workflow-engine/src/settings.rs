use crate::error::{DialogError, DialogResult};
use chrono::Duration;
use serde::{Deserialize, Serialize};

/// Dialog tuning shared by the engine and the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogSettings {
    /// A session idle for longer than this is never resumed.
    #[serde(default = "default_inactivity_timeout_secs")]
    pub inactivity_timeout_secs: u64,

    /// Inputs that return the caller to the main menu from any step.
    #[serde(default = "default_reset_tokens")]
    pub reset_tokens: Vec<String>,

    /// How many system turns to inspect when a session has no stored step.
    #[serde(default = "default_legacy_scan_depth")]
    pub legacy_scan_depth: usize,

    /// Maximum prior content turns forwarded to the free-text responder.
    #[serde(default = "default_free_qa_history_limit")]
    pub free_qa_history_limit: usize,

    /// Append the "type 0" footer to replies outside the menu.
    #[serde(default = "default_reset_hint")]
    pub reset_hint: bool,
}

/// One week.
pub const MAX_INACTIVITY_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;

fn default_inactivity_timeout_secs() -> u64 {
    600
}

fn default_reset_tokens() -> Vec<String> {
    vec!["0".to_string()]
}

fn default_legacy_scan_depth() -> usize {
    5
}

fn default_free_qa_history_limit() -> usize {
    20
}

fn default_reset_hint() -> bool {
    true
}

impl Default for DialogSettings {
    fn default() -> Self {
        Self {
            inactivity_timeout_secs: default_inactivity_timeout_secs(),
            reset_tokens: default_reset_tokens(),
            legacy_scan_depth: default_legacy_scan_depth(),
            free_qa_history_limit: default_free_qa_history_limit(),
            reset_hint: default_reset_hint(),
        }
    }
}

impl DialogSettings {
    pub fn inactivity_timeout(&self) -> Duration {
        i64::try_from(self.inactivity_timeout_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX)
    }

    /// Trimmed, case-insensitive comparison against the reset tokens.
    pub fn is_reset(&self, input: &str) -> bool {
        let input = input.trim();
        self.reset_tokens
            .iter()
            .any(|token| token.trim().eq_ignore_ascii_case(input))
    }

    pub fn validate(&self) -> DialogResult<()> {
        if self.inactivity_timeout_secs == 0
            || self.inactivity_timeout_secs > MAX_INACTIVITY_TIMEOUT_SECS
        {
            return Err(DialogError::InvalidSettings(format!(
                "inactivity_timeout_secs must be between 1 and {MAX_INACTIVITY_TIMEOUT_SECS}"
            )));
        }
        if self.reset_tokens.is_empty() {
            return Err(DialogError::InvalidSettings(
                "at least one reset token is required".to_string(),
            ));
        }
        if self.reset_tokens.iter().any(|t| t.trim().is_empty()) {
            return Err(DialogError::InvalidSettings(
                "reset tokens must not be blank".to_string(),
            ));
        }
        if self.legacy_scan_depth == 0 {
            return Err(DialogError::InvalidSettings(
                "legacy_scan_depth must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
