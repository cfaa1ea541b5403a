// Logger configuration
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggerConfig {
    pub redaction_enabled: bool,
    /// Emit JSON lines instead of human readable output.
    pub json: bool,
    /// `EnvFilter` directive used when `RUST_LOG` is not set.
    pub log_level: String,
}

impl Default for LoggerConfig {
    fn default() -> Self {
        Self {
            redaction_enabled: true,
            json: false,
            log_level: "info".to_string(),
        }
    }
}
