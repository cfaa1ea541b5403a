use logger_redacted::LoggerConfig;
use procedure_matcher::MatcherConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use workflow_engine::{DialogSettings, SlotWindow};

/// Everything the assistant reads at startup.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantConfig {
    pub session: DialogSettings,
    pub matcher: MatcherConfig,
    pub booking: SlotWindow,
    pub logging: LoggerConfig,
    pub responder: ResponderSettings,
    pub storage: StorageSettings,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponderKind {
    /// Canned keyword answers.
    #[default]
    Faq,
    /// An OpenAI-compatible chat completion endpoint.
    ChatCompletion,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResponderSettings {
    pub kind: ResponderKind,
    /// Base URL; `/v1/chat/completions` is appended.
    pub endpoint: String,
    pub model: String,
    pub api_key: Option<String>,
    pub system_prompt: String,
    pub timeout_secs: u64,
}

impl Default for ResponderSettings {
    fn default() -> Self {
        Self {
            kind: ResponderKind::Faq,
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            api_key: None,
            system_prompt: "You are the virtual assistant of a medical clinic. Answer briefly and \
                            politely, only about the clinic's services, opening hours, units, \
                            health plans and exams. Never give medical advice."
                .to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageKind {
    #[default]
    Memory,
    Postgres,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub kind: StorageKind,
    pub database_url: Option<String>,
    pub max_connections: u32,
    pub run_migrations: bool,
    /// JSON catalog loaded by the in-memory procedure catalog.
    pub catalog_fixture: Option<PathBuf>,
    /// JSON providers and slots loaded by the in-memory scheduling directory.
    pub schedule_fixture: Option<PathBuf>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            kind: StorageKind::Memory,
            database_url: None,
            max_connections: 5,
            run_migrations: true,
            catalog_fixture: None,
            schedule_fixture: None,
        }
    }
}
