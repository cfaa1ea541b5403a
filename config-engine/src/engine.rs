use crate::error::ConfigResult;
use crate::settings::AssistantConfig;
use crate::validation::Validate;
use config::{Config, Environment, File};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const DEFAULT_ENV_PREFIX: &str = "CLINIC";

/// Builds an [`AssistantConfig`] from defaults, an optional file and the
/// environment, in that order of precedence (environment wins).
#[derive(Debug, Clone)]
pub struct ConfigEngine {
    file: Option<PathBuf>,
    env_prefix: String,
    env_source: Option<HashMap<String, String>>,
}

impl ConfigEngine {
    pub fn new() -> Self {
        Self {
            file: None,
            env_prefix: DEFAULT_ENV_PREFIX.to_string(),
            env_source: None,
        }
    }

    /// A YAML, TOML or JSON file, picked by extension. The file must exist.
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        self.file = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Read variables from `vars` instead of the process environment.
    pub fn with_env_source(mut self, vars: HashMap<String, String>) -> Self {
        self.env_source = Some(vars);
        self
    }

    pub fn load(&self) -> ConfigResult<AssistantConfig> {
        let mut builder = Config::builder();
        if let Some(path) = &self.file {
            debug!(path = %path.display(), "Loading configuration file");
            builder = builder.add_source(File::from(path.as_path()).required(true));
        }

        let environment = Environment::with_prefix(&self.env_prefix)
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true)
            .list_separator(",")
            .with_list_parse_key("session.reset_tokens")
            .source(self.env_source.clone());
        builder = builder.add_source(environment);

        let config: AssistantConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        info!(
            storage = ?config.storage.kind,
            responder = ?config.responder.kind,
            "Configuration loaded"
        );
        Ok(config)
    }
}

impl Default for ConfigEngine {
    fn default() -> Self {
        Self::new()
    }
}
