// Section validation, run after every load.
use crate::error::{ConfigError, ConfigResult};
use crate::settings::{
    AssistantConfig, ResponderKind, ResponderSettings, StorageKind, StorageSettings,
};
use workflow_engine::SlotWindow;

pub trait Validate {
    fn validate(&self) -> ConfigResult<()>;
}

impl Validate for AssistantConfig {
    fn validate(&self) -> ConfigResult<()> {
        self.session
            .validate()
            .map_err(|e| ConfigError::Validation(format!("session: {e}")))?;
        self.matcher
            .validate()
            .map_err(|e| ConfigError::Validation(format!("matcher: {e}")))?;
        self.booking.validate()?;
        self.responder.validate()?;
        self.storage.validate()
    }
}

impl Validate for SlotWindow {
    fn validate(&self) -> ConfigResult<()> {
        if self.days_ahead == 0 || self.max_slots == 0 {
            return Err(ConfigError::Validation(
                "booking: days_ahead and max_slots must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

impl Validate for ResponderSettings {
    fn validate(&self) -> ConfigResult<()> {
        if self.kind == ResponderKind::ChatCompletion {
            if self.endpoint.trim().is_empty() || self.model.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "responder: chat_completion needs an endpoint and a model".to_string(),
                ));
            }
            if self.timeout_secs == 0 {
                return Err(ConfigError::Validation(
                    "responder: timeout_secs must be positive".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl Validate for StorageSettings {
    fn validate(&self) -> ConfigResult<()> {
        match self.kind {
            StorageKind::Postgres => {
                if self.database_url.as_deref().map_or(true, |u| u.trim().is_empty()) {
                    return Err(ConfigError::Validation(
                        "storage: postgres needs a database_url".to_string(),
                    ));
                }
                if self.max_connections == 0 {
                    return Err(ConfigError::Validation(
                        "storage: max_connections must be positive".to_string(),
                    ));
                }
                Ok(())
            }
            StorageKind::Memory => Ok(()),
        }
    }
}
