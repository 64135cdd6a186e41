use std::path::PathBuf;

use crate::chat::ChatController;
use crate::config::{ChatConfig, GatewayConfig, MODEL_ID, resolve_api_key, resolve_api_url};
use crate::errors::CliError;
use crate::output::OutputMode;

#[derive(Debug, Clone)]
pub struct Runtime {
    pub output: OutputMode,
    pub config: ChatConfig,
    pub config_path: PathBuf,
    pub api_url_override: Option<String>,
}

impl Runtime {
    pub fn resolved_api_url(&self) -> Result<String, CliError> {
        resolve_api_url(&self.config, self.api_url_override.as_deref())
    }

    /// Built once per command at startup and read-only afterwards. The key
    /// comes from the environment and is never persisted.
    pub fn gateway_config(&self) -> Result<GatewayConfig, CliError> {
        Ok(GatewayConfig {
            api_url: self.resolved_api_url()?,
            api_key: resolve_api_key(),
            model: MODEL_ID,
        })
    }

    pub fn controller(&self) -> Result<ChatController, CliError> {
        ChatController::from_config(self.gateway_config()?)
    }
}
