use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::errors::CliError;

pub const DEFAULT_API_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_LOG_FILTER: &str = "warn";
pub const MODEL_ID: &str = "gemini-1.5-flash";
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatConfig {
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            log_filter: default_log_filter(),
        }
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}

/// Everything the model gateway needs. Built once at startup and never
/// changed afterwards.
#[derive(Clone)]
pub struct GatewayConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: &'static str,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .finish()
    }
}

pub fn config_dir() -> Result<PathBuf, CliError> {
    let base = dirs::config_dir().ok_or_else(|| {
        CliError::Config("Could not resolve config directory for this OS.".to_string())
    })?;
    Ok(base.join("gemchat"))
}

pub fn config_path() -> Result<PathBuf, CliError> {
    Ok(config_dir()?.join("config.json"))
}

pub fn load_config() -> Result<ChatConfig, CliError> {
    load_config_from(&config_path()?)
}

pub fn load_config_from(path: &Path) -> Result<ChatConfig, CliError> {
    if !path.exists() {
        return Ok(ChatConfig::default());
    }

    let text = fs::read_to_string(path)?;
    let config: ChatConfig = serde_json::from_str(&text)?;
    Ok(config)
}

pub fn save_config_to(config: &ChatConfig, path: &Path) -> Result<(), CliError> {
    let parent = path
        .parent()
        .ok_or_else(|| CliError::Config("Invalid config path.".to_string()))?;
    fs::create_dir_all(parent)?;
    fs::write(path, serde_json::to_string_pretty(config)?)?;
    Ok(())
}

pub fn resolve_api_url(config: &ChatConfig, api_override: Option<&str>) -> Result<String, CliError> {
    if let Some(url) = api_override {
        validate_url(url)?;
        return Ok(url.to_string());
    }
    validate_url(&config.api_url)?;
    Ok(config.api_url.clone())
}

pub fn resolve_api_key() -> Option<String> {
    let value = std::env::var(API_KEY_ENV).ok()?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.to_string())
}

pub fn validate_url(value: &str) -> Result<(), CliError> {
    let parsed = Url::parse(value)?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(CliError::Usage(
            "API URL must use http:// or https://.".to_string(),
        ));
    }
    Ok(())
}
