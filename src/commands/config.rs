use clap::{Subcommand, ValueEnum};
use serde_json::json;
use tracing_subscriber::EnvFilter;

use crate::app::Runtime;
use crate::config::{API_KEY_ENV, ChatConfig, MODEL_ID, resolve_api_key, save_config_to, validate_url};
use crate::errors::{CliError, redact_secret};

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,
    /// Print the config file location
    Path,
    /// Set a config key and save the file
    Set { key: ConfigKey, value: String },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ConfigKey {
    #[value(name = "apiUrl")]
    ApiUrl,
    #[value(name = "logFilter")]
    LogFilter,
}

pub async fn handle(runtime: &mut Runtime, command: ConfigCommand) -> Result<(), CliError> {
    match command {
        ConfigCommand::Show => show(runtime),
        ConfigCommand::Path => path(runtime),
        ConfigCommand::Set { key, value } => set(runtime, key, value),
    }
}

fn show(runtime: &Runtime) -> Result<(), CliError> {
    let api_url = runtime
        .resolved_api_url()
        .unwrap_or_else(|_| runtime.config.api_url.clone());
    let key = resolve_api_key().map(|k| redact_secret(&k));

    if runtime.output.json {
        runtime.output.print_json(&json!({
            "path": runtime.config_path,
            "apiUrl": api_url,
            "logFilter": runtime.config.log_filter,
            "model": MODEL_ID,
            "apiKey": key,
        }))?;
        return Ok(());
    }

    runtime
        .output
        .print_human(&format!("path:      {}", runtime.config_path.display()));
    runtime.output.print_human(&format!("apiUrl:    {api_url}"));
    runtime
        .output
        .print_human(&format!("logFilter: {}", runtime.config.log_filter));
    runtime.output.print_human(&format!("model:     {MODEL_ID}"));
    runtime.output.print_human(&format!(
        "apiKey:    {}",
        key.unwrap_or_else(|| format!("(not set; export {API_KEY_ENV})"))
    ));
    Ok(())
}

fn path(runtime: &Runtime) -> Result<(), CliError> {
    if runtime.output.json {
        runtime
            .output
            .print_json(&json!({ "path": runtime.config_path }))?;
    } else {
        runtime
            .output
            .print_result(&runtime.config_path.display().to_string());
    }
    Ok(())
}

fn set(runtime: &mut Runtime, key: ConfigKey, value: String) -> Result<(), CliError> {
    apply(&mut runtime.config, key, value)?;
    save_config_to(&runtime.config, &runtime.config_path)?;

    if runtime.output.json {
        runtime.output.print_json(&json!({ "ok": true }))?;
    } else {
        runtime.output.print_human("Config updated.");
    }
    Ok(())
}

fn apply(config: &mut ChatConfig, key: ConfigKey, value: String) -> Result<(), CliError> {
    let value = value.trim().to_string();
    match key {
        ConfigKey::ApiUrl => {
            validate_url(&value)?;
            config.api_url = value;
        }
        ConfigKey::LogFilter => {
            EnvFilter::try_new(&value)
                .map_err(|e| CliError::Usage(format!("Invalid log filter '{value}': {e}")))?;
            config.log_filter = value;
        }
    }
    Ok(())
}
