// File-based tracing. The chat screen owns the terminal, so logs never go to stderr.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::config::{ChatConfig, config_dir};
use crate::errors::CliError;

pub const LOG_ENV: &str = "GEMCHAT_LOG";
pub const LOG_FILE: &str = "gemchat.log";

/// `GEMCHAT_LOG` wins, then `--debug`, then the stored filter.
pub fn filter_directive(config: &ChatConfig, debug: bool) -> String {
    if let Some(value) = std::env::var(LOG_ENV).ok().filter(|v| !v.trim().is_empty()) {
        return value;
    }
    if debug {
        return "gemchat=debug".to_string();
    }
    config.log_filter.clone()
}

pub fn init(config: &ChatConfig, debug: bool) -> Result<PathBuf, CliError> {
    let path = config_dir()?.join(LOG_FILE);
    init_at(&path, &filter_directive(config, debug))?;
    Ok(path)
}

fn init_at(path: &Path, directive: &str) -> Result<(), CliError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let filter = EnvFilter::try_new(directive)
        .map_err(|e| CliError::Config(format!("Invalid log filter '{directive}': {e}")))?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| CliError::Generic(format!("Failed to start logging: {e}")))
}
