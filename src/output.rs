use serde::Serialize;

use crate::errors::CliError;

/// How command results reach the terminal. The chat screen ignores this;
/// it only applies to one-shot commands and errors.
#[derive(Debug, Clone, Default)]
pub struct OutputMode {
    pub json: bool,
    pub quiet: bool,
    pub verbose: bool,
    pub debug: bool,
}

impl OutputMode {
    pub fn print_json<T: Serialize>(&self, value: &T) -> Result<(), CliError> {
        let text = serde_json::to_string_pretty(value)?;
        println!("{text}");
        Ok(())
    }

    pub fn print_human(&self, message: &str) {
        if self.json || self.quiet {
            return;
        }
        println!("{message}");
    }

    /// Printed even with `--quiet`; used for the reply itself.
    pub fn print_result(&self, message: &str) {
        if self.json {
            return;
        }
        println!("{message}");
    }

    pub fn print_verbose(&self, message: &str) {
        if !(self.verbose || self.debug) || self.json || self.quiet {
            return;
        }
        eprintln!("{message}");
    }
}

/// JSON body for a failed command. `None` when the command already wrote its
/// own document, so stdout carries exactly one.
pub fn error_payload(error: &CliError) -> Option<serde_json::Value> {
    if matches!(error, CliError::Generation(_)) {
        return None;
    }
    Some(serde_json::json!({
        "ok": false,
        "error": error.to_string(),
        "code": error.exit_code()
    }))
}

pub fn print_error(error: &CliError, mode: &OutputMode) {
    if mode.json {
        if let Some(payload) = error_payload(error) {
            println!(
                "{}",
                serde_json::to_string(&payload).unwrap_or_else(|_| "{\"ok\":false}".to_string())
            );
        }
        return;
    }

    eprintln!("gemchat: {error}");
}
