use thiserror::Error;

#[derive(Debug, Clone, Copy)]
pub enum ExitCode {
    Generic = 1,
    Usage = 2,
    Config = 3,
    Terminal = 4,
}

#[derive(Debug, Error)]
pub enum CliError {
    #[error("{0}")]
    Usage(String),
    #[error("{0}")]
    Config(String),
    #[error("{0}")]
    Terminal(String),
    #[error("{0}")]
    Generic(String),
    /// The exchange ended in an error bubble. Its text has already been
    /// reported through the command's own output.
    #[error("{0}")]
    Generation(String),
}

impl CliError {
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => ExitCode::Usage as i32,
            CliError::Config(_) => ExitCode::Config as i32,
            CliError::Terminal(_) => ExitCode::Terminal as i32,
            CliError::Generic(_) | CliError::Generation(_) => ExitCode::Generic as i32,
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        CliError::Generic(format!("I/O error: {value}"))
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        CliError::Config(format!("JSON error: {value}"))
    }
}

impl From<url::ParseError> for CliError {
    fn from(value: url::ParseError) -> Self {
        CliError::Usage(format!("Invalid URL: {value}"))
    }
}

/// The one failure a generation request can end in.
///
/// Transport, authentication, quota and decoding problems all collapse into
/// this type. The detail is kept for the log file only; callers must not
/// branch on it.
#[derive(Debug, Clone, Error)]
#[error("generation failed: {detail}")]
pub struct GenerationError {
    detail: String,
}

impl GenerationError {
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
        }
    }

    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl From<reqwest::Error> for GenerationError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            return GenerationError::new("request timed out");
        }
        GenerationError::new(format!("network request failed: {value}"))
    }
}

pub fn redact_secret(input: &str) -> String {
    if input.is_empty() {
        return String::new();
    }
    let chars: Vec<char> = input.chars().collect();
    let mut out = String::new();
    for (idx, ch) in chars.iter().enumerate() {
        if idx < 3 || idx + 3 >= chars.len() {
            out.push(*ch);
        } else {
            out.push('*');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::{CliError, GenerationError, redact_secret};

    #[test]
    fn redact_keeps_edges_only() {
        assert_eq!(redact_secret("AIzaSyExample"), "AIz*******ple");
        assert_eq!(redact_secret("abc"), "abc");
        assert_eq!(redact_secret(""), "");
    }

    #[test]
    fn exit_codes_are_distinct() {
        let codes = [
            CliError::Generic(String::new()).exit_code(),
            CliError::Usage(String::new()).exit_code(),
            CliError::Config(String::new()).exit_code(),
            CliError::Terminal(String::new()).exit_code(),
        ];
        for (i, a) in codes.iter().enumerate() {
            for b in &codes[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn generation_error_keeps_detail_for_logs() {
        let err = GenerationError::new("status 403");
        assert_eq!(err.detail(), "status 403");
        assert_eq!(err.to_string(), "generation failed: status 403");
    }
}
