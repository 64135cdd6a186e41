use std::time::Instant;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tracing::{debug, info};

use crate::chat::gateway::Generator;
use crate::config::{API_KEY_ENV, GatewayConfig};
use crate::errors::{CliError, GenerationError, redact_secret};
use crate::parse::response::{
    extract_block_reason, extract_candidate_text, extract_error_message, extract_usage_line,
};

/// Client for the Gemini `generateContent` endpoint.
///
/// One attempt per call, no retry and no timeout beyond what the transport
/// imposes.
#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    base_url: String,
    api_key: Option<String>,
    model: &'static str,
}

impl GeminiClient {
    pub fn new(config: GatewayConfig) -> Result<Self, CliError> {
        let client = Client::builder()
            .build()
            .map_err(|e| CliError::Generic(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.api_url,
            api_key: config.api_key,
            model: config.model,
        })
    }

    pub fn endpoint(&self) -> String {
        join_url(
            &self.base_url,
            &format!("/v1beta/models/{}:generateContent", self.model),
        )
    }

    pub async fn generate_content(&self, prompt: &str) -> Result<String, GenerationError> {
        let Some(key) = self.api_key.as_deref() else {
            return Err(GenerationError::new(format!(
                "missing API key; set {API_KEY_ENV}"
            )));
        };

        let body = json!({
            "contents": [
                { "role": "user", "parts": [{ "text": prompt }] }
            ]
        });

        let started = Instant::now();
        info!(model = self.model, key = %redact_secret(key), "generateContent request");
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        let parsed = if text.trim().is_empty() {
            json!({})
        } else {
            serde_json::from_str::<Value>(&text).unwrap_or_else(|_| json!({ "raw": text }))
        };
        debug!(
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            usage = %extract_usage_line(&parsed),
            "generateContent response"
        );

        if !status.is_success() {
            return Err(http_error(status, &parsed));
        }
        if let Some(reason) = extract_block_reason(&parsed) {
            return Err(GenerationError::new(reason));
        }
        extract_candidate_text(&parsed)
            .ok_or_else(|| GenerationError::new("response carried no candidate text"))
    }
}

#[async_trait]
impl Generator for GeminiClient {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        self.generate_content(prompt).await
    }
}

fn http_error(status: StatusCode, payload: &Value) -> GenerationError {
    let message = extract_error_message(payload)
        .unwrap_or_else(|| format!("request failed with status {}", status.as_u16()));
    GenerationError::new(format!("status {}: {message}", status.as_u16()))
}

fn join_url(base_url: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base_url.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}
