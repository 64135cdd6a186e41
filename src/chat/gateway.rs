use async_trait::async_trait;

use crate::errors::GenerationError;

/// Sends one prompt to a text-generation service and waits for the whole reply.
#[async_trait]
pub trait Generator: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}
